//! Human-readable timeline endpoint

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde_json::Value;

use super::params::{bind, human_readable_params, HumanReadableQuery};
use crate::error::ApiResult;
use crate::{service, AppState};

/// GET /v1/human-readable?offset=0&limit=10
///
/// Evaluation bulletins (shown as 551/552) merged with crowd report
/// clusters (5610), newest first.
pub async fn human_readable(
    State(state): State<AppState>,
    query: Result<Query<HumanReadableQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Value>>> {
    let params = human_readable_params(bind(query)?)?;
    Ok(Json(service::human_readable(&state.store, &params).await?))
}

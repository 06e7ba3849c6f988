//! Generic record history

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use super::params::{bind, history_params, HistoryQuery, QueryPairs};
use crate::error::ApiResult;
use crate::{service, AppState};

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: u64,
}

/// GET /v2/history?codes[]=551&exclude_evaluation=true
pub async fn search_history(
    State(state): State<AppState>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> ApiResult<Json<Vec<Value>>> {
    let params = history_params(bind(query)?, &QueryPairs::new(pairs))?;
    Ok(Json(service::search_history(&state.store, &params).await?))
}

/// GET /v2/history/count
///
/// Same filters as `/v2/history`; paging parameters are validated but ignored.
pub async fn count_history(
    State(state): State<AppState>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> ApiResult<Json<CountResponse>> {
    let params = history_params(bind(query)?, &QueryPairs::new(pairs))?;
    let count = service::count_history(&state.store, &params).await?;
    Ok(Json(CountResponse { count }))
}

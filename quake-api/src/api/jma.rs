//! Bulletin endpoints
//!
//! `GET /v2/jma/quake`, `GET /v2/jma/quake/:id`, `GET /v2/jma/tsunami` and
//! `GET /v2/jma/tsunami/:id`.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use serde_json::Value;

use super::params::{bind, quake_params, tsunami_params, QuakeQuery, QueryPairs, TsunamiQuery};
use crate::error::ApiResult;
use crate::{service, AppState};

/// GET /v2/jma/quake
///
/// Earthquake bulletins filtered by date, type, magnitude, scale and
/// per-prefecture observed scale.
pub async fn search_quake(
    State(state): State<AppState>,
    query: Result<Query<QuakeQuery>, QueryRejection>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> ApiResult<Json<Vec<Value>>> {
    let params = quake_params(bind(query)?, &QueryPairs::new(pairs))?;
    Ok(Json(service::search_quake(&state.store, &params).await?))
}

/// GET /v2/jma/quake/:id
pub async fn get_quake(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    Ok(Json(service::get_quake(&state.store, &id).await?))
}

/// GET /v2/jma/tsunami
pub async fn search_tsunami(
    State(state): State<AppState>,
    query: Result<Query<TsunamiQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Value>>> {
    let params = tsunami_params(bind(query)?)?;
    Ok(Json(service::search_tsunami(&state.store, &params).await?))
}

/// GET /v2/jma/tsunami/:id
pub async fn get_tsunami(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    Ok(Json(service::get_tsunami(&state.store, &id).await?))
}

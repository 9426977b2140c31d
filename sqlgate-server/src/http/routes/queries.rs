//! Query endpoints: ad-hoc execution and replay by saved handle.
//!
//! Query text is never parsed or restricted here; arbitrary SQL including
//! DDL/DML goes straight to the driver. Injection protection is the
//! caller's responsibility.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::{
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use sqlgate_core::{Handle, RecordSet};

use crate::http::error::ApiError;
use crate::http::server::AppState;

fn default_save() -> bool {
    true
}

/// Execute query request
#[derive(Deserialize)]
pub struct ExecuteQueryRequest {
    /// Connection key from POST /connections
    pub key: String,

    /// Query text, submitted to the driver verbatim
    pub query: String,

    /// Also save the (connection, query) pair for later replay
    #[serde(default = "default_save")]
    pub save: bool,
}

/// Execute query response
#[derive(Serialize)]
pub struct ExecuteQueryResponse {
    pub data: RecordSet,

    /// Replay key; present only when the pair was saved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qkey: Option<Handle>,
}

/// Replay response
#[derive(Serialize)]
pub struct ReplayResponse {
    pub data: RecordSet,
}

/// POST /queries - execute ad-hoc query text, optionally saving the pair.
///
/// Execution happens first: a failed query saves nothing.
async fn execute_query(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ExecuteQueryRequest>, JsonRejection>,
) -> Result<Json<ExecuteQueryResponse>, ApiError> {
    let Json(req) = payload?;
    let key = Handle::from(req.key);

    let data = state.gateway.execute(&key, &req.query).await?;

    let qkey = if req.save {
        Some(state.gateway.save_query(key, req.query).await?)
    } else {
        None
    };

    Ok(Json(ExecuteQueryResponse { data, qkey }))
}

/// GET /queries/{qkey} - replay a saved query by its key
async fn replay_query(
    State(state): State<Arc<AppState>>,
    Path(qkey): Path<String>,
) -> Result<Json<ReplayResponse>, ApiError> {
    let data = state.gateway.execute_saved(&Handle::from(qkey)).await?;
    Ok(Json(ReplayResponse { data }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/queries", post(execute_query))
        .route("/queries/{qkey}", get(replay_query))
}

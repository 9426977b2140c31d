//! Connection endpoints.
//!
//! Callers hand over a connection string and receive the opaque key every
//! later operation references. There is no close endpoint; registered
//! connections live until process shutdown.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::{routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use sqlgate_core::Handle;

use crate::http::error::ApiError;
use crate::http::server::AppState;

fn default_driver() -> String {
    "postgres".to_string()
}

/// Open connection request
#[derive(Deserialize)]
pub struct OpenConnectionRequest {
    /// Driver connection string, passed through untouched
    pub connection: String,

    /// Driver kind (default: postgres)
    #[serde(default = "default_driver")]
    pub driver: String,
}

/// Open connection response
#[derive(Serialize)]
pub struct OpenConnectionResponse {
    pub key: Handle,
}

/// POST /connections - open a connection, get back its key
async fn open_connection(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<OpenConnectionRequest>, JsonRejection>,
) -> Result<Json<OpenConnectionResponse>, ApiError> {
    let Json(req) = payload?;
    let key = state.gateway.open(&req.driver, &req.connection).await?;

    Ok(Json(OpenConnectionResponse { key }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/connections", post(open_connection))
}

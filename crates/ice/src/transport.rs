// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP surface of the credential service.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::credential::{IceResponse, Issuer};

/// Liveness body for `GET /health`.
pub const HEALTH_BODY: &str = "ice-api alive";

/// Shared state: the issuer is immutable after startup.
pub struct IceState {
    pub issuer: Issuer,
}

#[derive(Debug, Deserialize)]
pub struct IceQuery {
    #[serde(default)]
    pub u: Option<String>,
}

/// Build the axum `Router` for the credential service.
pub fn build_router(state: Arc<IceState>) -> Router {
    Router::new()
        .route("/ice", get(ice))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// `GET /ice?u=<identity>`: issue a relay credential.
pub async fn ice(State(s): State<Arc<IceState>>, Query(q): Query<IceQuery>) -> impl IntoResponse {
    let cred = s.issuer.issue(q.u.as_deref());
    tracing::debug!(username = %cred.username, ttl = cred.ttl, "issued relay credential");
    Json(IceResponse::from(cred))
}

/// `GET /health`
pub async fn health() -> &'static str {
    HEALTH_BODY
}

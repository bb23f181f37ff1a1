// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP transport for the signaling gateway.

pub mod http;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::SignalState;

/// Build the axum `Router` with all signaling routes.
///
/// Each object route is registered twice so that an empty key
/// (`/put/`) reaches the handler and is rejected as a bad key rather
/// than falling through to a 404. Verbs are checked by the method router
/// before any handler runs, so a wrong verb is a 405 with `Allow` even for
/// invalid keys.
pub fn build_router(state: Arc<SignalState>) -> Router {
    let body_limit = DefaultBodyLimit::max(state.max_body_bytes);
    Router::new()
        // Object operations
        .route("/put/", post(http::put_object).put(http::put_object))
        .route("/put/{*key}", post(http::put_object).put(http::put_object))
        .route("/get/", get(http::get_object))
        .route("/get/{*key}", get(http::get_object))
        .route("/delete/", delete(http::delete_object))
        .route("/delete/{*key}", delete(http::delete_object))
        .route("/touch/", post(http::touch_object).put(http::touch_object))
        .route("/touch/{*key}", post(http::touch_object).put(http::touch_object))
        // Directory
        .route("/agents", get(http::agents))
        .route("/list", get(http::list))
        // Health
        .route("/health", get(http::health))
        // Middleware
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

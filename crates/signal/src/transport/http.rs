// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP handlers for the signaling gateway.

use std::sync::Arc;
use std::time::SystemTime;

use axum::extract::path::ErrorKind;
use axum::extract::rejection::PathRejection;
use axum::extract::{FromRequestParts, Path, Query, State};
use axum::http::request::Parts;
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::error::SignalError;
use crate::gateway::GatewayError;
use crate::presence::resolve_max_age;
use crate::state::SignalState;

/// Liveness body for `GET /health`.
pub const HEALTH_BODY: &str = "signal-gw alive";

// -- Extractors ---------------------------------------------------------------

/// Object key from the wildcard path segment; empty when the route has none.
///
/// Key rules are enforced by the gateway. A key that cannot be decoded
/// (invalid UTF-8 after percent-decoding) is rejected here.
#[derive(Debug, Clone)]
pub struct ObjectKey(pub String);

impl<S> FromRequestParts<S> for ObjectKey
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<String>::from_request_parts(parts, state).await {
            Ok(Path(key)) => Ok(Self(key)),
            Err(PathRejection::MissingPathParams(_)) => Ok(Self(String::new())),
            Err(PathRejection::FailedToDeserializePathParams(e))
                if matches!(e.kind(), ErrorKind::WrongNumberOfParameters { got: 0, .. }) =>
            {
                Ok(Self(String::new()))
            }
            Err(rejection) => {
                let message = format!("undecodable key: {}", rejection.body_text());
                tracing::debug!(path = %parts.uri.path(), "{message}");
                Err(SignalError::BadRequest.to_http_response(message).into_response())
            }
        }
    }
}

/// First value of query parameter `name`; later repeats are ignored.
pub fn first_param<'a>(params: &'a [(String, String)], name: &str) -> Option<&'a str> {
    params.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
}

// -- Handlers -----------------------------------------------------------------

/// `POST|PUT /put/{key}`: store the request body at `key`.
pub async fn put_object(
    State(s): State<Arc<SignalState>>,
    ObjectKey(key): ObjectKey,
    body: Bytes,
) -> Response {
    let len = body.len();
    match s.gateway.put(&key, body).await {
        Ok(()) => {
            tracing::debug!(key = %key, bytes = len, "object stored");
            "OK".into_response()
        }
        Err(e) => error_response(&key, e),
    }
}

/// `GET /get/{key}`: return the raw payload at `key`.
pub async fn get_object(State(s): State<Arc<SignalState>>, ObjectKey(key): ObjectKey) -> Response {
    match s.gateway.get(&key).await {
        Ok(obj) => {
            let mut resp = obj.payload.into_response();
            let headers = resp.headers_mut();
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            );
            headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
            if let Ok(v) = HeaderValue::from_str(&http_date(obj.last_modified)) {
                headers.insert(header::LAST_MODIFIED, v);
            }
            resp
        }
        Err(e) => error_response(&key, e),
    }
}

/// `DELETE /delete/{key}`
pub async fn delete_object(
    State(s): State<Arc<SignalState>>,
    ObjectKey(key): ObjectKey,
) -> Response {
    match s.gateway.delete(&key).await {
        Ok(()) => {
            tracing::debug!(key = %key, "object deleted");
            "DELETED".into_response()
        }
        Err(e) => error_response(&key, e),
    }
}

/// `POST|PUT /touch/{key}`: heartbeat write that refreshes `key`'s modification time.
pub async fn touch_object(
    State(s): State<Arc<SignalState>>,
    ObjectKey(key): ObjectKey,
) -> Response {
    match s.gateway.touch(&key).await {
        Ok(()) => {
            tracing::trace!(key = %key, "object touched");
            "TOUCHED".into_response()
        }
        Err(e) => error_response(&key, e),
    }
}

/// `GET /agents?maxAgeSec=<n>`: sorted ids of agents with a fresh marker.
///
/// Query pairs are read raw so a malformed or repeated `maxAgeSec` falls
/// back to the default instead of rejecting the request.
pub async fn agents(
    State(s): State<Arc<SignalState>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    let max_age = resolve_max_age(first_param(&params, "maxAgeSec"));
    match s.gateway.ready_agents(max_age, SystemTime::now()).await {
        Ok(ids) => Json(ids).into_response(),
        Err(e) => error_response("agents/", e),
    }
}

/// `GET /list?prefix=<p>`: every key under `prefix`, in store order.
pub async fn list(
    State(s): State<Arc<SignalState>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    let prefix = first_param(&params, "prefix");
    match s.gateway.list(prefix).await {
        Ok(keys) => Json(keys).into_response(),
        Err(e) => error_response(prefix.unwrap_or_default(), e),
    }
}

/// `GET /health`
pub async fn health() -> &'static str {
    HEALTH_BODY
}

// -- Helpers ------------------------------------------------------------------

/// Map a gateway failure to its HTTP response. Only store failures are
/// operator-relevant; client mistakes and misses are logged at debug.
fn error_response(key: &str, err: GatewayError) -> Response {
    let code = err.code();
    match &err {
        GatewayError::Store(e) => tracing::error!(key = %key, err = %e, "store operation failed"),
        _ => tracing::debug!(key = %key, err = %err, "request rejected"),
    }
    code.to_http_response(err.to_string()).into_response()
}

/// Format a timestamp as an RFC 7231 HTTP date.
fn http_date(t: SystemTime) -> String {
    DateTime::<Utc>::from(t).format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

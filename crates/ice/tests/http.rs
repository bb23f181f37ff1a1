// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Integration tests for the credential service HTTP API.
//!
//! Uses `axum_test::TestServer`: no real TCP needed.

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;

use relayice::credential::{epoch_secs, sign, IceResponse, Issuer};
use relayice::transport::{build_router, IceState, HEALTH_BODY};

const SECRET: &str = "relay-shared-secret";

fn test_server(ttl: u64) -> anyhow::Result<TestServer> {
    let state = Arc::new(IceState { issuer: Issuer::new(SECRET, "turn.example.org", ttl) });
    Ok(TestServer::new(build_router(state))?)
}

#[tokio::test]
async fn ice_returns_signed_credential() -> anyhow::Result<()> {
    let server = test_server(3600)?;
    let before = epoch_secs();

    let resp = server.get("/ice").add_query_param("u", "agent-42").await;
    resp.assert_status_ok();
    let body: IceResponse = resp.json();

    assert_eq!(body.ttl, 3600);
    assert_eq!(body.ice_servers.len(), 1);
    let entry = &body.ice_servers[0];
    assert_eq!(
        entry.urls,
        vec![
            "turn:turn.example.org:3478?transport=udp".to_owned(),
            "turn:turn.example.org:3478?transport=tcp".to_owned(),
        ]
    );

    let (expiry, identity) =
        entry.username.split_once(':').ok_or_else(|| anyhow::anyhow!("no separator"))?;
    let expiry: u64 = expiry.parse()?;
    assert_eq!(identity, "agent-42");
    assert!(expiry >= before + 3600 && expiry <= epoch_secs() + 3600);

    // The relay recomputes the digest from the username and shared secret.
    assert_eq!(entry.credential, sign(SECRET, &entry.username));
    Ok(())
}

#[tokio::test]
async fn ice_without_identity_uses_anon() -> anyhow::Result<()> {
    let server = test_server(600)?;
    let body: IceResponse = server.get("/ice").await.json();
    assert!(body.ice_servers[0].username.ends_with(":anon"));
    assert_eq!(body.ttl, 600);
    Ok(())
}

#[tokio::test]
async fn ice_response_uses_camel_case_keys() -> anyhow::Result<()> {
    let server = test_server(3600)?;
    let body: serde_json::Value = server.get("/ice").await.json();
    assert!(body["iceServers"].is_array());
    assert!(body["iceServers"][0]["credential"].is_string());
    Ok(())
}

#[tokio::test]
async fn ice_is_cors_open() -> anyhow::Result<()> {
    let server = test_server(3600)?;
    let resp = server
        .get("/ice")
        .add_header(
            HeaderName::from_static("origin"),
            HeaderValue::from_static("https://app.example"),
        )
        .await;
    resp.assert_status_ok();
    resp.assert_header("access-control-allow-origin", "*");
    Ok(())
}

#[tokio::test]
async fn ice_rejects_post() -> anyhow::Result<()> {
    let server = test_server(3600)?;
    let resp = server.post("/ice").await;
    resp.assert_status(StatusCode::METHOD_NOT_ALLOWED);
    Ok(())
}

#[tokio::test]
async fn health_is_alive() -> anyhow::Result<()> {
    let server = test_server(3600)?;
    let resp = server.get("/health").await;
    resp.assert_status_ok();
    resp.assert_text(HEALTH_BODY);
    Ok(())
}

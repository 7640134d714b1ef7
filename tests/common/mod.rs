#![allow(dead_code)]

use anyhow::{Context, Result};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

pub use school_directory_api::testing::*;

pub struct Reply {
    pub status: StatusCode,
    pub body: Value,
}

/// Drive one request through the router without a socket.
pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Result<Reply> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body)?))?,
        None => builder.body(Body::empty())?,
    };

    let response = router
        .clone()
        .oneshot(request)
        .await
        .context("router failed")?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).with_context(|| {
            format!("non-JSON body: {}", String::from_utf8_lossy(&bytes))
        })?
    };
    Ok(Reply { status, body })
}

/// Send raw bytes, for malformed-JSON cases.
pub async fn send_raw(router: &Router, method: Method, uri: &str, token: &str, raw: &str) -> Result<Reply> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(raw.to_string()))?;
    let response = router.clone().oneshot(request).await.context("router failed")?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(Reply {
        status,
        body: serde_json::from_slice(&bytes).unwrap_or(Value::Null),
    })
}

pub async fn get(router: &Router, uri: &str, token: Option<&str>) -> Result<Reply> {
    send(router, Method::GET, uri, token, None).await
}

/// Create a school as `token` and return its id.
pub async fn create_school(router: &Router, token: &str, name: &str) -> Result<i64> {
    let reply = send(router, Method::POST, "/api/schools", Some(token), Some(school_json(name))).await?;
    anyhow::ensure!(
        reply.status == StatusCode::CREATED,
        "create failed with {}: {}",
        reply.status,
        reply.body
    );
    reply.body["id"].as_i64().context("created school has no id")
}

mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use common::*;
use serde_json::json;

#[tokio::test]
async fn health_and_descriptor_are_public() -> Result<()> {
    let app = TestApp::new().await?;
    let router = app.router();

    let reply = get(&router, "/health", None).await?;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["status"], json!("ok"));

    let reply = get(&router, "/", None).await?;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["name"], json!("school-directory-api"));
    assert!(reply.body["endpoints"]["schools"].is_array(), "{}", reply.body);

    Ok(())
}

#[tokio::test]
async fn me_requires_a_valid_bearer_token() -> Result<()> {
    let app = TestApp::new().await?;
    let router = app.router();

    let reply = get(&router, "/api/auth/me", None).await?;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.body["code"], json!("UNAUTHORIZED"));

    let reply = get(&router, "/api/auth/me", Some("not-a-known-token")).await?;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);

    let reply = get(&router, "/api/auth/me", Some(EMPLOYEE_A_TOKEN)).await?;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(
        reply.body,
        json!({ "id": EMPLOYEE_A_ID, "email": "a@schools.ge", "role": "employee" })
    );

    let reply = get(&router, "/api/auth/me", Some(NO_ROLE_TOKEN)).await?;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["role"], json!(null));

    Ok(())
}

#[tokio::test]
async fn writes_need_a_role() -> Result<()> {
    let app = TestApp::new().await?;
    let router = app.router();
    let body = school_json("Roleless Academy");

    let reply = send(&router, Method::POST, "/api/schools", None, Some(body.clone())).await?;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);

    let reply = send(&router, Method::POST, "/api/schools", Some(NO_ROLE_TOKEN), Some(body)).await?;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert_eq!(reply.body["code"], json!("FORBIDDEN"));

    Ok(())
}

#[tokio::test]
async fn invalid_token_on_public_read_is_still_rejected() -> Result<()> {
    let app = TestApp::new().await?;
    let router = app.router();

    let reply = get(&router, "/api/schools", Some("forged")).await?;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);

    let reply = get(&router, "/api/schools", None).await?;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, json!([]));

    Ok(())
}

#[tokio::test]
async fn unknown_routes_answer_json_404() -> Result<()> {
    let app = TestApp::new().await?;
    let reply = get(&app.router(), "/api/nothing-here", None).await?;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.body["error"], json!(true));
    Ok(())
}

#[tokio::test]
async fn role_lookup_failure_is_an_internal_error() -> Result<()> {
    let app = TestApp::new().await?.with_failing_role_lookups();
    let router = app.router();

    for (method, uri, body) in [
        (Method::GET, "/api/auth/me", None),
        (Method::POST, "/api/schools", Some(school_json("Unreachable"))),
        (Method::GET, "/api/schools", None),
    ] {
        let reply = send(&router, method, uri, Some(EMPLOYEE_A_TOKEN), body).await?;
        assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR, "{}: {}", uri, reply.body);
        assert_eq!(reply.body["code"], json!("INTERNAL_SERVER_ERROR"));
    }

    // anonymous reads never touch the role store
    let reply = get(&router, "/api/schools", None).await?;
    assert_eq!(reply.status, StatusCode::OK);
    Ok(())
}

mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use common::*;
use school_directory_api::database::RoleStore;
use school_directory_api::types::Role;
use serde_json::json;

const URI: &str = "/api/auth/create-employee";

#[tokio::test]
async fn admin_provisions_an_employee_who_can_sign_in() -> Result<()> {
    let app = TestApp::new().await?;
    let router = app.router();

    let body = json!({ "email": "New.Staff@Schools.GE", "password": "s3cret-pass", "role": "employee" });
    let reply = send(&router, Method::POST, URI, Some(ADMIN_TOKEN), Some(body)).await?;
    assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
    assert_eq!(reply.body["email"], json!("new.staff@schools.ge"));
    assert_eq!(reply.body["role"], json!("employee"));

    let id = reply.body["id"].as_str().unwrap_or_default().to_string();
    assert_eq!(app.store.role_of(&id).await?, Some(Role::Employee));
    assert_eq!(app.identity.created().await.len(), 1);
    Ok(())
}

#[tokio::test]
async fn only_admins_may_provision() -> Result<()> {
    let app = TestApp::new().await?;
    let router = app.router();
    let body = json!({ "email": "x@schools.ge", "password": "s3cret-pass", "role": "admin" });

    let reply = send(&router, Method::POST, URI, Some(EMPLOYEE_A_TOKEN), Some(body.clone())).await?;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    let reply = send(&router, Method::POST, URI, Some(NO_ROLE_TOKEN), Some(body.clone())).await?;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    let reply = send(&router, Method::POST, URI, None, Some(body)).await?;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);

    assert!(app.identity.created().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn incomplete_or_unknown_role_is_a_bad_request() -> Result<()> {
    let app = TestApp::new().await?;
    let router = app.router();

    for body in [
        json!({ "email": "x@schools.ge", "password": "s3cret-pass" }),
        json!({ "email": "x@schools.ge", "role": "employee" }),
        json!({ "password": "s3cret-pass", "role": "employee" }),
        json!({ "email": "x@schools.ge", "password": "s3cret-pass", "role": "principal" }),
    ] {
        let reply = send(&router, Method::POST, URI, Some(ADMIN_TOKEN), Some(body.clone())).await?;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST, "{}", body);
    }

    let taken = json!({ "email": "a@schools.ge", "password": "s3cret-pass", "role": "employee" });
    let reply = send(&router, Method::POST, URI, Some(ADMIN_TOKEN), Some(taken)).await?;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    assert!(app.identity.created().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn failed_role_write_removes_the_new_account() -> Result<()> {
    let app = TestApp::new().await?.with_failing_role_writes();
    let router = app.router();

    let body = json!({ "email": "doomed@schools.ge", "password": "s3cret-pass", "role": "employee" });
    let reply = send(&router, Method::POST, URI, Some(ADMIN_TOKEN), Some(body)).await?;
    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(reply.body["code"], json!("INTERNAL_SERVER_ERROR"));

    assert!(app.identity.created().await.is_empty(), "account should be rolled back");
    assert_eq!(app.identity.deleted().await.len(), 1);
    Ok(())
}

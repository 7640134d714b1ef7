mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use common::*;
use serde_json::json;

#[tokio::test]
async fn one_bad_item_rejects_the_whole_batch() -> Result<()> {
    let app = TestApp::new().await?;
    let router = app.router();
    let id = create_school(&router, EMPLOYEE_A_TOKEN, "Gallery").await?;

    let batch = json!([
        { "mediaUrl": "https://cdn.ge/1.jpg", "type": "photo", "attachedTo": "school", "attachedId": id },
        { "mediaUrl": "https://cdn.ge/2.jpg", "type": "photo", "attachedTo": "school", "attachedId": id.to_string() },
        { "mediaUrl": "https://cdn.ge/3.mp4", "type": "hologram", "attachedTo": "school", "attachedId": id }
    ]);
    let reply = send(&router, Method::POST, "/api/media", None, Some(batch)).await?;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(
        reply.body["message"].as_str().unwrap_or_default().contains("index 2"),
        "{}",
        reply.body
    );

    let school = get(&router, &format!("/api/schools/{}", id), None).await?;
    assert_eq!(school.body["media"], json!([]));
    Ok(())
}

#[tokio::test]
async fn valid_batch_lands_on_school_and_level() -> Result<()> {
    let app = TestApp::new().await?;
    let router = app.router();
    let id = create_school(&router, EMPLOYEE_A_TOKEN, "Gallery").await?;
    let school = get(&router, &format!("/api/schools/{}", id), None).await?;
    let secondary_id = school.body["secondaryLevel"]["id"].as_i64().unwrap_or_default();

    let batch = json!([
        { "mediaUrl": " https://cdn.ge/front.jpg ", "description": "Front <gate>", "type": "photo", "attachedTo": "school", "attachedId": id },
        { "mediaUrl": "https://cdn.ge/lab.mp4", "type": "video", "attachedTo": "secondary", "attachedId": secondary_id },
        { "mediaUrl": "ftp://cdn.ge/dropped.jpg", "type": "photo", "attachedTo": "school", "attachedId": id }
    ]);
    let reply = send(&router, Method::POST, "/api/media", None, Some(batch)).await?;
    assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
    assert_eq!(reply.body.as_array().map(Vec::len), Some(2));
    assert_eq!(reply.body[0]["mediaUrl"], json!("https://cdn.ge/front.jpg"));
    assert_eq!(reply.body[0]["description"], json!("Front gate"));

    let school = get(&router, &format!("/api/schools/{}", id), None).await?;
    assert_eq!(school.body["media"].as_array().map(Vec::len), Some(1));
    assert_eq!(school.body["secondaryLevel"]["media"][0]["type"], json!("video"));
    Ok(())
}

#[tokio::test]
async fn unusable_batches_are_rejected() -> Result<()> {
    let app = TestApp::new().await?;
    let router = app.router();

    let only_bad_urls = json!([
        { "mediaUrl": "javascript:alert(1)", "type": "photo", "attachedTo": "school", "attachedId": 1 }
    ]);
    let reply = send(&router, Method::POST, "/api/media", None, Some(only_bad_urls)).await?;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let reply = send(&router, Method::POST, "/api/media", None, Some(json!([]))).await?;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let reply = send(&router, Method::POST, "/api/media", None, Some(json!({ "mediaUrl": "x" }))).await?;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let missing_parent = json!([
        { "mediaUrl": "https://cdn.ge/x.jpg", "type": "photo", "attachedTo": "basic", "attachedId": 987654 }
    ]);
    let reply = send(&router, Method::POST, "/api/media", None, Some(missing_parent)).await?;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn media_can_be_put_behind_auth() -> Result<()> {
    let mut config = test_config();
    config.security.media_requires_auth = true;
    let app = TestApp::with_config(config).await?;
    let router = app.router();
    let id = create_school(&router, EMPLOYEE_A_TOKEN, "Guarded").await?;

    let batch = json!([
        { "mediaUrl": "https://cdn.ge/1.jpg", "type": "photo", "attachedTo": "school", "attachedId": id }
    ]);
    let reply = send(&router, Method::POST, "/api/media", None, Some(batch.clone())).await?;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);

    let reply = send(&router, Method::POST, "/api/media", Some(EMPLOYEE_A_TOKEN), Some(batch)).await?;
    assert_eq!(reply.status, StatusCode::CREATED);
    Ok(())
}

mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::*;
use school_directory_api::database::SchoolStore;
use school_directory_api::validation::schema::{AddressPayload, SchoolPayload};
use serde_json::json;

async fn seed(app: &TestApp, count: usize) -> Result<()> {
    for n in 1..=count {
        let payload = SchoolPayload {
            name: format!("School {}", n),
            ..Default::default()
        };
        app.store.create(&payload, EMPLOYEE_A_ID).await?;
    }
    Ok(())
}

#[tokio::test]
async fn pages_cover_every_row_exactly_once() -> Result<()> {
    let app = TestApp::new().await?;
    seed(&app, 95).await?;
    let router = app.router();

    let reply = get(&router, "/api/schools?page=1&pageSize=20", None).await?;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(
        reply.body["pagination"],
        json!({ "page": 1, "pageSize": 20, "totalCount": 95, "totalPages": 5 })
    );
    assert_eq!(reply.body["data"].as_array().map(Vec::len), Some(20));
    assert_eq!(reply.body["data"][0]["name"], json!("School 95"));

    let reply = get(&router, "/api/schools?page=5&pageSize=20", None).await?;
    assert_eq!(reply.body["data"].as_array().map(Vec::len), Some(15));
    assert_eq!(reply.body["data"][14]["name"], json!("School 1"));

    let reply = get(&router, "/api/schools?page=6&pageSize=20", None).await?;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["data"], json!([]));
    assert_eq!(reply.body["pagination"]["totalPages"], json!(5));

    let reply = get(&router, "/api/schools", None).await?;
    assert_eq!(reply.body.as_array().map(Vec::len), Some(95));
    Ok(())
}

#[tokio::test]
async fn page_size_is_capped_and_bad_values_rejected() -> Result<()> {
    let app = TestApp::new().await?;
    seed(&app, 3).await?;
    let router = app.router();

    let reply = get(&router, "/api/schools?pageSize=5000", None).await?;
    assert_eq!(reply.body["pagination"]["pageSize"], json!(100));
    assert_eq!(reply.body["pagination"]["page"], json!(1));

    let reply = get(&router, "/api/schools?page=2", None).await?;
    assert_eq!(reply.body["pagination"]["pageSize"], json!(20));

    for uri in ["/api/schools?page=0", "/api/schools?page=abc", "/api/schools?pageSize=-4"] {
        let reply = get(&router, uri, None).await?;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(reply.body["code"], json!("VALIDATION_ERROR"));
    }
    Ok(())
}

#[tokio::test]
async fn lightweight_projection_carries_creator() -> Result<()> {
    let app = TestApp::new().await?;
    let router = app.router();
    create_school(&router, EMPLOYEE_A_TOKEN, "Light").await?;

    let reply = get(&router, "/api/schools?lightweight=true", None).await?;
    let row = &reply.body[0];
    assert_eq!(row["name"], json!("Light"));
    assert_eq!(row["creator"], json!({ "id": EMPLOYEE_A_ID, "email": "a@schools.ge" }));
    assert_eq!(row["address"]["district"], json!("Vake"));
    assert!(row.get("primaryLevel").is_none(), "{}", row);

    let reply = get(&router, "/api/schools?lightweight=1&page=1", None).await?;
    assert_eq!(reply.body["data"][0]["creator"]["id"], json!(EMPLOYEE_A_ID));
    Ok(())
}

#[tokio::test]
async fn city_district_and_search_narrow_the_list() -> Result<()> {
    let app = TestApp::new().await?;
    for (name, city, district) in [
        ("Tbilisi Classical Gymnasium", "Tbilisi", "Vake"),
        ("Saburtalo Lyceum", "Tbilisi", "Saburtalo"),
        ("Black Sea School", "Batumi", "Old Town"),
    ] {
        let payload = SchoolPayload {
            name: name.to_string(),
            address: AddressPayload {
                city: Some(city.to_string()),
                district: Some(district.to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        app.store.create(&payload, EMPLOYEE_B_ID).await?;
    }
    let router = app.router();

    let reply = get(&router, "/api/schools?city=Tbilisi", None).await?;
    assert_eq!(reply.body.as_array().map(Vec::len), Some(2));

    let reply = get(&router, "/api/schools?city=Tbilisi&district=Vake", None).await?;
    assert_eq!(reply.body[0]["name"], json!("Tbilisi Classical Gymnasium"));
    assert_eq!(reply.body.as_array().map(Vec::len), Some(1));

    let reply = get(&router, "/api/schools?search=lyceum", None).await?;
    assert_eq!(reply.body[0]["name"], json!("Saburtalo Lyceum"));
    assert_eq!(reply.body.as_array().map(Vec::len), Some(1));

    // employee A owns none of them
    let reply = get(&router, "/api/schools?city=Tbilisi", Some(EMPLOYEE_A_TOKEN)).await?;
    assert_eq!(reply.body, json!([]));
    Ok(())
}

#[tokio::test]
async fn malformed_query_string_answers_json_error() -> Result<()> {
    let app = TestApp::new().await?;
    let router = app.router();

    let reply = get(&router, "/api/schools?page=1&page=2", None).await?;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["error"], json!(true));
    assert_eq!(reply.body["code"], json!("BAD_REQUEST"));
    assert!(
        reply.body["message"].as_str().unwrap_or_default().starts_with("Invalid query string"),
        "{}",
        reply.body
    );
    Ok(())
}

use serde_json::Value;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::client::SchoolsClient;

pub async fn health(client: &SchoolsClient, output_format: OutputFormat) -> anyhow::Result<()> {
    let body = client.health().await?;
    let status = body.get("status").and_then(Value::as_str).unwrap_or("unknown");
    let database = body.get("database").and_then(Value::as_str).unwrap_or("unknown");
    output_success(
        output_format,
        &format!("API status: {} (database: {})", status, database),
        body.clone(),
    )
}

pub async fn whoami(client: &SchoolsClient, output_format: OutputFormat) -> anyhow::Result<()> {
    let body = client.whoami().await?;
    let role = body.get("role").and_then(Value::as_str).unwrap_or("none");
    let email = body.get("email").and_then(Value::as_str).unwrap_or("-");
    output_success(
        output_format,
        &format!("{} ({}), role: {}", email, body["id"].as_str().unwrap_or("-"), role),
        body.clone(),
    )
}

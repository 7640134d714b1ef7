//! Thin HTTP client for the school directory API, used by the `schools` CLI.

use reqwest::{Client, Method, RequestBuilder};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{status} {code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
        field_errors: Option<Value>,
    },
}

/// Filters for `GET /api/schools`.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub lightweight: bool,
    pub city: Option<String>,
    pub district: Option<String>,
    pub search: Option<String>,
}

impl ListOptions {
    fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(page) = self.page {
            query.push(("page", page.to_string()));
        }
        if let Some(size) = self.page_size {
            query.push(("pageSize", size.to_string()));
        }
        if self.lightweight {
            query.push(("lightweight", "true".to_string()));
        }
        for (key, value) in [("city", &self.city), ("district", &self.district), ("search", &self.search)] {
            if let Some(value) = value {
                query.push((key, value.clone()));
            }
        }
        query
    }
}

#[derive(Clone)]
pub struct SchoolsClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl SchoolsClient {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(builder: RequestBuilder) -> Result<Value, ClientError> {
        let response = builder.send().await?;
        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        if status.is_success() {
            return Ok(body);
        }
        Err(ClientError::Api {
            status: status.as_u16(),
            code: body["code"].as_str().unwrap_or("UNKNOWN").to_string(),
            message: body["message"]
                .as_str()
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed"))
                .to_string(),
            field_errors: body.get("field_errors").cloned(),
        })
    }

    /// `/health` answers 503 with a body when degraded; both are reported as data.
    pub async fn health(&self) -> Result<Value, ClientError> {
        let response = self.request(Method::GET, "/health").send().await?;
        Ok(response.json().await?)
    }

    pub async fn whoami(&self) -> Result<Value, ClientError> {
        Self::send(self.request(Method::GET, "/api/auth/me")).await
    }

    pub async fn list_schools(&self, options: &ListOptions) -> Result<Value, ClientError> {
        Self::send(self.request(Method::GET, "/api/schools").query(&options.query())).await
    }

    pub async fn get_school(&self, id: i64) -> Result<Value, ClientError> {
        Self::send(self.request(Method::GET, &format!("/api/schools/{}", id))).await
    }

    pub async fn create_school(&self, body: &Value) -> Result<Value, ClientError> {
        Self::send(self.request(Method::POST, "/api/schools").json(body)).await
    }

    pub async fn update_school(&self, id: i64, body: &Value) -> Result<Value, ClientError> {
        Self::send(self.request(Method::PUT, &format!("/api/schools/{}", id)).json(body)).await
    }

    pub async fn delete_school(&self, id: i64) -> Result<Value, ClientError> {
        Self::send(self.request(Method::DELETE, &format!("/api/schools/{}", id))).await
    }

    pub async fn add_media(&self, items: &Value) -> Result<Value, ClientError> {
        Self::send(self.request(Method::POST, "/api/media").json(items)).await
    }

    pub async fn create_employee(&self, email: &str, password: &str, role: &str) -> Result<Value, ClientError> {
        let body = serde_json::json!({ "email": email, "password": password, "role": role });
        Self::send(self.request(Method::POST, "/api/auth/create-employee").json(&body)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_options_only_send_what_is_set() {
        assert!(ListOptions::default().query().is_empty());

        let options = ListOptions {
            page: Some(2),
            lightweight: true,
            city: Some("Tbilisi".into()),
            ..Default::default()
        };
        assert_eq!(
            options.query(),
            vec![
                ("page", "2".to_string()),
                ("lightweight", "true".to_string()),
                ("city", "Tbilisi".to_string())
            ]
        );
    }

    #[test]
    fn base_url_loses_trailing_slash() {
        let client = SchoolsClient::new("http://localhost:3001/", None).unwrap();
        assert_eq!(client.base_url, "http://localhost:3001");
    }
}

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::{verify_hs256, AuthError, Identity, IdentityProvider};
use crate::config::SupabaseConfig;

/// Supabase GoTrue client. Access tokens are verified locally when a JWT
/// secret is configured, otherwise against `/auth/v1/user`.
#[derive(Clone)]
pub struct SupabaseClient {
    http: Client,
    config: SupabaseConfig,
}

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

impl From<GoTrueUser> for Identity {
    fn from(user: GoTrueUser) -> Self {
        Identity {
            id: user.id,
            email: user.email,
        }
    }
}

impl SupabaseClient {
    pub fn new(config: SupabaseConfig) -> Result<Self, AuthError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AuthError::Provider(e.to_string()))?;
        Ok(Self { http, config })
    }

    fn endpoint(&self, path: &str) -> Result<String, AuthError> {
        if self.config.url.is_empty() {
            return Err(AuthError::NotConfigured("SUPABASE_URL"));
        }
        Ok(format!("{}/auth/v1/{}", self.config.url.trim_end_matches('/'), path))
    }

    fn service_key(&self) -> Result<&str, AuthError> {
        if self.config.service_role_key.is_empty() {
            Err(AuthError::NotConfigured("SUPABASE_SERVICE_ROLE_KEY"))
        } else {
            Ok(&self.config.service_role_key)
        }
    }

    async fn rejected(response: reqwest::Response) -> AuthError {
        let status = response.status().as_u16();
        let body: serde_json::Value = response.json().await.unwrap_or_default();
        let message = ["msg", "message", "error_description", "error"]
            .iter()
            .find_map(|k| body.get(*k).and_then(|v| v.as_str()))
            .unwrap_or("request rejected")
            .to_string();
        AuthError::Rejected { status, message }
    }
}

#[async_trait]
impl IdentityProvider for SupabaseClient {
    async fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        if let Some(secret) = &self.config.jwt_secret {
            return verify_hs256(token, secret);
        }

        let response = self
            .http
            .get(self.endpoint("user")?)
            .header("apikey", &self.config.anon_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;

        match response.status() {
            s if s.is_success() => response
                .json::<GoTrueUser>()
                .await
                .map(Identity::from)
                .map_err(|e| AuthError::Provider(e.to_string())),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(AuthError::InvalidToken("rejected by identity provider".to_string()))
            }
            _ => Err(Self::rejected(response).await),
        }
    }

    async fn create_user(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let key = self.service_key()?;
        let response = self
            .http
            .post(self.endpoint("admin/users")?)
            .header("apikey", key)
            .bearer_auth(key)
            .json(&json!({ "email": email, "password": password, "email_confirm": true }))
            .send()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::rejected(response).await);
        }
        response
            .json::<GoTrueUser>()
            .await
            .map(Identity::from)
            .map_err(|e| AuthError::Provider(e.to_string()))
    }

    async fn delete_user(&self, id: &str) -> Result<(), AuthError> {
        let key = self.service_key()?;
        let response = self
            .http
            .delete(self.endpoint(&format!("admin/users/{}", id))?)
            .header("apikey", key)
            .bearer_auth(key)
            .send()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::rejected(response).await)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_client_fails_fast() {
        let client = SupabaseClient::new(SupabaseConfig::default()).unwrap();
        assert!(matches!(
            client.verify("token").await,
            Err(AuthError::NotConfigured("SUPABASE_URL"))
        ));
        assert!(matches!(
            client.create_user("a@b.ge", "secret").await,
            Err(AuthError::NotConfigured("SUPABASE_SERVICE_ROLE_KEY"))
        ));
    }

    #[tokio::test]
    async fn local_secret_skips_network() {
        let config = SupabaseConfig {
            jwt_secret: Some("local-secret".into()),
            ..Default::default()
        };
        let client = SupabaseClient::new(config).unwrap();
        assert!(matches!(
            client.verify("garbage").await,
            Err(AuthError::InvalidToken(_))
        ));
    }
}

//! Identity provider seam: token verification and account administration.

pub mod supabase;

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::UserId;

pub use supabase::SupabaseClient;

/// Audience stamped on end-user access tokens.
pub const TOKEN_AUDIENCE: &str = "authenticated";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Identity provider unreachable: {0}")]
    Provider(String),

    #[error("Identity provider rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Identity provider not configured: {0}")]
    NotConfigured(&'static str),
}

/// A verified account as the identity provider knows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub email: Option<String>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Identity, AuthError>;

    /// Create a pre-confirmed account.
    async fn create_user(&self, email: &str, password: &str) -> Result<Identity, AuthError>;

    async fn delete_user(&self, id: &str) -> Result<(), AuthError>;
}

/// Access token claims issued by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub aud: String,
    pub exp: i64,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub role: Option<String>,
}

/// HS256 verification against the project's JWT secret.
pub fn verify_hs256(token: &str, secret: &str) -> Result<Identity, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[TOKEN_AUDIENCE]);

    let data = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

    if data.claims.sub.trim().is_empty() {
        return Err(AuthError::InvalidToken("token has no subject".to_string()));
    }
    Ok(Identity {
        id: data.claims.sub,
        email: data.claims.email,
    })
}

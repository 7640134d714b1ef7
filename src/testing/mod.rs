//! In-process doubles for integration tests: a token table standing in for
//! the identity provider, a role store that refuses writes, and a ready-made
//! application over [`MemoryStore`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::auth::{AuthError, Identity, IdentityProvider};
use crate::config::AppConfig;
use crate::database::models::UserRole;
use crate::database::{DatabaseError, MemoryStore, RoleStore};
use crate::state::AppState;
use crate::types::Role;

pub const ADMIN_TOKEN: &str = "admin-token";
pub const EMPLOYEE_A_TOKEN: &str = "employee-a-token";
pub const EMPLOYEE_B_TOKEN: &str = "employee-b-token";
pub const NO_ROLE_TOKEN: &str = "no-role-token";

pub const ADMIN_ID: &str = "admin-1";
pub const EMPLOYEE_A_ID: &str = "employee-a";
pub const EMPLOYEE_B_ID: &str = "employee-b";
pub const NO_ROLE_ID: &str = "no-role";

#[derive(Default)]
struct Accounts {
    tokens: HashMap<String, Identity>,
    created: Vec<Identity>,
    deleted: Vec<String>,
    next_id: u64,
}

/// Identity provider backed by a fixed token table.
#[derive(Default)]
pub struct StaticIdentityProvider {
    accounts: Mutex<Accounts>,
}

impl StaticIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, token: &str, id: &str, email: &str) -> Self {
        self.accounts.get_mut().tokens.insert(
            token.to_string(),
            Identity {
                id: id.to_string(),
                email: Some(email.to_string()),
            },
        );
        self
    }

    /// Accounts created through `create_user` and not deleted since.
    pub async fn created(&self) -> Vec<Identity> {
        self.accounts.lock().await.created.clone()
    }

    pub async fn deleted(&self) -> Vec<String> {
        self.accounts.lock().await.deleted.clone()
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        self.accounts
            .lock()
            .await
            .tokens
            .get(token)
            .cloned()
            .ok_or_else(|| AuthError::InvalidToken("unknown token".to_string()))
    }

    async fn create_user(&self, email: &str, _password: &str) -> Result<Identity, AuthError> {
        let mut accounts = self.accounts.lock().await;
        let taken = accounts
            .tokens
            .values()
            .chain(accounts.created.iter())
            .any(|i| i.email.as_deref() == Some(email));
        if taken {
            return Err(AuthError::Rejected {
                status: 422,
                message: "A user with this email address has already been registered".to_string(),
            });
        }

        accounts.next_id += 1;
        let identity = Identity {
            id: format!("provisioned-{}", accounts.next_id),
            email: Some(email.to_string()),
        };
        accounts.created.push(identity.clone());
        Ok(identity)
    }

    async fn delete_user(&self, id: &str) -> Result<(), AuthError> {
        let mut accounts = self.accounts.lock().await;
        let before = accounts.created.len();
        accounts.created.retain(|i| i.id != id);
        if accounts.created.len() == before {
            return Err(AuthError::Rejected {
                status: 404,
                message: format!("user {} not found", id),
            });
        }
        accounts.deleted.push(id.to_string());
        Ok(())
    }
}

/// Fails every assignment. Reads go to the wrapped store unless lookups
/// are set to fail as well.
pub struct FailingRoleStore<R> {
    inner: Arc<R>,
    fail_lookups: bool,
}

impl<R> FailingRoleStore<R> {
    pub fn new(inner: Arc<R>) -> Self {
        Self {
            inner,
            fail_lookups: false,
        }
    }

    pub fn failing_lookups(mut self) -> Self {
        self.fail_lookups = true;
        self
    }
}

#[async_trait]
impl<R: RoleStore> RoleStore for FailingRoleStore<R> {
    async fn role_of(&self, user_id: &str) -> Result<Option<Role>, DatabaseError> {
        if self.fail_lookups {
            return Err(DatabaseError::QueryError("user_roles is unreachable".to_string()));
        }
        self.inner.role_of(user_id).await
    }

    async fn assign(&self, _user_id: &str, _email: &str, _role: Role) -> Result<UserRole, DatabaseError> {
        Err(DatabaseError::QueryError("user_roles is unavailable".to_string()))
    }
}

/// Application over a fresh [`MemoryStore`] with one admin, two employees and
/// a signed-in user who has no role.
pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub identity: Arc<StaticIdentityProvider>,
}

impl TestApp {
    pub async fn new() -> anyhow::Result<Self> {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(config: AppConfig) -> anyhow::Result<Self> {
        let store = Arc::new(MemoryStore::new());
        store.assign(ADMIN_ID, "admin@schools.ge", Role::Admin).await?;
        store.assign(EMPLOYEE_A_ID, "a@schools.ge", Role::Employee).await?;
        store.assign(EMPLOYEE_B_ID, "b@schools.ge", Role::Employee).await?;

        let identity = Arc::new(
            StaticIdentityProvider::new()
                .with_user(ADMIN_TOKEN, ADMIN_ID, "admin@schools.ge")
                .with_user(EMPLOYEE_A_TOKEN, EMPLOYEE_A_ID, "a@schools.ge")
                .with_user(EMPLOYEE_B_TOKEN, EMPLOYEE_B_ID, "b@schools.ge")
                .with_user(NO_ROLE_TOKEN, NO_ROLE_ID, "nobody@schools.ge"),
        );

        let state = AppState::new(config, store.clone(), identity.clone());
        Ok(Self {
            state,
            store,
            identity,
        })
    }

    /// Swap in a role store whose writes fail.
    pub fn with_failing_role_writes(mut self) -> Self {
        let roles = Arc::new(FailingRoleStore::new(self.store.clone()));
        self.state = self.state.with_roles(roles);
        self
    }

    /// Swap in a role store that cannot be read at all.
    pub fn with_failing_role_lookups(mut self) -> Self {
        let roles = Arc::new(FailingRoleStore::new(self.store.clone()).failing_lookups());
        self.state = self.state.with_roles(roles);
        self
    }

    pub fn router(&self) -> Router {
        crate::routes::app(self.state.clone())
    }
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.database.url = None;
    config.security.enable_cors = false;
    config.pagination.default_page_size = 20;
    config.pagination.max_page_size = 100;
    config
}

/// A complete, valid create payload.
pub fn school_json(name: &str) -> Value {
    json!({
        "name": name,
        "phoneNumber1": "555123456",
        "email": "Info@Example.GE",
        "website": "https://example.ge",
        "foundedYear": "1995",
        "hasUniform": true,
        "address": { "city": "Tbilisi", "district": "Vake", "street": "Chavchavadze 1", "zipCode": "0179" },
        "infrastructure": { "hasLibrary": true, "buildingArea": "1200.5" },
        "primaryLevel": {
            "price": 4500,
            "startsAt": "09:00",
            "foreignLanguages": "English, German",
            "photos": ["https://cdn.example.ge/primary.jpg"]
        },
        "basicLevel": { "capacity": "120" },
        "secondaryLevel": { "sportsClubs": ["Chess", "Football"] }
    })
}

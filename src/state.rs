use std::sync::Arc;

use crate::auth::IdentityProvider;
use crate::config::AppConfig;
use crate::database::store::{MediaStore, RoleStore, SchoolStore};

/// Handles shared by every request, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub schools: Arc<dyn SchoolStore>,
    pub media: Arc<dyn MediaStore>,
    pub roles: Arc<dyn RoleStore>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    /// One backend serving all three store roles.
    pub fn new<S>(config: AppConfig, store: Arc<S>, identity: Arc<dyn IdentityProvider>) -> Self
    where
        S: SchoolStore + MediaStore + RoleStore + 'static,
    {
        Self {
            config: Arc::new(config),
            schools: store.clone(),
            media: store.clone(),
            roles: store,
            identity,
        }
    }

    pub fn with_roles(mut self, roles: Arc<dyn RoleStore>) -> Self {
        self.roles = roles;
        self
    }
}

use axum::extract::State;
use serde::Serialize;

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;
use crate::types::Role;
use crate::validation::schema::EmployeePayload;
use crate::validation::ValidatedJson;

#[derive(Debug, Serialize)]
pub struct ProvisionedEmployee {
    pub id: String,
    pub email: String,
    pub role: Role,
}

/// POST /api/auth/create-employee - create a confirmed account and assign its role
///
/// If the role cannot be stored the freshly created account is deleted again,
/// so a failed request never leaves a login without a role behind.
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(payload): ValidatedJson<EmployeePayload>,
) -> ApiResult<ProvisionedEmployee> {
    if !user.is_admin() {
        return Err(ApiError::forbidden("Admin role required"));
    }

    let (Some(email), Some(password), Some(role)) =
        (payload.email.as_deref(), payload.password.as_deref(), payload.role())
    else {
        return Err(ApiError::bad_request("email, password and role are required"));
    };

    let identity = state.identity.create_user(email, password).await?;
    tracing::info!("Admin {} created account {} for {}", user.id, identity.id, email);

    if let Err(e) = state.roles.assign(&identity.id, email, role).await {
        tracing::error!("Assigning role {} to {} failed: {}", role, identity.id, e);
        match state.identity.delete_user(&identity.id).await {
            Ok(()) => tracing::info!("Rolled back account {}", identity.id),
            Err(cleanup) => tracing::error!(
                "Orphaned identity account {} ({}) left behind: {}",
                identity.id,
                email,
                cleanup
            ),
        }
        return Err(ApiError::internal_server_error("Failed to assign employee role"));
    }

    Ok(ApiResponse::created(ProvisionedEmployee {
        email: identity.email.unwrap_or_else(|| email.to_string()),
        id: identity.id,
        role,
    }))
}

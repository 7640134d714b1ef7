use serde::Serialize;

use crate::middleware::{ApiResponse, AuthUser};
use crate::types::Role;

#[derive(Debug, Serialize)]
pub struct WhoAmI {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<Role>,
}

/// GET /api/auth/me - the verified caller and their stored role
pub async fn get(user: AuthUser) -> ApiResponse<WhoAmI> {
    ApiResponse::success(WhoAmI {
        id: user.id,
        email: user.email,
        role: user.role,
    })
}

pub mod auth;
pub mod response;

pub use auth::{authenticate, optional_authenticate, require_admin, require_auth, AuthUser, Caller};
pub use response::{ApiResponse, ApiResult, Listing, Pagination};

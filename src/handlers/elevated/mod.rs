// handlers/elevated/mod.rs - admin-only endpoints
//
// Routed behind authenticate + require_admin; handlers re-check the role
// themselves before touching the identity provider.
pub mod employees;

pub use employees::create as employee_create;

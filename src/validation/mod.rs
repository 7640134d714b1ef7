pub mod extract;
pub mod phone;
pub mod sanitize;
pub mod schema;

pub use extract::ValidatedJson;
pub use phone::{format_phone_for_display, is_valid_phone, normalize_phone};
pub use sanitize::{sanitize_email, sanitize_phone, sanitize_string, sanitize_url, Sanitize};

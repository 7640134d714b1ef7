// handlers/public/mod.rs - endpoints open to anonymous callers
//
// School reads run behind optional_authenticate so the caller's role can
// narrow what is visible; root and health have no middleware at all.
pub mod root;
pub mod schools;

pub use root::{health, root};
pub use schools::get as school_get;
pub use schools::list as school_list;

// handlers/protected/mod.rs - endpoints that require a verified token
//
// School writes additionally need a stored role (require_auth) and pass the
// ownership check inside the handler. Media sits here too; whether it is
// guarded is decided by configuration when the router is built.
pub mod media;
pub mod schools;
pub mod whoami;

pub use media::post as media_post;
pub use schools::delete as school_delete;
pub use schools::post as school_post;
pub use schools::put as school_put;
pub use whoami::get as whoami_get;

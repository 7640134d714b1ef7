pub mod employee;
pub mod media;
pub mod schools;
pub mod session;

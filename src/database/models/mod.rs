pub mod address;
pub mod education_level;
pub mod infrastructure;
pub mod media;
pub mod school;
pub mod user_role;

pub use address::Address;
pub use education_level::{EducationLevel, LevelKind};
pub use infrastructure::Infrastructure;
pub use media::{MediaItem, MediaKind, MediaParent, MediaRow, NewMedia};
pub use school::{Creator, School, SchoolRow, SchoolSummary, SummaryAddress};
pub use user_role::{UserRole, UserRoleRow};

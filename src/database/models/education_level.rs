use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::media::MediaItem;

/// The three schooling stages. Each has its own table with identical columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelKind {
    Primary,
    Basic,
    Secondary,
}

impl LevelKind {
    pub const ALL: [LevelKind; 3] = [LevelKind::Primary, LevelKind::Basic, LevelKind::Secondary];

    pub fn table_name(&self) -> &'static str {
        match self {
            LevelKind::Primary => "primary_levels",
            LevelKind::Basic => "basic_levels",
            LevelKind::Secondary => "secondary_levels",
        }
    }

    /// Column on `media_items` that points at this level's table.
    pub fn media_column(&self) -> &'static str {
        match self {
            LevelKind::Primary => "primary_level_id",
            LevelKind::Basic => "basic_level_id",
            LevelKind::Secondary => "secondary_level_id",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EducationLevel {
    pub id: i64,
    pub school_id: i64,
    pub price: Option<f64>,
    pub discount_info: Option<String>,
    pub capacity: Option<i32>,
    pub students_per_class: Option<i32>,
    pub starts_at: Option<String>,
    pub ends_at: Option<String>,
    pub meals_included: bool,
    pub meals_comment: Option<String>,
    pub transport_available: bool,
    pub transport_comment: Option<String>,
    pub extended_day: bool,
    pub sports_clubs: Vec<String>,
    pub foreign_languages: Vec<String>,
    pub extracurricular: Option<String>,
    pub admission_comment: Option<String>,
    #[sqlx(skip)]
    #[serde(default)]
    pub media: Vec<MediaItem>,
}

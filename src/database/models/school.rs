use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::address::Address;
use super::education_level::EducationLevel;
use super::infrastructure::Infrastructure;
use super::media::MediaItem;

/// Scalar columns of the `schools` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SchoolRow {
    pub id: i64,
    pub name: String,
    pub phone_number1: Option<String>,
    pub phone_number2: Option<String>,
    pub phone_number3: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub facebook_url: Option<String>,
    pub instagram_url: Option<String>,
    pub logo_url: Option<String>,
    pub director_name: Option<String>,
    pub deputy_director_name: Option<String>,
    pub founded_year: Option<i32>,
    pub description: Option<String>,
    pub history: Option<String>,
    pub mission: Option<String>,
    pub has_uniform: bool,
    pub uniform_comment: Option<String>,
    pub has_security: bool,
    pub security_comment: Option<String>,
    pub has_psychologist: bool,
    pub psychologist_comment: Option<String>,
    pub has_special_needs_support: bool,
    pub special_needs_comment: Option<String>,
    pub created_by: String,
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A school with every owned relation loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct School {
    #[serde(flatten)]
    pub record: SchoolRow,
    pub address: Address,
    pub infrastructure: Infrastructure,
    pub primary_level: EducationLevel,
    pub basic_level: EducationLevel,
    pub secondary_level: EducationLevel,
    /// Media attached to the school itself; level media lives on each level.
    #[serde(default)]
    pub media: Vec<MediaItem>,
}

impl School {
    pub fn id(&self) -> i64 {
        self.record.id
    }

    pub fn owner(&self) -> &str {
        &self.record.created_by
    }
}

/// Address fields shown on listing cards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryAddress {
    pub city: Option<String>,
    pub district: Option<String>,
    pub street: Option<String>,
    pub zip_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Creator {
    pub id: String,
    pub email: Option<String>,
}

/// Lightweight projection for the listing grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolSummary {
    pub id: i64,
    pub name: String,
    pub phone_number1: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub logo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub address: SummaryAddress,
    pub creator: Creator,
}

impl SchoolSummary {
    pub fn new(row: &SchoolRow, address: Option<&Address>, creator_email: Option<String>) -> Self {
        Self {
            id: row.id,
            name: row.name.clone(),
            phone_number1: row.phone_number1.clone(),
            email: row.email.clone(),
            website: row.website.clone(),
            logo_url: row.logo_url.clone(),
            created_at: row.created_at,
            updated_at: row.updated_at,
            address: address
                .map(|a| SummaryAddress {
                    city: a.city.clone(),
                    district: a.district.clone(),
                    street: a.street.clone(),
                    zip_code: a.zip_code.clone(),
                })
                .unwrap_or_default(),
            creator: Creator {
                id: row.created_by.clone(),
                email: creator_email,
            },
        }
    }
}

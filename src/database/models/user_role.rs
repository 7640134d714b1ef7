use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::manager::DatabaseError;
use crate::types::Role;

#[derive(Debug, Clone, FromRow)]
pub struct UserRoleRow {
    pub user_id: String,
    pub email: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRole {
    pub user_id: String,
    pub email: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<UserRoleRow> for UserRole {
    type Error = DatabaseError;

    fn try_from(row: UserRoleRow) -> Result<Self, Self::Error> {
        let role = row.role.parse::<Role>().map_err(DatabaseError::Corrupt)?;
        Ok(UserRole {
            user_id: row.user_id,
            email: row.email,
            role,
            created_at: row.created_at,
        })
    }
}

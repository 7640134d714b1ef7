use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: i64,
    pub school_id: i64,
    pub city: Option<String>,
    pub district: Option<String>,
    pub street: Option<String>,
    pub zip_code: Option<String>,
}

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Infrastructure {
    pub id: i64,
    pub school_id: i64,
    pub has_library: bool,
    pub has_gym: bool,
    pub has_swimming_pool: bool,
    pub has_cafeteria: bool,
    pub has_medical_room: bool,
    pub has_playground: bool,
    pub has_computer_lab: bool,
    pub has_science_lab: bool,
    pub has_parking: bool,
    pub has_wheelchair_access: bool,
    pub building_area: Option<f64>,
    pub yard_area: Option<f64>,
    pub comment: Option<String>,
}

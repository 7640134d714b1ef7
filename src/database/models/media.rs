use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;

use crate::database::manager::DatabaseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Photo,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Photo => "photo",
            MediaKind::Video => "video",
        }
    }
}

impl FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "photo" => Ok(MediaKind::Photo),
            "video" => Ok(MediaKind::Video),
            other => Err(format!("type must be 'photo' or 'video', got '{}'", other)),
        }
    }
}

/// The record a media item hangs off. Exactly one parent, always.
///
/// Serialized as `{"attachedTo": "primary", "attachedId": 12}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "attachedTo", content = "attachedId", rename_all = "lowercase")]
pub enum MediaParent {
    School(i64),
    Primary(i64),
    Basic(i64),
    Secondary(i64),
}

impl MediaParent {
    pub fn from_tag(tag: &str, id: i64) -> Option<Self> {
        match tag {
            "school" => Some(MediaParent::School(id)),
            "primary" => Some(MediaParent::Primary(id)),
            "basic" => Some(MediaParent::Basic(id)),
            "secondary" => Some(MediaParent::Secondary(id)),
            _ => None,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            MediaParent::School(id)
            | MediaParent::Primary(id)
            | MediaParent::Basic(id)
            | MediaParent::Secondary(id) => *id,
        }
    }

    /// Foreign-key column on `media_items` populated for this parent.
    pub fn column(&self) -> &'static str {
        match self {
            MediaParent::School(_) => "school_id",
            MediaParent::Primary(_) => "primary_level_id",
            MediaParent::Basic(_) => "basic_level_id",
            MediaParent::Secondary(_) => "secondary_level_id",
        }
    }

    /// Split into the four nullable column values used by storage.
    pub fn columns(&self) -> [Option<i64>; 4] {
        match *self {
            MediaParent::School(id) => [Some(id), None, None, None],
            MediaParent::Primary(id) => [None, Some(id), None, None],
            MediaParent::Basic(id) => [None, None, Some(id), None],
            MediaParent::Secondary(id) => [None, None, None, Some(id)],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub id: i64,
    pub media_url: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub media_type: MediaKind,
    #[serde(flatten)]
    pub parent: MediaParent,
    pub created_at: DateTime<Utc>,
}

/// A validated media item ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMedia {
    pub media_url: String,
    pub description: Option<String>,
    pub media_type: MediaKind,
    pub parent: MediaParent,
}

/// Raw `media_items` row with the four nullable parent columns.
#[derive(Debug, Clone, FromRow)]
pub struct MediaRow {
    pub id: i64,
    pub media_url: String,
    pub description: Option<String>,
    pub media_type: String,
    pub school_id: Option<i64>,
    pub primary_level_id: Option<i64>,
    pub basic_level_id: Option<i64>,
    pub secondary_level_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<MediaRow> for MediaItem {
    type Error = DatabaseError;

    fn try_from(row: MediaRow) -> Result<Self, Self::Error> {
        let parent = match (
            row.school_id,
            row.primary_level_id,
            row.basic_level_id,
            row.secondary_level_id,
        ) {
            (Some(id), None, None, None) => MediaParent::School(id),
            (None, Some(id), None, None) => MediaParent::Primary(id),
            (None, None, Some(id), None) => MediaParent::Basic(id),
            (None, None, None, Some(id)) => MediaParent::Secondary(id),
            _ => {
                return Err(DatabaseError::Corrupt(format!(
                    "media item {} does not have exactly one parent",
                    row.id
                )))
            }
        };
        let media_type = row
            .media_type
            .parse::<MediaKind>()
            .map_err(DatabaseError::Corrupt)?;

        Ok(MediaItem {
            id: row.id,
            media_url: row.media_url,
            description: row.description,
            media_type,
            parent,
            created_at: row.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(parents: [Option<i64>; 4]) -> MediaRow {
        MediaRow {
            id: 7,
            media_url: "https://cdn.example.com/a.jpg".into(),
            description: None,
            media_type: "photo".into(),
            school_id: parents[0],
            primary_level_id: parents[1],
            basic_level_id: parents[2],
            secondary_level_id: parents[3],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn row_with_single_parent_converts() {
        let item = MediaItem::try_from(row(MediaParent::Basic(3).columns())).unwrap();
        assert_eq!(item.parent, MediaParent::Basic(3));
        assert_eq!(item.media_type, MediaKind::Photo);
    }

    #[test]
    fn row_with_zero_or_two_parents_is_rejected() {
        assert!(MediaItem::try_from(row([None, None, None, None])).is_err());
        assert!(MediaItem::try_from(row([Some(1), Some(2), None, None])).is_err());
    }

    #[test]
    fn parent_serializes_as_tag_and_id() {
        let item = MediaItem::try_from(row(MediaParent::Secondary(9).columns())).unwrap();
        let v = serde_json::to_value(&item).unwrap();
        assert_eq!(v["attachedTo"], json!("secondary"));
        assert_eq!(v["attachedId"], json!(9));
        assert_eq!(v["type"], json!("photo"));
        assert_eq!(v["mediaUrl"], json!("https://cdn.example.com/a.jpg"));
    }
}

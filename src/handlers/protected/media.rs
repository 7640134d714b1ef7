use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde_json::{Map, Value};

use crate::database::models::{MediaItem, MediaKind, MediaParent, NewMedia};
use crate::error::{ApiError, FieldErrors};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::validation::{sanitize_string, sanitize_url};

/// POST /api/media - attach a batch of photos/videos to schools or levels
///
/// Every item is checked before anything is written; the first bad item
/// rejects the whole batch.
pub async fn post(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Vec<MediaItem>> {
    let Json(body) = body.map_err(|rejection| ApiError::invalid_json(rejection.body_text()))?;
    let Value::Array(raw_items) = body else {
        return Err(ApiError::bad_request("Body must be a JSON array of media items"));
    };

    let parsed = raw_items
        .iter()
        .enumerate()
        .map(|(index, item)| parse_item(index, item))
        .collect::<Result<Vec<_>, _>>()?;

    let items: Vec<NewMedia> = parsed.into_iter().filter_map(sanitize_item).collect();
    if items.is_empty() {
        return Err(ApiError::bad_request("No valid media items to insert"));
    }

    let inserted = state.media.insert_many(&items).await?;
    tracing::info!("Inserted {} media item(s)", inserted.len());
    Ok(ApiResponse::created(inserted))
}

fn item_error(index: usize, field: &str, problem: &str) -> ApiError {
    let mut field_errors = FieldErrors::new();
    field_errors.insert(format!("[{}].{}", index, field), vec![problem.to_string()]);
    ApiError::validation_error(
        format!("Invalid media item at index {}: {} {}", index, field, problem),
        Some(field_errors),
    )
}

fn parse_item(index: usize, item: &Value) -> Result<NewMedia, ApiError> {
    let Some(fields) = item.as_object() else {
        return Err(item_error(index, "item", "must be an object"));
    };

    let media_url = fields
        .get("mediaUrl")
        .and_then(Value::as_str)
        .ok_or_else(|| item_error(index, "mediaUrl", "must be a string"))?;

    let media_type: MediaKind = fields
        .get("type")
        .and_then(Value::as_str)
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| item_error(index, "type", "must be 'photo' or 'video'"))?;

    let attached_id = attached_id(fields).ok_or_else(|| {
        item_error(index, "attachedId", "must be an integer or a numeric string")
    })?;

    let parent = fields
        .get("attachedTo")
        .and_then(Value::as_str)
        .and_then(|tag| MediaParent::from_tag(tag, attached_id))
        .ok_or_else(|| {
            item_error(
                index,
                "attachedTo",
                "must be one of school, primary, basic, secondary",
            )
        })?;

    let description = match fields.get("description") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => return Err(item_error(index, "description", "must be a string")),
    };

    Ok(NewMedia {
        media_url: media_url.to_string(),
        description,
        media_type,
        parent,
    })
}

fn attached_id(fields: &Map<String, Value>) -> Option<i64> {
    match fields.get("attachedId")? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Items whose URL does not survive sanitizing are dropped.
fn sanitize_item(item: NewMedia) -> Option<NewMedia> {
    let media_url = sanitize_url(&item.media_url);
    if media_url.is_empty() {
        tracing::debug!("Dropping media item with unusable URL {:?}", item.media_url);
        return None;
    }
    let description = item
        .description
        .map(|d| sanitize_string(&d))
        .filter(|d| !d.is_empty());

    Some(NewMedia {
        media_url,
        description,
        ..item
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_numeric_string_ids() {
        let item = parse_item(
            0,
            &json!({ "mediaUrl": "https://cdn.ge/a.jpg", "type": "photo", "attachedTo": "basic", "attachedId": "17" }),
        )
        .unwrap();
        assert_eq!(item.parent, MediaParent::Basic(17));
        assert_eq!(item.media_type, MediaKind::Photo);
        assert_eq!(item.description, None);
    }

    #[test]
    fn errors_name_the_item_index() {
        let err = parse_item(
            2,
            &json!({ "mediaUrl": "https://cdn.ge/a.jpg", "type": "audio", "attachedTo": "school", "attachedId": 1 }),
        )
        .unwrap_err();
        assert!(err.message().contains("index 2"));
        match err {
            ApiError::ValidationError {
                field_errors: Some(errors),
                ..
            } => assert!(errors.contains_key("[2].type")),
            other => panic!("unexpected {:?}", other),
        }

        assert!(parse_item(0, &json!("https://cdn.ge/a.jpg")).is_err());
        assert!(parse_item(
            0,
            &json!({ "mediaUrl": "x", "type": "video", "attachedTo": "campus", "attachedId": 1 })
        )
        .is_err());
        assert!(parse_item(
            0,
            &json!({ "mediaUrl": "x", "type": "video", "attachedTo": "school", "attachedId": 1.5 })
        )
        .is_err());
    }

    #[test]
    fn sanitizing_drops_unusable_urls() {
        let item = NewMedia {
            media_url: "javascript:alert(1)".into(),
            description: Some("  ".into()),
            media_type: MediaKind::Video,
            parent: MediaParent::School(1),
        };
        assert_eq!(sanitize_item(item), None);

        let item = NewMedia {
            media_url: "  https://cdn.ge/v.mp4 ".into(),
            description: Some(" tour ".into()),
            media_type: MediaKind::Video,
            parent: MediaParent::School(1),
        };
        let clean = sanitize_item(item).unwrap();
        assert_eq!(clean.media_url, "https://cdn.ge/v.mp4");
        assert_eq!(clean.description.as_deref(), Some("tour"));
    }
}

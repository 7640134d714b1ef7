use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

/// JSON body with a status; the payload is serialized as-is, without an envelope.
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub status_code: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self::with_status(data, StatusCode::OK)
    }

    pub fn with_status(data: T, status_code: StatusCode) -> Self {
        Self { data, status_code }
    }

    pub fn created(data: T) -> Self {
        Self::with_status(data, StatusCode::CREATED)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status_code, Json(self.data)).into_response()
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;

/// Page metadata for list endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
    pub total_count: i64,
    pub total_pages: i64,
}

/// Lists answer a bare array unless the client asked for a page.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Listing<T: Serialize> {
    All(Vec<T>),
    Page { data: Vec<T>, pagination: Pagination },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn listing_shapes() {
        let all: Listing<i32> = Listing::All(vec![1, 2]);
        assert_eq!(serde_json::to_value(&all).unwrap(), json!([1, 2]));

        let page = Listing::Page {
            data: vec![3],
            pagination: Pagination {
                page: 2,
                page_size: 1,
                total_count: 3,
                total_pages: 3,
            },
        };
        assert_eq!(
            serde_json::to_value(&page).unwrap(),
            json!({ "data": [3], "pagination": { "page": 2, "pageSize": 1, "totalCount": 3, "totalPages": 3 } })
        );
    }
}

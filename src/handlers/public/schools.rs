use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::config::PaginationConfig;
use crate::database::models::School;
use crate::database::store::{ListQuery, PageRequest};
use crate::error::ApiError;
use crate::handlers::parse_school_id;
use crate::middleware::{ApiResponse, ApiResult, Caller, Listing, Pagination};
use crate::policy;
use crate::state::AppState;

/// Query string of `GET /api/schools`. Kept as raw text so bad numbers
/// produce a field error instead of a generic rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub lightweight: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub search: Option<String>,
}

impl ListParams {
    pub fn is_lightweight(&self) -> bool {
        matches!(self.lightweight.as_deref().map(str::trim), Some("true") | Some("1"))
    }

    /// `None` unless at least one page parameter was sent.
    pub fn page_request(&self, config: &PaginationConfig) -> Result<Option<PageRequest>, ApiError> {
        if self.page.is_none() && self.page_size.is_none() {
            return Ok(None);
        }

        let page = match &self.page {
            Some(raw) => positive("page", raw)?,
            None => 1,
        };
        let page_size = match &self.page_size {
            Some(raw) => positive("pageSize", raw)?,
            None => config.default_page_size,
        };

        Ok(Some(PageRequest {
            page,
            page_size: page_size.min(config.max_page_size),
        }))
    }

    fn into_query(self, caller: &Caller, page: Option<PageRequest>) -> ListQuery {
        let mut query = ListQuery::new(policy::visibility(caller));
        query.city = non_blank(self.city);
        query.district = non_blank(self.district);
        query.search = non_blank(self.search);
        query.page = page;
        query
    }
}

fn positive(field: &str, raw: &str) -> Result<u32, ApiError> {
    match raw.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ApiError::invalid_field(field, "must be a positive integer")),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// GET /api/schools - list schools visible to the caller
pub async fn list(
    State(state): State<AppState>,
    caller: Caller,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = params.map_err(|rejection| {
        tracing::debug!("Rejected list query: {}", rejection.body_text());
        ApiError::bad_request(format!("Invalid query string: {}", rejection.body_text()))
    })?;
    let page = params.page_request(&state.config.pagination)?;
    let lightweight = params.is_lightweight();
    let query = params.into_query(&caller, page);

    tracing::debug!(
        "Listing schools: visibility={:?} lightweight={} page={:?}",
        query.visibility,
        lightweight,
        query.page
    );

    if lightweight {
        let rows = state.schools.list_summaries(&query).await?;
        Ok(listing(&state, &query, rows).await?.into_response())
    } else {
        let rows = state.schools.list(&query).await?;
        Ok(listing(&state, &query, rows).await?.into_response())
    }
}

async fn listing<T: Serialize>(
    state: &AppState,
    query: &ListQuery,
    rows: Vec<T>,
) -> ApiResult<Listing<T>> {
    let Some(page) = query.page else {
        return Ok(ApiResponse::success(Listing::All(rows)));
    };

    let total_count = state.schools.count(query).await?;
    Ok(ApiResponse::success(Listing::Page {
        data: rows,
        pagination: Pagination {
            page: page.page,
            page_size: page.page_size,
            total_count,
            total_pages: page.total_pages(total_count),
        },
    }))
}

/// GET /api/schools/:id - single school with every relation
pub async fn get(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<School> {
    let id = parse_school_id(&id)?;
    let school = state
        .schools
        .find(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("School {} not found", id)))?;

    if !policy::can_read(&caller, school.owner()) {
        return Err(ApiError::forbidden("You can only view schools you created"));
    }
    Ok(ApiResponse::success(school))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PaginationConfig {
        PaginationConfig {
            default_page_size: 20,
            max_page_size: 100,
        }
    }

    fn params(page: Option<&str>, page_size: Option<&str>) -> ListParams {
        ListParams {
            page: page.map(String::from),
            page_size: page_size.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn no_page_params_means_unpaged() {
        assert_eq!(params(None, None).page_request(&config()).unwrap(), None);
    }

    #[test]
    fn page_defaults_and_cap() {
        let page = params(Some("3"), None).page_request(&config()).unwrap().unwrap();
        assert_eq!(page, PageRequest { page: 3, page_size: 20 });

        let page = params(None, Some("500")).page_request(&config()).unwrap().unwrap();
        assert_eq!(page, PageRequest { page: 1, page_size: 100 });
    }

    #[test]
    fn bad_page_values_name_the_field() {
        for (page, size, field) in [
            (Some("0"), None, "page"),
            (Some("-1"), None, "page"),
            (Some("two"), None, "page"),
            (None, Some("0"), "pageSize"),
            (None, Some("ten"), "pageSize"),
        ] {
            match params(page, size).page_request(&config()) {
                Err(ApiError::ValidationError {
                    field_errors: Some(errors),
                    ..
                }) => assert!(errors.contains_key(field), "expected error on {}", field),
                other => panic!("expected validation error, got {:?}", other),
            }
        }
    }

    #[test]
    fn lightweight_flag_accepts_true_and_one() {
        let mut p = ListParams::default();
        assert!(!p.is_lightweight());
        p.lightweight = Some("1".into());
        assert!(p.is_lightweight());
        p.lightweight = Some("true".into());
        assert!(p.is_lightweight());
        p.lightweight = Some("yes".into());
        assert!(!p.is_lightweight());
    }
}

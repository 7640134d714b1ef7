//! Storage seams consumed by the HTTP handlers.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::database::manager::DatabaseError;
use crate::database::models::{MediaItem, NewMedia, School, SchoolSummary, UserRole};
use crate::filter::FilterData;
use crate::policy::Visibility;
use crate::types::{Role, UserId};
use crate::validation::schema::{SchoolPayload, SchoolUpdate};

/// 1-based page with a size already capped by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn offset(&self) -> u64 {
        (self.page.saturating_sub(1) as u64) * self.page_size as u64
    }

    pub fn total_pages(&self, total_count: i64) -> i64 {
        if self.page_size == 0 {
            return 0;
        }
        let size = self.page_size as i64;
        (total_count.max(0) + size - 1) / size
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub visibility: Visibility,
    pub city: Option<String>,
    pub district: Option<String>,
    /// Case-insensitive substring of the school name.
    pub search: Option<String>,
    pub page: Option<PageRequest>,
}

impl ListQuery {
    pub fn new(visibility: Visibility) -> Self {
        Self {
            visibility,
            city: None,
            district: None,
            search: None,
            page: None,
        }
    }

    /// Visibility AND the supplemental filters, newest first.
    pub fn to_filter_data(&self) -> FilterData {
        let mut clauses = vec![self.visibility.to_filter()];
        if let Some(city) = &self.city {
            clauses.push(json!({ "addresses.city": city }));
        }
        if let Some(district) = &self.district {
            clauses.push(json!({ "addresses.district": district }));
        }
        if let Some(search) = &self.search {
            clauses.push(json!({ "name": { "$ilike": format!("%{}%", escape_like(search)) } }));
        }

        FilterData {
            where_clause: Some(json!({ "$and": clauses })),
            order: Some(Value::String("created_at desc, id desc".to_string())),
            limit: self.page.map(|p| p.page_size as i32),
            offset: self.page.map(|p| p.offset().min(i32::MAX as u64) as i32),
            ..Default::default()
        }
    }

    pub fn matches(&self, school: &School) -> bool {
        fn same(actual: &Option<String>, wanted: &Option<String>) -> bool {
            match wanted {
                None => true,
                Some(w) => actual.as_deref() == Some(w.as_str()),
            }
        }

        self.visibility.admits(school.owner())
            && same(&school.address.city, &self.city)
            && same(&school.address.district, &self.district)
            && self.search.as_ref().map_or(true, |s| {
                school.record.name.to_lowercase().contains(&s.to_lowercase())
            })
    }
}

fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[async_trait]
pub trait SchoolStore: Send + Sync {
    async fn health_check(&self) -> Result<(), DatabaseError>;

    async fn list(&self, query: &ListQuery) -> Result<Vec<School>, DatabaseError>;

    async fn list_summaries(&self, query: &ListQuery) -> Result<Vec<SchoolSummary>, DatabaseError>;

    /// Total rows matching `query`, ignoring its page.
    async fn count(&self, query: &ListQuery) -> Result<i64, DatabaseError>;

    async fn find(&self, id: i64) -> Result<Option<School>, DatabaseError>;

    async fn owner_of(&self, id: i64) -> Result<Option<UserId>, DatabaseError>;

    /// School, its four children and inline level photos, atomically.
    async fn create(&self, payload: &SchoolPayload, owner: &str) -> Result<School, DatabaseError>;

    async fn update(
        &self,
        id: i64,
        changes: &SchoolUpdate,
        editor: &str,
    ) -> Result<School, DatabaseError>;

    /// Removes the school and everything it owns; returns the prior state.
    async fn delete(&self, id: i64) -> Result<School, DatabaseError>;
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    /// All or nothing. A missing parent is [`DatabaseError::Integrity`].
    async fn insert_many(&self, items: &[NewMedia]) -> Result<Vec<MediaItem>, DatabaseError>;
}

#[async_trait]
pub trait RoleStore: Send + Sync {
    async fn role_of(&self, user_id: &str) -> Result<Option<Role>, DatabaseError>;

    async fn assign(&self, user_id: &str, email: &str, role: Role) -> Result<UserRole, DatabaseError>;
}

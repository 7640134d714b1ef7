use serde_json::json;
use sqlx::{self, postgres::PgRow, FromRow, PgPool};

use crate::database::manager::DatabaseError;
use crate::database::query_builder::QueryBuilder;
use crate::filter::FilterData;

/// Filtered reads over one table, optionally joined to 1:1 child tables.
pub struct Repository<T> {
    table_name: &'static str,
    joins: Vec<(&'static str, &'static str)>,
    max_limit: Option<i32>,
    pool: PgPool,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Repository<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    pub fn new(table_name: &'static str, pool: PgPool) -> Self {
        Self {
            table_name,
            joins: vec![],
            max_limit: None,
            pool,
            _phantom: std::marker::PhantomData,
        }
    }

    pub fn with_join(mut self, table: &'static str, foreign_key: &'static str) -> Self {
        self.joins.push((table, foreign_key));
        self
    }

    pub fn with_max_limit(mut self, max: i32) -> Self {
        self.max_limit = Some(max);
        self
    }

    fn query(&self) -> Result<QueryBuilder<T>, DatabaseError> {
        let mut builder = QueryBuilder::<T>::new(self.table_name)?.max_limit(self.max_limit);
        for (table, fk) in &self.joins {
            builder = builder.join(table, fk)?;
        }
        Ok(builder)
    }

    pub async fn select_any(&self, filter_data: FilterData) -> Result<Vec<T>, DatabaseError> {
        self.query()?.filter(filter_data)?.select_all(&self.pool).await
    }

    pub async fn select_one(&self, filter_data: FilterData) -> Result<Option<T>, DatabaseError> {
        self.query()?
            .filter(FilterData {
                limit: Some(1),
                ..filter_data
            })?
            .select_optional(&self.pool)
            .await
    }

    pub async fn count(&self, filter_data: FilterData) -> Result<i64, DatabaseError> {
        self.query()?
            .filter(FilterData {
                order: None,
                limit: None,
                offset: None,
                ..filter_data
            })?
            .count(&self.pool)
            .await
    }

    /// Rows whose `column` is one of `ids`, in unspecified order.
    pub async fn select_in(&self, column: &str, ids: &[i64]) -> Result<Vec<T>, DatabaseError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        self.select_any(FilterData::matching(json!({ column: { "$in": ids } })))
            .await
    }
}

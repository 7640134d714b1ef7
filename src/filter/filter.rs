use serde_json::Value;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{FilterData, FilterJoin, FilterOrderInfo, SqlResult};
use super::{is_identifier, quote_column, validate_column};

pub struct Filter {
    table_name: String,
    joins: Vec<FilterJoin>,
    select_columns: Vec<String>,
    where_data: Option<Value>,
    order_data: Vec<FilterOrderInfo>,
    limit: Option<i32>,
    offset: Option<i32>,
    max_limit: Option<i32>,
}

impl Filter {
    pub fn new(table_name: impl Into<String>) -> Result<Self, FilterError> {
        let table_name = table_name.into();
        Self::validate_table_name(&table_name)?;
        Ok(Self {
            table_name,
            joins: vec![],
            select_columns: vec![],
            where_data: None,
            order_data: vec![],
            limit: None,
            offset: None,
            max_limit: None,
        })
    }

    /// Limits above `max` are silently capped.
    pub fn with_max_limit(mut self, max: Option<i32>) -> Self {
        self.max_limit = max;
        self
    }

    /// LEFT JOIN a child table on `<table>.<foreign_key> = <base>.id` so its
    /// columns can be filtered as `"<table>.<column>"`.
    pub fn join(&mut self, table: &str, foreign_key: &str) -> Result<&mut Self, FilterError> {
        Self::validate_table_name(table)?;
        if !is_identifier(foreign_key) {
            return Err(FilterError::InvalidColumn(foreign_key.to_string()));
        }
        self.joins.push(FilterJoin {
            table: table.to_string(),
            foreign_key: foreign_key.to_string(),
        });
        Ok(self)
    }

    pub fn assign(&mut self, data: FilterData) -> Result<&mut Self, FilterError> {
        if let Some(select) = data.select {
            self.select(select)?;
        }
        if let Some(where_clause) = data.where_clause {
            self.where_clause(where_clause)?;
        }
        if let Some(order) = data.order {
            self.order(order)?;
        }
        match (data.limit, data.offset) {
            (Some(limit), offset) => {
                self.limit(limit, offset)?;
            }
            (None, Some(offset)) => {
                self.offset(offset)?;
            }
            (None, None) => {}
        }
        Ok(self)
    }

    pub fn select(&mut self, columns: Vec<String>) -> Result<&mut Self, FilterError> {
        for column in columns.iter().filter(|c| c.as_str() != "*") {
            validate_column(column)?;
        }
        self.select_columns = columns;
        Ok(self)
    }

    pub fn where_clause(&mut self, conditions: Value) -> Result<&mut Self, FilterError> {
        FilterWhere::validate(&conditions)?;
        self.where_data = Some(conditions);
        Ok(self)
    }

    pub fn order(&mut self, order_spec: Value) -> Result<&mut Self, FilterError> {
        self.order_data = FilterOrder::validate_and_parse(&order_spec)?;
        Ok(self)
    }

    pub fn limit(&mut self, limit: i32, offset: Option<i32>) -> Result<&mut Self, FilterError> {
        if limit < 0 {
            return Err(FilterError::InvalidLimit("Limit must be non-negative".to_string()));
        }
        let max_limit = self.max_limit.unwrap_or(i32::MAX);
        if limit > max_limit {
            tracing::debug!("Limit {} exceeds max {}, capping to max", limit, max_limit);
        }
        self.limit = Some(limit.min(max_limit));
        if let Some(off) = offset {
            self.offset(off)?;
        }
        Ok(self)
    }

    pub fn offset(&mut self, offset: i32) -> Result<&mut Self, FilterError> {
        if offset < 0 {
            return Err(FilterError::InvalidOffset("Offset must be non-negative".to_string()));
        }
        self.offset = Some(offset);
        Ok(self)
    }

    pub fn to_sql(&self) -> Result<SqlResult, FilterError> {
        let where_result = self.to_where_sql()?;
        let query = [
            format!("SELECT {}", self.build_select_clause()),
            self.build_from_clause(),
            format!("WHERE {}", where_result.query),
            FilterOrder::generate(&self.order_data, &self.table_name),
            self.build_limit_clause(),
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        Ok(SqlResult {
            query,
            params: where_result.params,
        })
    }

    pub fn to_where_sql(&self) -> Result<SqlResult, FilterError> {
        let (query, params) = match &self.where_data {
            Some(where_data) => FilterWhere::generate(where_data, &self.table_name, 0)?,
            None => ("1=1".to_string(), vec![]),
        };
        Ok(SqlResult { query, params })
    }

    pub fn to_count_sql(&self) -> Result<SqlResult, FilterError> {
        let where_result = self.to_where_sql()?;
        Ok(SqlResult {
            query: format!(
                "SELECT COUNT(*) AS count {} WHERE {}",
                self.build_from_clause(),
                where_result.query
            ),
            params: where_result.params,
        })
    }

    fn validate_table_name(name: &str) -> Result<(), FilterError> {
        if is_identifier(name) {
            Ok(())
        } else {
            Err(FilterError::InvalidTableName(format!(
                "Invalid table name format: {}",
                name
            )))
        }
    }

    fn build_select_clause(&self) -> String {
        if self.select_columns.is_empty() || self.select_columns.iter().any(|c| c == "*") {
            format!("\"{}\".*", self.table_name)
        } else {
            self.select_columns
                .iter()
                .map(|c| quote_column(c, &self.table_name))
                .collect::<Vec<_>>()
                .join(", ")
        }
    }

    fn build_from_clause(&self) -> String {
        let mut from = format!("FROM \"{}\"", self.table_name);
        for join in &self.joins {
            from.push_str(&format!(
                " LEFT JOIN \"{t}\" ON \"{t}\".\"{fk}\" = \"{base}\".\"id\"",
                t = join.table,
                fk = join.foreign_key,
                base = self.table_name
            ));
        }
        from
    }

    fn build_limit_clause(&self) -> String {
        match (self.limit, self.offset) {
            (Some(l), Some(o)) => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), None) => format!("LIMIT {}", l),
            (None, Some(o)) => format!("OFFSET {}", o),
            (None, None) => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builds_joined_paged_query() {
        let mut filter = Filter::new("schools").unwrap().with_max_limit(Some(50));
        filter.join("addresses", "school_id").unwrap();
        filter
            .assign(FilterData {
                where_clause: Some(json!({ "addresses.city": "Batumi" })),
                order: Some(json!("created_at desc, id desc")),
                limit: Some(500),
                offset: Some(100),
                ..Default::default()
            })
            .unwrap();

        let sql = filter.to_sql().unwrap();
        assert_eq!(
            sql.query,
            "SELECT \"schools\".* FROM \"schools\" \
             LEFT JOIN \"addresses\" ON \"addresses\".\"school_id\" = \"schools\".\"id\" \
             WHERE \"addresses\".\"city\" = $1 \
             ORDER BY \"schools\".\"created_at\" DESC, \"schools\".\"id\" DESC \
             LIMIT 50 OFFSET 100"
        );
        assert_eq!(sql.params, vec![json!("Batumi")]);

        let count = filter.to_count_sql().unwrap();
        assert!(count.query.starts_with("SELECT COUNT(*) AS count FROM \"schools\" LEFT JOIN"));
        assert_eq!(count.params.len(), 1);
    }

    #[test]
    fn rejects_bad_names_and_negative_paging() {
        assert!(Filter::new("schools; drop").is_err());
        let mut filter = Filter::new("schools").unwrap();
        assert!(filter.limit(-1, None).is_err());
        assert!(filter.limit(10, Some(-5)).is_err());
        assert!(filter.select(vec!["name\"".into()]).is_err());
    }
}

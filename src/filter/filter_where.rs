use serde_json::Value;

use super::error::FilterError;
use super::types::{FilterOp, FilterWhereInfo};
use super::{quote_column, validate_column};

pub struct FilterWhere<'a> {
    table: &'a str,
    param_values: Vec<Value>,
    param_index: usize,
}

impl<'a> FilterWhere<'a> {
    pub fn new(table: &'a str, starting_param_index: usize) -> Self {
        Self {
            table,
            param_values: vec![],
            param_index: starting_param_index,
        }
    }

    /// Render `where_data` to a boolean SQL expression. Placeholders start at
    /// `$<starting_param_index + 1>`.
    pub fn generate(
        where_data: &Value,
        table: &str,
        starting_param_index: usize,
    ) -> Result<(String, Vec<Value>), FilterError> {
        let mut filter_where = FilterWhere::new(table, starting_param_index);
        let sql = filter_where.build(where_data)?;
        Ok((sql, filter_where.param_values))
    }

    pub fn validate(where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Null | Value::Object(_) => Ok(()),
            _ => Err(FilterError::InvalidWhereClause("WHERE must be an object".to_string())),
        }
    }

    fn build(&mut self, where_data: &Value) -> Result<String, FilterError> {
        let obj = match where_data {
            Value::Null => return Ok("1=1".to_string()),
            Value::Object(obj) => obj,
            _ => return Err(FilterError::InvalidWhereClause("Unsupported WHERE format".to_string())),
        };

        let mut sql_conditions = vec![];
        for (key, value) in obj {
            if key.starts_with('$') {
                sql_conditions.push(self.build_logical(key, value)?);
            } else {
                for condition in Self::parse_field_condition(key, value)? {
                    sql_conditions.push(self.build_sql_condition(&condition)?);
                }
            }
        }

        Ok(if sql_conditions.is_empty() {
            "1=1".to_string()
        } else {
            sql_conditions.join(" AND ")
        })
    }

    fn build_logical(&mut self, op: &str, value: &Value) -> Result<String, FilterError> {
        match op {
            "$and" | "$or" => {
                let arr = value
                    .as_array()
                    .ok_or_else(|| FilterError::InvalidOperatorData(format!("{} requires array", op)))?;
                if arr.is_empty() {
                    return Ok(if op == "$and" { "1=1" } else { "1=0" }.to_string());
                }
                let mut sql_parts = Vec::with_capacity(arr.len());
                for v in arr {
                    sql_parts.push(format!("({})", self.build(v)?));
                }
                let joiner = if op == "$and" { " AND " } else { " OR " };
                Ok(format!("({})", sql_parts.join(joiner)))
            }
            "$not" => Ok(format!("NOT ({})", self.build(value)?)),
            _ => Err(FilterError::UnsupportedOperator(op.to_string())),
        }
    }

    fn parse_field_condition(field: &str, value: &Value) -> Result<Vec<FilterWhereInfo>, FilterError> {
        validate_column(field)?;
        match value {
            Value::Object(obj) if obj.keys().any(|k| k.starts_with('$')) => obj
                .iter()
                .map(|(op_key, op_val)| {
                    let operator = FilterOp::parse(op_key)
                        .ok_or_else(|| FilterError::UnsupportedOperator(op_key.clone()))?;
                    Ok(FilterWhereInfo {
                        column: field.to_string(),
                        operator,
                        data: op_val.clone(),
                    })
                })
                .collect(),
            // Implicit equality: { field: value }
            _ => Ok(vec![FilterWhereInfo {
                column: field.to_string(),
                operator: FilterOp::Eq,
                data: value.clone(),
            }]),
        }
    }

    fn build_sql_condition(&mut self, condition: &FilterWhereInfo) -> Result<String, FilterError> {
        let column = quote_column(&condition.column, self.table);
        let data = &condition.data;
        Ok(match condition.operator {
            FilterOp::Eq if data.is_null() => format!("{} IS NULL", column),
            FilterOp::Eq => format!("{} = {}", column, self.param(data.clone())),
            FilterOp::Ne if data.is_null() => format!("{} IS NOT NULL", column),
            FilterOp::Ne => format!("{} <> {}", column, self.param(data.clone())),
            FilterOp::Gt => format!("{} > {}", column, self.param(data.clone())),
            FilterOp::Gte => format!("{} >= {}", column, self.param(data.clone())),
            FilterOp::Lt => format!("{} < {}", column, self.param(data.clone())),
            FilterOp::Lte => format!("{} <= {}", column, self.param(data.clone())),
            FilterOp::Like => format!("{} LIKE {}", column, self.param(data.clone())),
            FilterOp::ILike => format!("{} ILIKE {}", column, self.param(data.clone())),
            FilterOp::In | FilterOp::NIn => {
                let negate = condition.operator == FilterOp::NIn;
                match data {
                    Value::Array(values) if values.is_empty() => {
                        if negate { "1=1" } else { "1=0" }.to_string()
                    }
                    Value::Array(values) => {
                        let params: Vec<String> = values.iter().map(|v| self.param(v.clone())).collect();
                        let keyword = if negate { "NOT IN" } else { "IN" };
                        format!("{} {} ({})", column, keyword, params.join(", "))
                    }
                    other => {
                        let op = if negate { "<>" } else { "=" };
                        format!("{} {} {}", column, op, self.param(other.clone()))
                    }
                }
            }
            FilterOp::Between => match data {
                Value::Array(values) if values.len() == 2 => format!(
                    "{} BETWEEN {} AND {}",
                    column,
                    self.param(values[0].clone()),
                    self.param(values[1].clone())
                ),
                _ => {
                    return Err(FilterError::InvalidOperatorData(
                        "$between requires array with 2 values".to_string(),
                    ))
                }
            },
        })
    }

    fn param(&mut self, value: Value) -> String {
        if let Value::Array(_) | Value::Object(_) = value {
            // Bound as JSONB; comparisons against scalar columns will fail loudly in Postgres.
            tracing::debug!("binding structured filter value as JSON");
        }
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn implicit_equality_and_null() {
        let (sql, params) =
            FilterWhere::generate(&json!({ "created_by": "u1", "email": null }), "schools", 0).unwrap();
        assert_eq!(
            sql,
            "\"schools\".\"created_by\" = $1 AND \"schools\".\"email\" IS NULL"
        );
        assert_eq!(params, vec![json!("u1")]);
    }

    #[test]
    fn nested_logical_operators_number_params_sequentially() {
        let where_data = json!({
            "$and": [
                { "created_by": "u1" },
                { "$or": [ { "addresses.city": "Tbilisi" }, { "name": { "$ilike": "%school%" } } ] }
            ]
        });
        let (sql, params) = FilterWhere::generate(&where_data, "schools", 0).unwrap();
        assert_eq!(
            sql,
            "((\"schools\".\"created_by\" = $1) AND (((\"addresses\".\"city\" = $2) OR (\"schools\".\"name\" ILIKE $3))))"
        );
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn in_between_and_not() {
        let (sql, params) = FilterWhere::generate(
            &json!({ "id": { "$in": [1, 2] }, "$not": { "founded_year": { "$between": [1990, 2000] } } }),
            "schools",
            2,
        )
        .unwrap();
        assert!(sql.contains("\"schools\".\"id\" IN ($"), "{}", sql);
        assert!(sql.contains("NOT (\"schools\".\"founded_year\" BETWEEN $"), "{}", sql);
        for placeholder in ["$3", "$4", "$5", "$6"] {
            assert!(sql.contains(placeholder), "{} missing {}", sql, placeholder);
        }
        assert_eq!(params.len(), 4);
    }

    #[test]
    fn empty_in_matches_nothing() {
        let (sql, params) = FilterWhere::generate(&json!({ "id": { "$in": [] } }), "schools", 0).unwrap();
        assert_eq!(sql, "1=0");
        assert!(params.is_empty());
    }

    #[test]
    fn rejects_bad_columns_and_operators() {
        assert!(matches!(
            FilterWhere::generate(&json!({ "name; DROP": 1 }), "schools", 0),
            Err(FilterError::InvalidColumn(_))
        ));
        assert!(matches!(
            FilterWhere::generate(&json!({ "name": { "$regex": ".*" } }), "schools", 0),
            Err(FilterError::UnsupportedOperator(_))
        ));
        assert!(FilterWhere::validate(&json!("raw sql")).is_err());
    }
}

//! JSON filter language rendered to parameterized PostgreSQL.
//!
//! ```json
//! { "where": { "$and": [ { "created_by": "u1" }, { "name": { "$ilike": "%lyceum%" } } ] },
//!   "order": "created_at desc, id desc", "limit": 20, "offset": 40 }
//! ```

pub mod error;
pub mod filter;
pub mod filter_order;
pub mod filter_where;
pub mod types;

pub use error::FilterError;
pub use filter::Filter;
pub use types::*;

/// `"addresses.city"` -> `"addresses"."city"`, `"name"` -> `"<table>"."name"`.
pub(crate) fn quote_column(column: &str, table: &str) -> String {
    match column.split_once('.') {
        Some((t, c)) => format!("\"{}\".\"{}\"", t, c),
        None => format!("\"{}\".\"{}\"", table, column),
    }
}

pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// A plain or one-level qualified identifier.
pub(crate) fn validate_column(column: &str) -> Result<(), FilterError> {
    let ok = match column.split_once('.') {
        Some((t, c)) => is_identifier(t) && is_identifier(c),
        None => is_identifier(column),
    };
    if ok {
        Ok(())
    } else {
        Err(FilterError::InvalidColumn(format!(
            "Invalid column name format: {}",
            column
        )))
    }
}

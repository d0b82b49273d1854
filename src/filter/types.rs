use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

/// Typed SQL bind parameter. Keeps the query builder independent of sqlx
/// while still binding values (and typed NULLs) with their native Postgres
/// types.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Bool(Option<bool>),
    Int(Option<i64>),
    Float(Option<f64>),
    Text(Option<String>),
    Uuid(Option<Uuid>),
    Timestamp(Option<DateTime<Utc>>),
    Json(Option<Value>),
}

impl SqlParam {
    pub fn is_null(&self) -> bool {
        match self {
            SqlParam::Bool(v) => v.is_none(),
            SqlParam::Int(v) => v.is_none(),
            SqlParam::Float(v) => v.is_none(),
            SqlParam::Text(v) => v.is_none(),
            SqlParam::Uuid(v) => v.is_none(),
            SqlParam::Timestamp(v) => v.is_none(),
            SqlParam::Json(v) => v.is_none(),
        }
    }

    pub fn text(v: impl Into<String>) -> Self {
        SqlParam::Text(Some(v.into()))
    }
}

impl From<bool> for SqlParam {
    fn from(v: bool) -> Self {
        SqlParam::Bool(Some(v))
    }
}

impl From<i32> for SqlParam {
    fn from(v: i32) -> Self {
        SqlParam::Int(Some(v as i64))
    }
}

impl From<i64> for SqlParam {
    fn from(v: i64) -> Self {
        SqlParam::Int(Some(v))
    }
}

impl From<f64> for SqlParam {
    fn from(v: f64) -> Self {
        SqlParam::Float(Some(v))
    }
}

impl From<&str> for SqlParam {
    fn from(v: &str) -> Self {
        SqlParam::Text(Some(v.to_string()))
    }
}

impl From<String> for SqlParam {
    fn from(v: String) -> Self {
        SqlParam::Text(Some(v))
    }
}

impl From<Uuid> for SqlParam {
    fn from(v: Uuid) -> Self {
        SqlParam::Uuid(Some(v))
    }
}

impl From<DateTime<Utc>> for SqlParam {
    fn from(v: DateTime<Utc>) -> Self {
        SqlParam::Timestamp(Some(v))
    }
}

impl From<Value> for SqlParam {
    fn from(v: Value) -> Self {
        SqlParam::Json(Some(v))
    }
}

impl From<Option<bool>> for SqlParam {
    fn from(v: Option<bool>) -> Self {
        SqlParam::Bool(v)
    }
}

impl From<Option<i32>> for SqlParam {
    fn from(v: Option<i32>) -> Self {
        SqlParam::Int(v.map(|i| i as i64))
    }
}

impl From<Option<i64>> for SqlParam {
    fn from(v: Option<i64>) -> Self {
        SqlParam::Int(v)
    }
}

impl From<Option<f64>> for SqlParam {
    fn from(v: Option<f64>) -> Self {
        SqlParam::Float(v)
    }
}

impl From<Option<String>> for SqlParam {
    fn from(v: Option<String>) -> Self {
        SqlParam::Text(v)
    }
}

impl From<Option<Uuid>> for SqlParam {
    fn from(v: Option<Uuid>) -> Self {
        SqlParam::Uuid(v)
    }
}

impl From<Option<DateTime<Utc>>> for SqlParam {
    fn from(v: Option<DateTime<Utc>>) -> Self {
        SqlParam::Timestamp(v)
    }
}

/// Per-field filter descriptor. Text fields use case-insensitive substring
/// match, key/enum fields use exact equality, numeric fields may use an
/// inclusive range.
#[derive(Debug, Clone)]
pub enum FieldFilter {
    Contains(String),
    Equals(SqlParam),
    Range {
        min: Option<SqlParam>,
        max: Option<SqlParam>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("asc") {
            Some(SortDirection::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Some(SortDirection::Desc)
        } else {
            None
        }
    }
}

/// A generated SQL statement with its positional bind parameters.
#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<SqlParam>,
}

use super::error::FilterError;
use super::page::PageParams;
use super::types::{FieldFilter, SortDirection, SqlParam, SqlResult};

/// Builds one parameterized read query from a set of typed field filters, a
/// validated sort and paging bounds.
///
/// Resources supply a SELECT base (with any join expansion inlined) and the
/// builder appends WHERE / ORDER BY / LIMIT OFFSET. The same predicate set,
/// without pagination, drives the exact count query.
#[derive(Debug, Default)]
pub struct QueryBuilder {
    conditions: Vec<Cond>,
    order: Option<(String, SortDirection)>,
    limit: Option<i64>,
    offset: Option<i64>,
}

#[derive(Debug)]
enum Cond {
    Field { column: String, filter: FieldFilter },
    /// Raw predicate template with `$?` markers for its parameters. Used for
    /// membership subqueries that a flat (column, filter) pair cannot express.
    Raw { template: String, params: Vec<SqlParam> },
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, column: &str, filter: FieldFilter) -> Result<&mut Self, FilterError> {
        validate_column(column)?;
        self.conditions.push(Cond::Field {
            column: column.to_string(),
            filter,
        });
        Ok(self)
    }

    /// Exact equality on a column.
    pub fn equals(
        &mut self,
        column: &str,
        value: impl Into<SqlParam>,
    ) -> Result<&mut Self, FilterError> {
        self.push(column, FieldFilter::Equals(value.into()))
    }

    /// Exact equality, omitted entirely when the value is absent.
    pub fn equals_opt<T: Into<SqlParam>>(
        &mut self,
        column: &str,
        value: Option<T>,
    ) -> Result<&mut Self, FilterError> {
        match value {
            Some(v) => self.push(column, FieldFilter::Equals(v.into())),
            None => Ok(self),
        }
    }

    /// Exact equality on a text column; absent and empty values are dropped
    /// from the predicate set rather than matching nothing.
    pub fn equals_text_opt(
        &mut self,
        column: &str,
        value: Option<&str>,
    ) -> Result<&mut Self, FilterError> {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => self.push(column, FieldFilter::Equals(v.into())),
            _ => Ok(self),
        }
    }

    /// Case-insensitive substring match; absent and empty values are dropped.
    pub fn contains_opt(
        &mut self,
        column: &str,
        value: Option<&str>,
    ) -> Result<&mut Self, FilterError> {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => self.push(column, FieldFilter::Contains(v.to_string())),
            _ => Ok(self),
        }
    }

    /// Inclusive range on a column; a fully unbounded range is dropped.
    pub fn range_opt<T: Into<SqlParam>>(
        &mut self,
        column: &str,
        min: Option<T>,
        max: Option<T>,
    ) -> Result<&mut Self, FilterError> {
        if min.is_none() && max.is_none() {
            return Ok(self);
        }
        self.push(
            column,
            FieldFilter::Range {
                min: min.map(Into::into),
                max: max.map(Into::into),
            },
        )
    }

    /// Raw predicate with `$?` placeholders, one per element of `params`.
    pub fn raw(&mut self, template: &str, params: Vec<SqlParam>) -> &mut Self {
        self.conditions.push(Cond::Raw {
            template: template.to_string(),
            params,
        });
        self
    }

    /// Apply a caller-supplied sort key against an allowlist of
    /// (public name, column) pairs, falling back to the resource default.
    pub fn sort(
        &mut self,
        key: Option<&str>,
        dir: Option<&str>,
        allowed: &[(&str, &str)],
        default: (&str, SortDirection),
    ) -> Result<&mut Self, FilterError> {
        let parsed_dir = match dir.map(str::trim) {
            Some(d) if !d.is_empty() => Some(
                SortDirection::parse(d).ok_or_else(|| FilterError::InvalidSortDirection(d.to_string()))?,
            ),
            _ => None,
        };

        match key.map(str::trim) {
            Some(k) if !k.is_empty() => {
                let column = allowed
                    .iter()
                    .find(|(name, _)| *name == k)
                    .map(|(_, column)| *column)
                    .ok_or_else(|| FilterError::InvalidSortKey(k.to_string()))?;
                self.order = Some((column.to_string(), parsed_dir.unwrap_or(SortDirection::Asc)));
            }
            _ => {
                self.order = Some((
                    default.0.to_string(),
                    parsed_dir.unwrap_or(default.1),
                ));
            }
        }
        Ok(self)
    }

    pub fn paginate(&mut self, page: &PageParams) -> &mut Self {
        self.limit = Some(page.limit());
        self.offset = Some(page.offset());
        self
    }

    /// Full page query: SELECT base + WHERE + ORDER BY + LIMIT OFFSET.
    pub fn to_select_sql(&self, select_base: &str) -> SqlResult {
        let (where_clause, params) = self.build_where();

        let mut parts = vec![select_base.to_string()];
        if !where_clause.is_empty() {
            parts.push(format!("WHERE {}", where_clause));
        }
        if let Some((column, dir)) = &self.order {
            parts.push(format!("ORDER BY {} {}", quote_column(column), dir.to_sql()));
        }
        match (self.limit, self.offset) {
            (Some(l), Some(o)) => parts.push(format!("LIMIT {} OFFSET {}", l, o)),
            (Some(l), None) => parts.push(format!("LIMIT {}", l)),
            _ => {}
        }

        SqlResult {
            query: parts.join(" "),
            params,
        }
    }

    /// Exact count over the same predicate set, without pagination.
    pub fn to_count_sql(&self, from: &str) -> SqlResult {
        let (where_clause, params) = self.build_where();
        let query = if where_clause.is_empty() {
            format!("SELECT COUNT(*) AS count FROM {}", from)
        } else {
            format!("SELECT COUNT(*) AS count FROM {} WHERE {}", from, where_clause)
        };
        SqlResult { query, params }
    }

    fn build_where(&self) -> (String, Vec<SqlParam>) {
        let mut clauses = Vec::new();
        let mut params: Vec<SqlParam> = Vec::new();

        for cond in &self.conditions {
            match cond {
                Cond::Field { column, filter } => {
                    let quoted = quote_column(column);
                    match filter {
                        FieldFilter::Contains(needle) => {
                            params.push(SqlParam::text(format!("%{}%", needle)));
                            clauses.push(format!("{} ILIKE ${}", quoted, params.len()));
                        }
                        FieldFilter::Equals(value) if value.is_null() => {
                            clauses.push(format!("{} IS NULL", quoted));
                        }
                        FieldFilter::Equals(value) => {
                            params.push(value.clone());
                            clauses.push(format!("{} = ${}", quoted, params.len()));
                        }
                        FieldFilter::Range { min, max } => {
                            if let Some(v) = min {
                                params.push(v.clone());
                                clauses.push(format!("{} >= ${}", quoted, params.len()));
                            }
                            if let Some(v) = max {
                                params.push(v.clone());
                                clauses.push(format!("{} <= ${}", quoted, params.len()));
                            }
                        }
                    }
                }
                Cond::Raw {
                    template,
                    params: raw_params,
                } => {
                    let mut clause = template.clone();
                    for p in raw_params {
                        params.push(p.clone());
                        clause = clause.replacen("$?", &format!("${}", params.len()), 1);
                    }
                    clauses.push(clause);
                }
            }
        }

        (clauses.join(" AND "), params)
    }
}

/// Quote a column reference, allowing a single unquoted table alias prefix
/// such as `c.nom`.
fn quote_column(column: &str) -> String {
    match column.split_once('.') {
        Some((alias, name)) => format!("{}.\"{}\"", alias, name),
        None => format!("\"{}\"", column),
    }
}

pub fn validate_column(column: &str) -> Result<(), FilterError> {
    let valid = |s: &str| {
        !s.is_empty()
            && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
            && !s.chars().next().unwrap().is_ascii_digit()
    };
    let ok = match column.split_once('.') {
        Some((alias, name)) => valid(alias) && valid(name),
        None => valid(column),
    };
    if ok {
        Ok(())
    } else {
        Err(FilterError::InvalidColumn(column.to_string()))
    }
}

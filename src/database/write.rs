use uuid::Uuid;

use crate::filter::builder::validate_column;
use crate::filter::{FilterError, SqlParam, SqlResult};

/// Builds a partial UPDATE statement that only touches the columns that were
/// actually supplied.
#[derive(Debug)]
pub struct UpdateBuilder {
    table: String,
    sets: Vec<(String, Setter)>,
}

#[derive(Debug)]
enum Setter {
    Param(SqlParam),
    Raw(&'static str),
}

impl UpdateBuilder {
    pub fn new(table: &str) -> Result<Self, FilterError> {
        validate_column(table)?;
        Ok(Self {
            table: table.to_string(),
            sets: Vec::new(),
        })
    }

    pub fn set(
        &mut self,
        column: &str,
        value: impl Into<SqlParam>,
    ) -> Result<&mut Self, FilterError> {
        validate_column(column)?;
        self.sets.push((column.to_string(), Setter::Param(value.into())));
        Ok(self)
    }

    /// Sets the column only when a value was supplied; absent fields stay
    /// untouched.
    pub fn set_opt<T: Into<SqlParam>>(
        &mut self,
        column: &str,
        value: Option<T>,
    ) -> Result<&mut Self, FilterError> {
        match value {
            Some(v) => self.set(column, v),
            None => Ok(self),
        }
    }

    /// Sets the column to a server-side SQL expression such as `now()`.
    pub fn set_raw(&mut self, column: &str, expr: &'static str) -> Result<&mut Self, FilterError> {
        validate_column(column)?;
        self.sets.push((column.to_string(), Setter::Raw(expr)));
        Ok(self)
    }

    /// True when no caller-supplied column has been set (raw stamps aside).
    pub fn has_changes(&self) -> bool {
        self.sets.iter().any(|(_, s)| matches!(s, Setter::Param(_)))
    }

    pub fn by_id(&self, id: Uuid, returning: &str) -> SqlResult {
        let mut params: Vec<SqlParam> = Vec::new();
        let assignments: Vec<String> = self
            .sets
            .iter()
            .map(|(column, setter)| match setter {
                Setter::Param(value) => {
                    params.push(value.clone());
                    format!("\"{}\" = ${}", column, params.len())
                }
                Setter::Raw(expr) => format!("\"{}\" = {}", column, expr),
            })
            .collect();

        params.push(SqlParam::Uuid(Some(id)));
        let query = format!(
            "UPDATE \"{}\" SET {} WHERE \"id\" = ${} RETURNING {}",
            self.table,
            assignments.join(", "),
            params.len(),
            returning
        );
        SqlResult { query, params }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_supplied_fields_are_set() {
        let mut ub = UpdateBuilder::new("chercheurs").unwrap();
        ub.set_opt("nom", Some("Kabongo")).unwrap();
        ub.set_opt::<&str>("prenom", None).unwrap();
        ub.set_raw("derniere_mise_a_jour", "now()").unwrap();

        let id = Uuid::nil();
        let sql = ub.by_id(id, "*");
        assert_eq!(
            sql.query,
            "UPDATE \"chercheurs\" SET \"nom\" = $1, \"derniere_mise_a_jour\" = now() WHERE \"id\" = $2 RETURNING *"
        );
        assert_eq!(sql.params.len(), 2);
        assert!(ub.has_changes());
    }

    #[test]
    fn raw_stamp_alone_counts_as_no_changes() {
        let mut ub = UpdateBuilder::new("chercheurs").unwrap();
        ub.set_raw("derniere_mise_a_jour", "now()").unwrap();
        assert!(!ub.has_changes());
    }

    #[test]
    fn table_name_is_validated() {
        assert!(UpdateBuilder::new("chercheurs; --").is_err());
    }
}

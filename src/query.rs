//! Lookup statement construction and positional argument binding
//!
//! Coordinates named `arg0`, `arg1`, ... carry positional statement
//! parameters. They are bound in ascending position order; gaps are allowed.

use crate::error::{LookupError, Result};
use crate::schema::Value;
use crate::store::PreparedQuery;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Prefix of positional argument coordinates
pub const ARG_PREFIX: &str = "arg";

static ARG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^arg([0-9]+)$").expect("argument pattern is valid"));

/// Positional arguments sorted by position
pub type QueryArgs = Vec<(usize, Value)>;

/// Extracts positional arguments from coordinates and binds them to statements
pub struct QueryArgBinder;

impl QueryArgBinder {
    /// Collect every `argN` coordinate as `(N, value)`, sorted by `N`
    ///
    /// Other coordinates are ignored. Two keys naming the same position
    /// (`arg1` and `arg01`) fail with [`LookupError::BindError`].
    pub fn extract(coordinates: &HashMap<String, Value>) -> Result<QueryArgs> {
        let mut args: QueryArgs = Vec::new();

        for (name, value) in coordinates {
            let Some(captures) = ARG_PATTERN.captures(name) else {
                continue;
            };
            let position: usize = captures[1].parse().map_err(|_| LookupError::BindError {
                position: usize::MAX,
                reason: format!("argument name `{}` is out of range", name),
            })?;
            args.push((position, value.clone()));
        }

        args.sort_by_key(|(position, _)| *position);

        if let Some(pair) = args.windows(2).find(|pair| pair[0].0 == pair[1].0) {
            return Err(LookupError::BindError {
                position: pair[0].0,
                reason: "argument position given more than once".to_string(),
            });
        }

        Ok(args)
    }

    /// Bind `args` in order to statement slots 1, 2, 3, ...
    pub fn bind_to(statement: &mut dyn PreparedQuery, args: &[(usize, Value)]) -> Result<()> {
        args.iter()
            .enumerate()
            .try_for_each(|(index, (_, value))| statement.bind(index + 1, value))
    }
}

/// Statement language spoken by an object store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryDialect {
    /// SQL with `?` placeholders; identifiers are case-insensitive upper-case
    Sql,
    /// Cypher with `$argN` parameters
    Cypher,
}

/// Statement selecting the key of the first object matching a where-clause
///
/// The Cypher form is capped at one row; SQL keeps the plain select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyQuery {
    pub scope: String,
    pub key_column: String,
    pub where_clause: String,
}

impl KeyQuery {
    pub fn new(
        scope: impl Into<String>,
        key_column: impl Into<String>,
        where_clause: impl Into<String>,
    ) -> Self {
        Self {
            scope: scope.into(),
            key_column: key_column.into(),
            where_clause: where_clause.into(),
        }
    }

    /// Column name under which the key comes back
    pub fn result_column(&self, dialect: QueryDialect) -> String {
        match dialect {
            QueryDialect::Sql => self.key_column.to_uppercase(),
            QueryDialect::Cypher => self.key_column.clone(),
        }
    }

    pub fn render(&self, dialect: QueryDialect) -> String {
        let column = self.result_column(dialect);
        match dialect {
            QueryDialect::Sql => format!(
                "SELECT {} FROM {} WHERE {};",
                column, self.scope, self.where_clause
            ),
            QueryDialect::Cypher => format!(
                "MATCH (n:`{}`) WHERE {} RETURN n.`{}` AS `{}` LIMIT 1",
                self.scope, self.where_clause, column, column
            ),
        }
    }
}

/// `SELECT <columns|*> FROM <table> WHERE <clause>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectQuery {
    pub table: String,
    pub columns: Vec<String>,
    pub where_clause: String,
}

impl SelectQuery {
    pub fn new(table: impl Into<String>, columns: Vec<String>, where_clause: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns,
            where_clause: where_clause.into(),
        }
    }

    pub fn render(&self) -> String {
        let columns = if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns.join(",")
        };
        format!(
            "SELECT {} FROM {} WHERE {}",
            columns, self.table, self.where_clause
        )
    }
}

/// Check a table, cache or column name before it is spliced into a statement
///
/// Accepts letters, digits, `_`, `$` and `.` (for schema-qualified names),
/// not starting with a digit.
pub fn validate_identifier(kind: &str, name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid_start = matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_');
    let valid_rest = chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '$' | '.'));

    if valid_start && valid_rest {
        Ok(())
    } else {
        Err(LookupError::ConfigError(format!(
            "{} `{}` is not a valid identifier",
            kind, name
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::schema::DynamicObject;

    fn coordinates(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[derive(Default)]
    struct RecordingStatement {
        bound: Vec<(usize, Value)>,
        reject_doubles: bool,
    }

    #[async_trait]
    impl PreparedQuery for RecordingStatement {
        fn bind(&mut self, position: usize, value: &Value) -> Result<()> {
            if self.reject_doubles && matches!(value, Value::Double(_)) {
                return Err(LookupError::BindError {
                    position,
                    reason: "doubles are not supported".to_string(),
                });
            }
            self.bound.push((position, value.clone()));
            Ok(())
        }

        async fn fetch_first(self: Box<Self>) -> Result<Option<DynamicObject>> {
            Ok(None)
        }
    }

    #[test]
    fn test_extract_sorts_and_filters() {
        let coords = coordinates(&[
            ("arg2", Value::from("x")),
            ("arg0", Value::from("y")),
            ("foo", Value::from("z")),
        ]);

        let args = QueryArgBinder::extract(&coords).unwrap();
        assert_eq!(args, vec![(0, Value::from("y")), (2, Value::from("x"))]);
    }

    #[test]
    fn test_extract_ignores_near_misses() {
        let coords = coordinates(&[
            ("arg", Value::from(1i64)),
            ("Arg1", Value::from(1i64)),
            ("arg1x", Value::from(1i64)),
            ("xarg1", Value::from(1i64)),
            ("arg-1", Value::from(1i64)),
            ("key", Value::from(1i64)),
        ]);

        assert!(QueryArgBinder::extract(&coords).unwrap().is_empty());
    }

    #[test]
    fn test_extract_rejects_duplicate_positions() {
        let coords = coordinates(&[("arg1", Value::from(1i64)), ("arg01", Value::from(2i64))]);

        assert!(matches!(
            QueryArgBinder::extract(&coords),
            Err(LookupError::BindError { position: 1, .. })
        ));
    }

    #[test]
    fn test_bind_uses_sorted_slots() {
        let args = vec![(3, Value::from("a")), (7, Value::from(2i64))];
        let mut statement = RecordingStatement::default();

        QueryArgBinder::bind_to(&mut statement, &args).unwrap();
        assert_eq!(
            statement.bound,
            vec![(1, Value::from("a")), (2, Value::from(2i64))]
        );
    }

    #[test]
    fn test_bind_stops_at_first_rejection() {
        let args = vec![
            (0, Value::from("a")),
            (1, Value::from(1.5f64)),
            (2, Value::from("c")),
        ];
        let mut statement = RecordingStatement {
            reject_doubles: true,
            ..Default::default()
        };

        let result = QueryArgBinder::bind_to(&mut statement, &args);
        assert!(matches!(result, Err(LookupError::BindError { position: 2, .. })));
        assert_eq!(statement.bound.len(), 1);
    }

    #[test]
    fn test_key_query_rendering() {
        let query = KeyQuery::new("PERSON", "_key", "age > ?");
        assert_eq!(
            query.render(QueryDialect::Sql),
            "SELECT _KEY FROM PERSON WHERE age > ?;"
        );

        let query = KeyQuery::new("Person", "key", "n.age > $arg0");
        assert_eq!(
            query.render(QueryDialect::Cypher),
            "MATCH (n:`Person`) WHERE n.age > $arg0 RETURN n.`key` AS `key` LIMIT 1"
        );
        assert_eq!(query.result_column(QueryDialect::Cypher), "key");
    }

    #[test]
    fn test_select_query_rendering() {
        let query = SelectQuery::new("T", Vec::new(), "id = ?");
        assert_eq!(query.render(), "SELECT * FROM T WHERE id = ?");

        let query = SelectQuery::new("T", vec!["id".to_string(), "name".to_string()], "id = ?");
        assert_eq!(query.render(), "SELECT id,name FROM T WHERE id = ?");
    }

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("table", "T").is_ok());
        assert!(validate_identifier("table", "public.lookup_1").is_ok());
        assert!(validate_identifier("table", "1abc").is_err());
        assert!(validate_identifier("table", "").is_err());
        assert!(validate_identifier("table", "T; DROP TABLE T").is_err());
        assert!(validate_identifier("label", "Per`son").is_err());
    }
}

//! Identifier quoting and table-path validation for generated SQL.
//!
//! Every identifier that reaches generated SQL goes through
//! [`SqlSecurity::quote_identifier`]. Names are always quoted, so spaces,
//! punctuation and reserved words are harmless; the only rejected inputs are
//! ones no engine accepts as a name.

use std::fmt;

use crate::error::{DqError, Result};

/// Longest identifier accepted, in bytes.
pub const MAX_IDENTIFIER_LENGTH: usize = 255;

/// Quoting convention of the engine that will run the SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SqlDialect {
    /// Databricks SQL: `` `name` ``
    #[default]
    Databricks,
    /// ANSI SQL as accepted by DataFusion: `"name"`
    Ansi,
}

impl SqlDialect {
    pub fn quote_char(&self) -> char {
        match self {
            SqlDialect::Databricks => '`',
            SqlDialect::Ansi => '"',
        }
    }
}

/// SQL identifier validation and escaping utilities.
pub struct SqlSecurity;

impl SqlSecurity {
    /// Validates and quotes a single identifier for the dialect.
    ///
    /// The quote character inside the name is doubled.
    ///
    /// ```rust
    /// use dq_guard::security::{SqlDialect, SqlSecurity};
    ///
    /// assert_eq!(
    ///     SqlSecurity::quote_identifier("order date", SqlDialect::Databricks).unwrap(),
    ///     "`order date`"
    /// );
    /// assert_eq!(
    ///     SqlSecurity::quote_identifier("a\"b", SqlDialect::Ansi).unwrap(),
    ///     "\"a\"\"b\""
    /// );
    /// assert!(SqlSecurity::quote_identifier("", SqlDialect::Ansi).is_err());
    /// ```
    pub fn quote_identifier(identifier: &str, dialect: SqlDialect) -> Result<String> {
        Self::validate_identifier(identifier)?;
        let quote = dialect.quote_char();
        let doubled: String = [quote, quote].iter().collect();
        let escaped = identifier.replace(quote, &doubled);
        Ok(format!("{quote}{escaped}{quote}"))
    }

    /// Validates an identifier without quoting it.
    pub fn validate_identifier(identifier: &str) -> Result<()> {
        if identifier.trim().is_empty() {
            return Err(DqError::SecurityError(
                "SQL identifier cannot be empty or whitespace-only".to_string(),
            ));
        }

        if identifier.len() > MAX_IDENTIFIER_LENGTH {
            return Err(DqError::SecurityError(format!(
                "SQL identifier too long (max {MAX_IDENTIFIER_LENGTH} bytes)"
            )));
        }

        if identifier.contains('\0') {
            return Err(DqError::SecurityError(
                "SQL identifier cannot contain null bytes".to_string(),
            ));
        }

        Ok(())
    }

    /// Parses a table path and requires the `catalog.schema.table` form.
    pub fn validate_table_path(path: &str) -> Result<TablePath> {
        let parsed = TablePath::parse(path)?;
        if !parsed.is_fully_qualified() {
            return Err(DqError::SecurityError(format!(
                "Table path '{path}' must have the form catalog.schema.table"
            )));
        }
        Ok(parsed)
    }
}

/// A dotted table reference with one to three parts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TablePath {
    parts: Vec<String>,
}

impl TablePath {
    /// Splits `path` on `.` and validates each part.
    ///
    /// Parts are not unquoted, so a name that itself contains a dot cannot be
    /// expressed.
    pub fn parse(path: &str) -> Result<Self> {
        let parts: Vec<String> = path.split('.').map(str::to_string).collect();
        if parts.len() > 3 {
            return Err(DqError::SecurityError(format!(
                "Table path '{path}' has {} parts, expected at most 3",
                parts.len()
            )));
        }
        for part in &parts {
            SqlSecurity::validate_identifier(part).map_err(|_| {
                DqError::SecurityError(format!("Invalid table path '{path}'"))
            })?;
        }
        Ok(Self { parts })
    }

    /// The last path component.
    pub fn table(&self) -> &str {
        self.parts.last().map(String::as_str).unwrap_or_default()
    }

    /// Returns true for the `catalog.schema.table` form.
    pub fn is_fully_qualified(&self) -> bool {
        self.parts.len() == 3
    }

    /// Quotes every part and joins them with `.`.
    pub fn quoted(&self, dialect: SqlDialect) -> Result<String> {
        let quoted = self
            .parts
            .iter()
            .map(|part| SqlSecurity::quote_identifier(part, dialect))
            .collect::<Result<Vec<_>>>()?;
        Ok(quoted.join("."))
    }
}

impl fmt::Display for TablePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.parts.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier_tolerates_awkward_names() {
        let cases = [
            ("select", "`select`"),
            ("order date", "`order date`"),
            ("weird`name", "`weird``name`"),
            ("näme-1", "`näme-1`"),
        ];
        for (input, expected) in cases {
            assert_eq!(
                SqlSecurity::quote_identifier(input, SqlDialect::Databricks).unwrap(),
                expected
            );
        }
    }

    #[test]
    fn test_ansi_quoting() {
        assert_eq!(
            SqlSecurity::quote_identifier("Value", SqlDialect::Ansi).unwrap(),
            "\"Value\""
        );
    }

    #[test]
    fn test_invalid_identifiers() {
        assert!(SqlSecurity::validate_identifier("").is_err());
        assert!(SqlSecurity::validate_identifier("   ").is_err());
        assert!(SqlSecurity::validate_identifier("a\0b").is_err());
        assert!(SqlSecurity::validate_identifier(&"x".repeat(256)).is_err());
        assert!(SqlSecurity::validate_identifier(&"x".repeat(255)).is_ok());
    }

    #[test]
    fn test_table_path_parsing() {
        let path = TablePath::parse("main.sales.orders").unwrap();
        assert!(path.is_fully_qualified());
        assert_eq!(path.table(), "orders");
        assert_eq!(
            path.quoted(SqlDialect::Databricks).unwrap(),
            "`main`.`sales`.`orders`"
        );
        assert_eq!(path.to_string(), "main.sales.orders");

        let short = TablePath::parse("orders").unwrap();
        assert!(!short.is_fully_qualified());
        assert_eq!(short.quoted(SqlDialect::Ansi).unwrap(), "\"orders\"");
    }

    #[test]
    fn test_table_path_rejections() {
        assert!(TablePath::parse("").is_err());
        assert!(TablePath::parse("main..orders").is_err());
        assert!(TablePath::parse("a.b.c.d").is_err());
        assert!(TablePath::parse("main.sales.ord\0ers").is_err());
    }

    #[test]
    fn test_validate_table_path_requires_three_parts() {
        assert!(SqlSecurity::validate_table_path("main.sales.orders").is_ok());
        let err = SqlSecurity::validate_table_path("sales.orders").unwrap_err();
        assert!(matches!(err, DqError::SecurityError(_)));
    }
}

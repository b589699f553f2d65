//! Generation of the single-statement aggregate query.

use arrow::datatypes::{DataType, Field};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Write as _;
use tracing::{debug, instrument};

use crate::error::{DqError, Result};
use crate::logging::{truncate_field, LogConfig};
use crate::security::{SqlDialect, SqlSecurity, TablePath};

/// Alias of the row-count metric.
pub const TOTAL_ROWS: &str = "total_rows";

/// Per-column metric suffixes.
pub mod suffix {
    pub const NON_NULL: &str = "_non_null";
    pub const DISTINCT: &str = "_distinct";
    pub const MIN: &str = "_min";
    pub const MAX: &str = "_max";
    pub const AVG: &str = "_avg";
    pub const HAS_FUTURE: &str = "_has_future";
}

/// Catalog type of a remote column.
///
/// Parsed case-insensitively; parameterized names such as `DECIMAL(10,2)`
/// map to their base type and anything unrecognized is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ColumnTypeName {
    String,
    Int,
    Long,
    Short,
    Byte,
    Float,
    Double,
    Decimal,
    Timestamp,
    TimestampNtz,
    Date,
    Boolean,
    Other(String),
}

static TYPE_NAME: Lazy<Regex> = Lazy::new(|| {
    // Base name, optionally followed by parameters such as `(10,2)`
    #[allow(clippy::expect_used)]
    Regex::new(r"^\s*([A-Za-z_]+)\s*(?:\(.*\))?\s*$").expect("Hard-coded type name pattern should be valid")
});

impl ColumnTypeName {
    pub fn parse(name: &str) -> Self {
        let base = TYPE_NAME
            .captures(name)
            .and_then(|captures| captures.get(1))
            .map(|base| base.as_str().to_ascii_uppercase());

        match base.as_deref() {
            Some("STRING") => ColumnTypeName::String,
            Some("INT") => ColumnTypeName::Int,
            Some("LONG") => ColumnTypeName::Long,
            Some("SHORT") => ColumnTypeName::Short,
            Some("BYTE") => ColumnTypeName::Byte,
            Some("FLOAT") => ColumnTypeName::Float,
            Some("DOUBLE") => ColumnTypeName::Double,
            Some("DECIMAL") => ColumnTypeName::Decimal,
            Some("TIMESTAMP") => ColumnTypeName::Timestamp,
            Some("TIMESTAMP_NTZ") => ColumnTypeName::TimestampNtz,
            Some("DATE") => ColumnTypeName::Date,
            Some("BOOLEAN") => ColumnTypeName::Boolean,
            _ => ColumnTypeName::Other(name.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ColumnTypeName::String => "STRING",
            ColumnTypeName::Int => "INT",
            ColumnTypeName::Long => "LONG",
            ColumnTypeName::Short => "SHORT",
            ColumnTypeName::Byte => "BYTE",
            ColumnTypeName::Float => "FLOAT",
            ColumnTypeName::Double => "DOUBLE",
            ColumnTypeName::Decimal => "DECIMAL",
            ColumnTypeName::Timestamp => "TIMESTAMP",
            ColumnTypeName::TimestampNtz => "TIMESTAMP_NTZ",
            ColumnTypeName::Date => "DATE",
            ColumnTypeName::Boolean => "BOOLEAN",
            ColumnTypeName::Other(name) => name,
        }
    }

    /// Types whose distinct count is computed.
    pub fn has_distinct(&self) -> bool {
        matches!(
            self,
            ColumnTypeName::String
                | ColumnTypeName::Int
                | ColumnTypeName::Long
                | ColumnTypeName::Short
                | ColumnTypeName::Byte
        )
    }

    /// Types that get min, max and mean.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ColumnTypeName::Int
                | ColumnTypeName::Long
                | ColumnTypeName::Short
                | ColumnTypeName::Byte
                | ColumnTypeName::Float
                | ColumnTypeName::Double
                | ColumnTypeName::Decimal
        )
    }

    /// Types checked for values after "now".
    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            ColumnTypeName::Timestamp | ColumnTypeName::TimestampNtz | ColumnTypeName::Date
        )
    }

    /// The catalog type an Arrow column would be reported as.
    pub fn from_arrow(data_type: &DataType) -> Self {
        match data_type {
            DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => ColumnTypeName::String,
            DataType::Int8 => ColumnTypeName::Byte,
            DataType::Int16 | DataType::UInt8 => ColumnTypeName::Short,
            DataType::Int32 | DataType::UInt16 => ColumnTypeName::Int,
            DataType::Int64 | DataType::UInt32 => ColumnTypeName::Long,
            DataType::UInt64 | DataType::Decimal128(_, _) | DataType::Decimal256(_, _) => {
                ColumnTypeName::Decimal
            }
            DataType::Float16 | DataType::Float32 => ColumnTypeName::Float,
            DataType::Float64 => ColumnTypeName::Double,
            DataType::Timestamp(_, Some(_)) => ColumnTypeName::Timestamp,
            DataType::Timestamp(_, None) => ColumnTypeName::TimestampNtz,
            DataType::Date32 | DataType::Date64 => ColumnTypeName::Date,
            DataType::Boolean => ColumnTypeName::Boolean,
            DataType::Dictionary(_, value) => ColumnTypeName::from_arrow(value),
            other => ColumnTypeName::Other(other.to_string()),
        }
    }
}

impl From<String> for ColumnTypeName {
    fn from(name: String) -> Self {
        ColumnTypeName::parse(&name)
    }
}

impl From<&str> for ColumnTypeName {
    fn from(name: &str) -> Self {
        ColumnTypeName::parse(name)
    }
}

impl From<ColumnTypeName> for String {
    fn from(name: ColumnTypeName) -> Self {
        name.as_str().to_string()
    }
}

impl fmt::Display for ColumnTypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One column of a remote table, as listed by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    pub type_name: ColumnTypeName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, type_name: impl Into<ColumnTypeName>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            nullable: None,
            comment: None,
        }
    }

    /// Describes an Arrow field the way a catalog would.
    pub fn from_arrow_field(field: &Field) -> Self {
        Self {
            name: field.name().clone(),
            type_name: ColumnTypeName::from_arrow(field.data_type()),
            nullable: Some(field.is_nullable()),
            comment: None,
        }
    }

    /// The metric alias prefix for this column.
    pub fn alias(&self) -> String {
        sanitize_alias(&self.name)
    }
}

/// Replaces spaces and hyphens with underscores.
///
/// Distinct names can map to the same alias (`a-b` and `a_b`); such
/// collisions are not resolved.
pub fn sanitize_alias(name: &str) -> String {
    name.replace([' ', '-'], "_")
}

/// Builds the aggregate statement for a table.
#[derive(Debug, Clone, Default)]
pub struct SqlPlanGenerator {
    dialect: SqlDialect,
    fixed_now: Option<DateTime<Utc>>,
    log: LogConfig,
}

impl SqlPlanGenerator {
    pub fn new(dialect: SqlDialect) -> Self {
        Self {
            dialect,
            fixed_now: None,
            log: LogConfig::default(),
        }
    }

    /// Compares temporal columns against a literal instead of the engine's
    /// current time.
    pub fn with_fixed_now(mut self, now: DateTime<Utc>) -> Self {
        self.fixed_now = Some(now);
        self
    }

    pub fn with_log_config(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }

    pub fn dialect(&self) -> SqlDialect {
        self.dialect
    }

    fn now_expression(&self) -> String {
        match self.fixed_now {
            Some(now) => format!("TIMESTAMP '{}'", now.format("%Y-%m-%d %H:%M:%S%.6f")),
            None => "current_timestamp()".to_string(),
        }
    }

    fn quote(&self, identifier: &str) -> Result<String> {
        SqlSecurity::quote_identifier(identifier, self.dialect)
    }

    /// Generates one `SELECT` returning a single row of metrics.
    ///
    /// ```rust
    /// use dq_guard::pushdown::{ColumnSchema, SqlPlanGenerator};
    /// use dq_guard::security::SqlDialect;
    ///
    /// let sql = SqlPlanGenerator::new(SqlDialect::Databricks)
    ///     .generate("main.sales.orders", &[ColumnSchema::new("id", "LONG")])
    ///     .unwrap();
    /// assert!(sql.contains("COUNT(DISTINCT `id`) AS `id_distinct`"));
    /// assert!(sql.ends_with("FROM `main`.`sales`.`orders`"));
    /// ```
    #[instrument(skip(self, columns), fields(table = %table_name, columns = columns.len()))]
    pub fn generate(&self, table_name: &str, columns: &[ColumnSchema]) -> Result<String> {
        let table = TablePath::parse(table_name)?;
        let now = self.now_expression();

        let mut projections = vec![format!("COUNT(*) AS {}", self.quote(TOTAL_ROWS)?)];
        for column in columns {
            let col = self.quote(&column.name)?;
            let alias = column.alias();
            let aliased = |metric: &str| self.quote(&format!("{alias}{metric}"));

            projections.push(format!("COUNT({col}) AS {}", aliased(suffix::NON_NULL)?));
            if column.type_name.has_distinct() {
                projections.push(format!(
                    "COUNT(DISTINCT {col}) AS {}",
                    aliased(suffix::DISTINCT)?
                ));
            }
            if column.type_name.is_numeric() {
                projections.push(format!("MIN({col}) AS {}", aliased(suffix::MIN)?));
                projections.push(format!("MAX({col}) AS {}", aliased(suffix::MAX)?));
                projections.push(format!("AVG({col}) AS {}", aliased(suffix::AVG)?));
            }
            if column.type_name.is_temporal() {
                projections.push(format!(
                    "MAX(CASE WHEN {col} > {now} THEN 1 ELSE 0 END) AS {}",
                    aliased(suffix::HAS_FUTURE)?
                ));
            }
        }

        let mut sql = String::from("SELECT\n");
        for (index, projection) in projections.iter().enumerate() {
            let separator = if index + 1 < projections.len() { "," } else { "" };
            writeln!(sql, "  {projection}{separator}")
                .map_err(|e| DqError::Internal(format!("Failed to build SQL: {e}")))?;
        }
        sql.push_str("FROM ");
        sql.push_str(&table.quoted(self.dialect)?);

        if self.log.log_sql {
            debug!(
                sql = %truncate_field(&sql, self.log.max_field_length),
                metrics = projections.len(),
                "Generated aggregate statement"
            );
        }
        Ok(sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_columns() -> Vec<ColumnSchema> {
        vec![
            ColumnSchema::new("id", "LONG"),
            ColumnSchema::new("order date", "TIMESTAMP"),
            ColumnSchema::new("unit-price", "DECIMAL(10,2)"),
            ColumnSchema::new("name", "string"),
            ColumnSchema::new("is_active", "BOOLEAN"),
        ]
    }

    #[test]
    fn test_type_name_parsing() {
        assert_eq!(ColumnTypeName::parse("long"), ColumnTypeName::Long);
        assert_eq!(ColumnTypeName::parse("DECIMAL(38, 4)"), ColumnTypeName::Decimal);
        assert_eq!(ColumnTypeName::parse("timestamp_ntz"), ColumnTypeName::TimestampNtz);
        assert_eq!(ColumnTypeName::parse("  Double "), ColumnTypeName::Double);
        assert_eq!(ColumnTypeName::parse("decimal (10,2)"), ColumnTypeName::Decimal);
        assert_eq!(
            ColumnTypeName::parse("ARRAY<INT>"),
            ColumnTypeName::Other("ARRAY<INT>".to_string())
        );
        assert_eq!(ColumnTypeName::parse("MAP").to_string(), "MAP");
    }

    #[test]
    fn test_column_schema_from_catalog_json() {
        let json = r#"{"name": "amount", "type_name": "DECIMAL", "nullable": true, "type_text": "decimal(10,2)"}"#;
        let column: ColumnSchema = serde_json::from_str(json).unwrap();
        assert_eq!(column.type_name, ColumnTypeName::Decimal);
        assert_eq!(column.nullable, Some(true));
    }

    #[test]
    fn test_sanitize_alias() {
        assert_eq!(sanitize_alias("order date"), "order_date");
        assert_eq!(sanitize_alias("unit-price"), "unit_price");
        // known collision
        assert_eq!(sanitize_alias("a-b"), sanitize_alias("a_b"));
    }

    #[test]
    fn test_generate_projection() {
        let sql = SqlPlanGenerator::new(SqlDialect::Databricks)
            .generate("main.sales.orders", &sample_columns())
            .unwrap();

        assert!(sql.starts_with("SELECT\n  COUNT(*) AS `total_rows`,\n"));
        assert!(sql.contains("COUNT(`id`) AS `id_non_null`"));
        assert!(sql.contains("COUNT(DISTINCT `id`) AS `id_distinct`"));
        assert!(sql.contains("AVG(`id`) AS `id_avg`"));
        assert!(sql.contains(
            "MAX(CASE WHEN `order date` > current_timestamp() THEN 1 ELSE 0 END) AS `order_date_has_future`"
        ));
        assert!(sql.contains("MIN(`unit-price`) AS `unit_price_min`"));
        assert!(!sql.contains("unit_price_distinct"));
        assert!(sql.contains("COUNT(DISTINCT `name`) AS `name_distinct`"));
        assert!(!sql.contains("`name_min`"));
        assert!(sql.contains("COUNT(`is_active`) AS `is_active_non_null`"));
        assert!(!sql.contains("is_active_distinct"));
        assert!(sql.ends_with("FROM `main`.`sales`.`orders`"));
    }

    #[test]
    fn test_generate_is_deterministic() {
        let generator = SqlPlanGenerator::new(SqlDialect::Databricks);
        let columns = sample_columns();
        assert_eq!(
            generator.generate("t", &columns).unwrap(),
            generator.generate("t", &columns).unwrap()
        );
    }

    #[test]
    fn test_generate_without_columns() {
        let sql = SqlPlanGenerator::new(SqlDialect::Ansi)
            .generate("orders", &[])
            .unwrap();
        assert_eq!(sql, "SELECT\n  COUNT(*) AS \"total_rows\"\nFROM \"orders\"");
    }

    #[test]
    fn test_fixed_now_literal() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let sql = SqlPlanGenerator::new(SqlDialect::Ansi)
            .with_fixed_now(now)
            .generate("events", &[ColumnSchema::new("at", "DATE")])
            .unwrap();
        assert!(sql.contains(
            "MAX(CASE WHEN \"at\" > TIMESTAMP '2024-03-01 12:00:00.000000' THEN 1 ELSE 0 END) AS \"at_has_future\""
        ));
    }

    #[test]
    fn test_reserved_and_quoted_names() {
        let sql = SqlPlanGenerator::new(SqlDialect::Databricks)
            .generate("t", &[ColumnSchema::new("select`x", "INT")])
            .unwrap();
        assert!(sql.contains("COUNT(`select``x`) AS `select``x_non_null`"));
    }

    #[test]
    fn test_invalid_names_are_rejected() {
        let generator = SqlPlanGenerator::new(SqlDialect::Databricks);
        assert!(matches!(
            generator.generate("", &[]),
            Err(DqError::SecurityError(_))
        ));
        assert!(generator
            .generate("t", &[ColumnSchema::new("bad\0name", "INT")])
            .is_err());
    }
}

//! The response shape returned by a remote SQL executor.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A column of the statement's result manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultColumn {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSchema {
    #[serde(default)]
    pub columns: Vec<ResultColumn>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub schema: ResultSchema,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultData {
    #[serde(default)]
    pub data_array: Vec<Vec<Value>>,
}

/// A statement execution response.
///
/// Rows may appear either at the top level (`data_array`) or nested under
/// `result.data_array`; numeric values commonly arrive as JSON strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest: Option<Manifest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_array: Option<Vec<Vec<Value>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ResultData>,
}

impl StatementResult {
    /// Builds a response holding the given column names and rows.
    pub fn new(column_names: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let columns = column_names
            .into_iter()
            .enumerate()
            .map(|(position, name)| ResultColumn {
                name,
                type_name: None,
                position: Some(position),
            })
            .collect();
        Self {
            manifest: Some(Manifest {
                schema: ResultSchema { columns },
            }),
            data_array: Some(rows),
            result: None,
        }
    }

    /// Result column names in manifest order.
    pub fn column_names(&self) -> Vec<String> {
        self.manifest
            .iter()
            .flat_map(|manifest| manifest.schema.columns.iter())
            .map(|column| column.name.clone())
            .collect()
    }

    /// All rows, preferring the top-level array when present.
    pub fn rows(&self) -> &[Vec<Value>] {
        match (&self.data_array, &self.result) {
            (Some(rows), _) if !rows.is_empty() => rows.as_slice(),
            (_, Some(result)) => result.data_array.as_slice(),
            (Some(rows), None) => rows.as_slice(),
            (None, None) => &[],
        }
    }

    pub fn first_row(&self) -> Option<&[Value]> {
        self.rows().first().map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_result_rows() {
        let response: StatementResult = serde_json::from_value(json!({
            "statement_id": "01ef-abc",
            "status": {"state": "SUCCEEDED"},
            "manifest": {
                "format": "JSON_ARRAY",
                "schema": {
                    "column_count": 2,
                    "columns": [
                        {"name": "total_rows", "type_name": "LONG", "position": 0},
                        {"name": "id_non_null", "type_name": "LONG", "position": 1}
                    ]
                }
            },
            "result": {"chunk_index": 0, "row_count": 1, "data_array": [["1000", "990"]]}
        }))
        .unwrap();

        assert_eq!(response.column_names(), vec!["total_rows", "id_non_null"]);
        assert_eq!(response.first_row().unwrap()[0], json!("1000"));
    }

    #[test]
    fn test_top_level_rows() {
        let response = StatementResult::new(vec!["total_rows".into()], vec![vec![json!(5)]]);
        assert_eq!(response.rows().len(), 1);
        assert_eq!(response.first_row().unwrap()[0], json!(5));
    }

    #[test]
    fn test_missing_everything() {
        let response: StatementResult = serde_json::from_value(json!({})).unwrap();
        assert!(response.column_names().is_empty());
        assert!(response.first_row().is_none());
    }
}

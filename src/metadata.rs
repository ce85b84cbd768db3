//! Table metadata - column typing and the deterministic text rendering used
//! as embedding input.

use polars::prelude::DataType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse column type used for routing metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Numeric,
    String,
    Datetime,
    Boolean,
    Unknown,
}

impl ColumnType {
    /// Classify a polars dtype. First matching class wins: numeric, string,
    /// datetime, boolean, unknown.
    pub fn from_dtype(dtype: &DataType) -> Self {
        if dtype.is_numeric() {
            ColumnType::Numeric
        } else if matches!(dtype, DataType::String) {
            ColumnType::String
        } else if dtype.is_temporal() {
            ColumnType::Datetime
        } else if matches!(dtype, DataType::Boolean) {
            ColumnType::Boolean
        } else {
            ColumnType::Unknown
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ColumnType::Numeric => "numeric",
            ColumnType::String => "string",
            ColumnType::Datetime => "datetime",
            ColumnType::Boolean => "boolean",
            ColumnType::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// Structural description of one indexed table.
///
/// `columns` and `column_types` are parallel and equal length; `metadata_text`
/// is a pure function of the other fields and is what gets embedded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableMetadata {
    pub table_name: String,
    pub columns: Vec<String>,
    pub column_types: Vec<ColumnType>,
    pub source_file: String,
    pub metadata_text: String,
}

impl TableMetadata {
    pub fn new(
        table_name: String,
        columns: Vec<String>,
        column_types: Vec<ColumnType>,
        source_file: String,
    ) -> Self {
        debug_assert_eq!(columns.len(), column_types.len());
        let metadata_text = render_metadata_text(&table_name, &columns, &column_types);
        Self {
            table_name,
            columns,
            column_types,
            source_file,
            metadata_text,
        }
    }
}

/// The subset of [`TableMetadata`] stored as a vector index payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TablePayload {
    pub table_name: String,
    pub columns: Vec<String>,
    pub column_types: Vec<ColumnType>,
    pub source_file: String,
}

impl From<&TableMetadata> for TablePayload {
    fn from(meta: &TableMetadata) -> Self {
        Self {
            table_name: meta.table_name.clone(),
            columns: meta.columns.clone(),
            column_types: meta.column_types.clone(),
            source_file: meta.source_file.clone(),
        }
    }
}

impl TablePayload {
    /// One `- column: type` line per column, in column order.
    pub fn column_lines(&self) -> String {
        self.columns
            .iter()
            .zip(self.column_types.iter())
            .map(|(col, typ)| format!("- {}: {}", col, typ))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Render the canonical metadata text: a `Table:` header followed by one
/// `- column: type` line per column.
pub fn render_metadata_text(
    table_name: &str,
    columns: &[String],
    column_types: &[ColumnType],
) -> String {
    let lines: Vec<String> = columns
        .iter()
        .zip(column_types.iter())
        .map(|(col, typ)| format!("- {}: {}", col, typ))
        .collect();
    format!("Table: {}\nColumns:\n{}", table_name, lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_text_format() {
        let meta = TableMetadata::new(
            "sales".to_string(),
            vec!["region".to_string(), "amount".to_string()],
            vec![ColumnType::String, ColumnType::Numeric],
            "sales.csv".to_string(),
        );
        assert_eq!(
            meta.metadata_text,
            "Table: sales\nColumns:\n- region: string\n- amount: numeric"
        );
    }

    #[test]
    fn metadata_text_is_deterministic() {
        let columns = vec!["a".to_string(), "b".to_string()];
        let types = vec![ColumnType::Numeric, ColumnType::Boolean];
        let first = render_metadata_text("t", &columns, &types);
        let second = render_metadata_text("t", &columns, &types);
        assert_eq!(first, second);
    }

    #[test]
    fn classify_dtypes() {
        assert_eq!(
            ColumnType::from_dtype(&DataType::Int64),
            ColumnType::Numeric
        );
        assert_eq!(
            ColumnType::from_dtype(&DataType::Float64),
            ColumnType::Numeric
        );
        assert_eq!(
            ColumnType::from_dtype(&DataType::String),
            ColumnType::String
        );
        assert_eq!(ColumnType::from_dtype(&DataType::Date), ColumnType::Datetime);
        assert_eq!(
            ColumnType::from_dtype(&DataType::Boolean),
            ColumnType::Boolean
        );
        assert_eq!(ColumnType::from_dtype(&DataType::Null), ColumnType::Unknown);
    }

    #[test]
    fn payload_drops_metadata_text() {
        let meta = TableMetadata::new(
            "t".to_string(),
            vec!["a".to_string()],
            vec![ColumnType::Numeric],
            "t.csv".to_string(),
        );
        let payload = TablePayload::from(&meta);
        let value = serde_json::to_value(&payload).unwrap();
        assert!(value.get("metadata_text").is_none());
        assert_eq!(value["table_name"], "t");
        assert_eq!(value["column_types"][0], "numeric");
    }
}

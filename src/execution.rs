//! Execution Engine - runs a query string against the routed table's
//! in-memory data with the embedded polars SQL evaluator.

use crate::error::{ChatError, Result};
use polars::prelude::*;
use polars::sql::SQLContext;

/// Shape classification of an executed query's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultShape {
    /// Exactly one row and one column; rendered as a single value.
    Scalar,
    /// Zero rows.
    Empty,
    /// Everything else; rendered as a row count plus the table body.
    Tabular,
}

#[derive(Debug, Clone)]
pub struct QueryResult {
    pub data: DataFrame,
    pub shape: ResultShape,
}

impl QueryResult {
    pub fn is_scalar(&self) -> bool {
        self.shape == ResultShape::Scalar
    }

    /// Render the result for summarization and display.
    pub fn render(&self) -> String {
        match self.shape {
            ResultShape::Empty => "Result: No data found.".to_string(),
            ResultShape::Scalar => {
                let value = self
                    .data
                    .get_columns()
                    .first()
                    .and_then(|s| s.get(0).ok())
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "null".to_string());
                format!("Result: {}", value)
            }
            ResultShape::Tabular => format!(
                "Result:\n{}\nTotal {} row(s) returned.",
                self.data,
                self.data.height()
            ),
        }
    }
}

/// Execute `query` against `data`, bound under `table_name`. Binding the
/// frame in a fresh SQL context is what ties the query's table reference to
/// the in-memory snapshot.
pub fn execute(query: &str, table_name: &str, data: DataFrame) -> Result<QueryResult> {
    let mut ctx = SQLContext::new();
    ctx.register(table_name, data.lazy());

    let frame = ctx
        .execute(query)
        .map_err(|e| ChatError::Execution(e.to_string()))?;
    let df = frame
        .collect()
        .map_err(|e| ChatError::Execution(e.to_string()))?;

    let shape = if df.height() == 0 {
        ResultShape::Empty
    } else if df.height() == 1 && df.width() == 1 {
        ResultShape::Scalar
    } else {
        ResultShape::Tabular
    };

    Ok(QueryResult { data: df, shape })
}

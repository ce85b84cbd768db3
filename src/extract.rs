//! Metadata Extractor - reads a bounded sample of a tabular file and derives
//! the table's structural description.
//!
//! CSV goes through the polars reader; XLSX/XLS go through calamine and are
//! typed per column from the cell variants before the frame is built.

use crate::error::{ChatError, Result};
use crate::metadata::{ColumnType, TableMetadata};
use calamine::{Data, Range, Reader, Xls, Xlsx};
use polars::prelude::*;
use std::io::Cursor;
use std::path::Path;

/// Maximum rows sampled when extracting metadata.
pub const SAMPLE_ROWS: usize = 100;

/// Recognized tabular file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Xlsx,
    Xls,
}

impl TableFormat {
    /// Resolve the format from a file name's extension.
    pub fn from_source(source_file: &str) -> Result<Self> {
        let ext = Path::new(source_file)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(TableFormat::Csv),
            "xlsx" => Ok(TableFormat::Xlsx),
            "xls" => Ok(TableFormat::Xls),
            other => Err(ChatError::UnsupportedFormat(format!(
                "'{}' (.{}): expected .csv, .xlsx or .xls",
                source_file, other
            ))),
        }
    }
}

/// Table name derived from a file name: the stem without extension.
pub fn table_name_from_source(source_file: &str) -> String {
    Path::new(source_file)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(source_file)
        .to_string()
}

/// Read tabular bytes into a DataFrame. `limit` bounds the number of data
/// rows read; `None` reads everything (used by the execution engine).
pub fn read_table(bytes: &[u8], format: TableFormat, limit: Option<usize>) -> Result<DataFrame> {
    match format {
        TableFormat::Csv => read_csv(bytes, limit),
        TableFormat::Xlsx => {
            let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))
                .map_err(|e| ChatError::UnreadableFile(e.to_string()))?;
            let range = workbook
                .worksheet_range_at(0)
                .ok_or_else(|| ChatError::UnreadableFile("workbook has no sheets".to_string()))?
                .map_err(|e| ChatError::UnreadableFile(e.to_string()))?;
            dataframe_from_range(&range, limit)
        }
        TableFormat::Xls => {
            let mut workbook: Xls<_> = Xls::new(Cursor::new(bytes))
                .map_err(|e| ChatError::UnreadableFile(e.to_string()))?;
            let range = workbook
                .worksheet_range_at(0)
                .ok_or_else(|| ChatError::UnreadableFile("workbook has no sheets".to_string()))?
                .map_err(|e| ChatError::UnreadableFile(e.to_string()))?;
            dataframe_from_range(&range, limit)
        }
    }
}

/// Extract table metadata from at most [`SAMPLE_ROWS`] rows of the file.
pub fn extract_metadata(source_file: &str, bytes: &[u8]) -> Result<TableMetadata> {
    let format = TableFormat::from_source(source_file)?;
    let df = read_table(bytes, format, Some(SAMPLE_ROWS))?;

    let mut columns = Vec::with_capacity(df.width());
    let mut column_types = Vec::with_capacity(df.width());
    for field in df.schema().iter_fields() {
        columns.push(field.name().to_string());
        column_types.push(ColumnType::from_dtype(field.data_type()));
    }

    Ok(TableMetadata::new(
        table_name_from_source(source_file),
        columns,
        column_types,
        source_file.to_string(),
    ))
}

fn read_csv(bytes: &[u8], limit: Option<usize>) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_n_rows(limit)
        .with_parse_options(CsvParseOptions::default().with_try_parse_dates(true))
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
        .map_err(|e| ChatError::UnreadableFile(e.to_string()))
}

fn dataframe_from_range(range: &Range<Data>, limit: Option<usize>) -> Result<DataFrame> {
    let mut rows = range.rows();
    let header_row = rows
        .next()
        .ok_or_else(|| ChatError::UnreadableFile("sheet is empty".to_string()))?;
    let headers: Vec<String> = header_row
        .iter()
        .enumerate()
        .map(|(idx, cell)| match cell {
            Data::Empty => format!("column_{}", idx),
            other => other.to_string().trim().to_string(),
        })
        .collect();

    let data_rows: Vec<&[Data]> = match limit {
        Some(n) => rows.take(n).collect(),
        None => rows.collect(),
    };

    let mut series = Vec::with_capacity(headers.len());
    for (idx, name) in headers.iter().enumerate() {
        let cells: Vec<&Data> = data_rows
            .iter()
            .map(|row| row.get(idx).unwrap_or(&Data::Empty))
            .collect();
        series.push(series_from_cells(name, &cells));
    }

    DataFrame::new(series).map_err(|e| ChatError::UnreadableFile(e.to_string()))
}

/// Build a typed Series from a column of spreadsheet cells. A column is
/// numeric, boolean or datetime only when every non-empty cell is; anything
/// mixed falls back to strings.
fn series_from_cells(name: &str, cells: &[&Data]) -> Series {
    let non_empty: Vec<&&Data> = cells
        .iter()
        .filter(|c| !matches!(c, Data::Empty))
        .collect();

    let all_numeric = !non_empty.is_empty()
        && non_empty
            .iter()
            .all(|c| matches!(c, Data::Float(_) | Data::Int(_)));
    if all_numeric {
        let values: Vec<Option<f64>> = cells
            .iter()
            .map(|c| match c {
                Data::Float(f) => Some(*f),
                Data::Int(i) => Some(*i as f64),
                _ => None,
            })
            .collect();
        return Series::new(name, values);
    }

    let all_bool = !non_empty.is_empty() && non_empty.iter().all(|c| matches!(c, Data::Bool(_)));
    if all_bool {
        let values: Vec<Option<bool>> = cells
            .iter()
            .map(|c| match c {
                Data::Bool(b) => Some(*b),
                _ => None,
            })
            .collect();
        return Series::new(name, values);
    }

    let all_datetime = !non_empty.is_empty()
        && non_empty
            .iter()
            .all(|c| matches!(c, Data::DateTime(_)));
    if all_datetime {
        let values: Vec<Option<chrono::NaiveDateTime>> = cells
            .iter()
            .map(|c| match c {
                Data::DateTime(dt) => dt.as_datetime(),
                _ => None,
            })
            .collect();
        return DatetimeChunked::from_naive_datetime_options(name, values, TimeUnit::Milliseconds)
            .into_series();
    }

    let values: Vec<Option<String>> = cells
        .iter()
        .map(|c| match c {
            Data::Empty => None,
            other => Some(other.to_string()),
        })
        .collect();
    Series::new(name, values)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CSV: &[u8] =
        b"region,amount,active,signup\nA,10,true,2024-01-01\nB,20,false,2024-02-01\nA,5,true,2024-03-01\n";

    #[test]
    fn format_from_extension() {
        assert_eq!(TableFormat::from_source("a.csv").unwrap(), TableFormat::Csv);
        assert_eq!(
            TableFormat::from_source("b.XLSX").unwrap(),
            TableFormat::Xlsx
        );
        assert_eq!(TableFormat::from_source("c.xls").unwrap(), TableFormat::Xls);
        assert!(matches!(
            TableFormat::from_source("d.parquet"),
            Err(ChatError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            TableFormat::from_source("noext"),
            Err(ChatError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn extracts_columns_and_types_from_csv() {
        let meta = extract_metadata("sales.csv", SAMPLE_CSV).unwrap();
        assert_eq!(meta.table_name, "sales");
        assert_eq!(meta.source_file, "sales.csv");
        assert_eq!(meta.columns, vec!["region", "amount", "active", "signup"]);
        assert_eq!(meta.columns.len(), meta.column_types.len());
        assert_eq!(meta.column_types[0], ColumnType::String);
        assert_eq!(meta.column_types[1], ColumnType::Numeric);
        assert_eq!(meta.column_types[2], ColumnType::Boolean);
        assert_eq!(meta.column_types[3], ColumnType::Datetime);
    }

    #[test]
    fn sampling_is_bounded_but_full_read_is_not() {
        let mut csv = String::from("n\n");
        for i in 0..150 {
            csv.push_str(&format!("{}\n", i));
        }
        let sampled = read_table(csv.as_bytes(), TableFormat::Csv, Some(SAMPLE_ROWS)).unwrap();
        assert_eq!(sampled.height(), SAMPLE_ROWS);
        let full = read_table(csv.as_bytes(), TableFormat::Csv, None).unwrap();
        assert_eq!(full.height(), 150);
    }

    #[test]
    fn garbage_xlsx_is_unreadable() {
        let err = extract_metadata("junk.xlsx", b"not a zip archive").unwrap_err();
        assert!(matches!(err, ChatError::UnreadableFile(_)));
    }

    #[test]
    fn excel_cells_type_columns() {
        let numeric = series_from_cells("n", &[&Data::Int(1), &Data::Float(2.5)]);
        assert!(numeric.dtype().is_numeric());

        let boolean = series_from_cells("b", &[&Data::Bool(true), &Data::Empty]);
        assert_eq!(boolean.dtype(), &DataType::Boolean);

        let mixed = series_from_cells("m", &[&Data::Int(1), &Data::String("x".to_string())]);
        assert_eq!(mixed.dtype(), &DataType::String);
    }
}

use std::collections::BTreeSet;
use std::path::Path;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{
    DataType, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type, UInt16Type,
    UInt32Type, UInt64Type, UInt8Type,
};
use arrow::util::display::array_value_to_string;
use log::info;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::derive::row_required_columns;
use super::fields::Column;
use super::model::{BookingRecord, BookingStore, CellValue, Month, RawRow};
use crate::error::{LoadError, LoadResult};

/// Tokens Pandas and R write for missing values.
const NULL_TOKENS: [&str; 5] = ["NA", "NaN", "nan", "NULL", "null"];

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a booking dataset from a file. Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row plus one booking per line (the usual export)
/// * `.parquet` – flat columns, as written by `df.to_parquet()`
/// * `.json`    – `[{ "hotel": "...", "lead_time": 12, ... }, ...]`
///
/// Rows with nulls in required columns are dropped here; the derived
/// fields are not computed yet.
pub fn load_file(path: &Path) -> LoadResult<BookingStore> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let (schema, rows) = match ext.as_str() {
        "csv" => read_csv(path)?,
        "parquet" | "pq" => read_parquet(path)?,
        "json" => read_json(path)?,
        other => return Err(LoadError::UnsupportedExtension(other.to_string())),
    };

    build_store(schema, rows)
}

/// Validate the schema, drop incomplete rows and convert the rest.
pub fn build_store(schema: BTreeSet<Column>, rows: Vec<RawRow>) -> LoadResult<BookingStore> {
    if let Some(missing) = Column::REQUIRED.into_iter().find(|c| !schema.contains(c)) {
        return Err(LoadError::MissingColumn(missing.name()));
    }

    let required = row_required_columns(&schema);
    let mut records = Vec::with_capacity(rows.len());
    let mut dropped = 0;

    for (row_no, raw) in rows.iter().enumerate() {
        match record_from_row(row_no, raw, &required)? {
            Some(rec) => records.push(rec),
            None => dropped += 1,
        }
    }

    if records.is_empty() {
        return Err(LoadError::Empty { dropped });
    }

    info!(
        "Loaded {} bookings ({dropped} dropped for nulls) with columns {:?}",
        records.len(),
        schema.iter().map(|c| c.name()).collect::<Vec<_>>()
    );

    Ok(BookingStore::from_records(records, schema))
}

// ---------------------------------------------------------------------------
// Row conversion
// ---------------------------------------------------------------------------

/// `Ok(None)` when the row has a null in one of the `required` columns.
fn record_from_row(
    row_no: usize,
    raw: &RawRow,
    required: &BTreeSet<Column>,
) -> LoadResult<Option<BookingRecord>> {
    let cell = move |col: Column| raw.get(&col).filter(|v| !v.is_null());

    if required.iter().any(|col| cell(*col).is_none()) {
        return Ok(None);
    }

    let need = |col: Column| {
        cell(col).ok_or_else(|| {
            LoadError::InvalidData(format!("row {row_no}: '{}' is null", col.name()))
        })
    };

    let mut rec = BookingRecord::new(
        label(need(Column::Hotel)?),
        parse_flag(row_no, Column::IsCanceled, need(Column::IsCanceled)?)?,
        parse_count(row_no, Column::LeadTime, need(Column::LeadTime)?)?,
        parse_real(row_no, Column::Adr, need(Column::Adr)?)?,
    );

    let count = |col: Column| cell(col).map(|v| parse_count(row_no, col, v)).transpose();
    let real = |col: Column| cell(col).map(|v| parse_real(row_no, col, v)).transpose();

    rec.arrival_month = cell(Column::ArrivalMonth)
        .map(|v| {
            label(v).parse::<Month>().map_err(|reason| LoadError::Malformed {
                row: row_no,
                column: Column::ArrivalMonth.name(),
                reason,
            })
        })
        .transpose()?;
    rec.market_segment = cell(Column::MarketSegment).map(label);
    rec.stays_in_weekend_nights = count(Column::StaysInWeekendNights)?;
    rec.stays_in_week_nights = count(Column::StaysInWeekNights)?;
    rec.adults = real(Column::Adults)?;
    rec.children = real(Column::Children)?;
    rec.babies = real(Column::Babies)?;
    rec.total_of_special_requests = count(Column::TotalOfSpecialRequests)?;
    rec.booking_changes = count(Column::BookingChanges)?;
    rec.days_in_waiting_list = count(Column::DaysInWaitingList)?;

    Ok(Some(rec))
}

fn malformed(row: usize, col: Column, value: &CellValue, expected: &str) -> LoadError {
    LoadError::Malformed {
        row,
        column: col.name(),
        reason: format!("'{value}' is not {expected}"),
    }
}

fn label(value: &CellValue) -> String {
    match value {
        CellValue::Text(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

fn parse_flag(row: usize, col: Column, value: &CellValue) -> LoadResult<bool> {
    match value {
        CellValue::Bool(b) => Ok(*b),
        CellValue::Text(s) if s.eq_ignore_ascii_case("true") => Ok(true),
        CellValue::Text(s) if s.eq_ignore_ascii_case("false") => Ok(false),
        other => match other.as_f64() {
            Some(v) if v == 0.0 => Ok(false),
            Some(v) if v == 1.0 => Ok(true),
            _ => Err(malformed(row, col, value, "0 or 1")),
        },
    }
}

fn parse_count(row: usize, col: Column, value: &CellValue) -> LoadResult<u32> {
    match value.as_f64() {
        Some(v) if v >= 0.0 && v.fract() == 0.0 && v <= f64::from(u32::MAX) => Ok(v as u32),
        _ => Err(malformed(row, col, value, "a non-negative integer")),
    }
}

fn parse_real(row: usize, col: Column, value: &CellValue) -> LoadResult<f64> {
    match value.as_f64() {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(malformed(row, col, value, "a number")),
    }
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

/// Header row with column names; unrecognised columns are ignored.
fn read_csv(path: &Path) -> LoadResult<(BTreeSet<Column>, Vec<RawRow>)> {
    let mut reader = csv::Reader::from_path(path)?;
    let columns: Vec<Option<Column>> = reader
        .headers()?
        .iter()
        .map(Column::from_header)
        .collect();
    let schema = columns.iter().flatten().copied().collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let row: RawRow = columns
            .iter()
            .zip(record.iter())
            .filter_map(|(col, value)| col.map(|c| (c, guess_cell_type(value))))
            .collect();
        rows.push(row);
    }

    Ok((schema, rows))
}

fn guess_cell_type(s: &str) -> CellValue {
    let s = s.trim();
    if s.is_empty() || NULL_TOKENS.contains(&s) {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::Float(f);
    }
    if s == "true" || s == "false" {
        return CellValue::Bool(s == "true");
    }
    CellValue::Text(s.to_string())
}

// ---------------------------------------------------------------------------
// JSON reader
// ---------------------------------------------------------------------------

/// Records-oriented JSON (`df.to_json(orient='records')`). A recognised key
/// counts as part of the schema if any object carries it.
fn read_json(path: &Path) -> LoadResult<(BTreeSet<Column>, Vec<RawRow>)> {
    let text = std::fs::read_to_string(path)?;
    let root: JsonValue = serde_json::from_str(&text)?;

    let records = root
        .as_array()
        .ok_or_else(|| LoadError::InvalidData("expected top-level JSON array".into()))?;

    let mut schema = BTreeSet::new();
    let mut rows = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .ok_or_else(|| LoadError::InvalidData(format!("row {i} is not a JSON object")))?;

        let mut row = RawRow::new();
        for (key, val) in obj {
            if let Some(col) = Column::from_header(key) {
                schema.insert(col);
                row.insert(col, json_to_cell(val));
            }
        }
        rows.push(row);
    }

    Ok((schema, rows))
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => guess_cell_type(s),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet reader
// ---------------------------------------------------------------------------

/// Flat Parquet file with one column per field. Works with files written by
/// both Pandas (`df.to_parquet()`) and Polars (`df.write_parquet()`).
fn read_parquet(path: &Path) -> LoadResult<(BTreeSet<Column>, Vec<RawRow>)> {
    let file = std::fs::File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

    let columns: Vec<(usize, Column)> = builder
        .schema()
        .fields()
        .iter()
        .enumerate()
        .filter_map(|(i, f)| Column::from_header(f.name()).map(|c| (i, c)))
        .collect();
    let schema = columns.iter().map(|(_, c)| *c).collect();

    let reader = builder.build()?;
    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result?;
        for row in 0..batch.num_rows() {
            let mut raw = RawRow::new();
            for (idx, col) in &columns {
                raw.insert(*col, extract_cell_value(batch.column(*idx), row)?);
            }
            rows.push(raw);
        }
    }

    Ok((schema, rows))
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell_value(col: &ArrayRef, row: usize) -> LoadResult<CellValue> {
    if col.is_null(row) {
        return Ok(CellValue::Null);
    }
    let value = match col.data_type() {
        DataType::Utf8 => CellValue::Text(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => CellValue::Text(col.as_string::<i64>().value(row).to_string()),
        DataType::Boolean => CellValue::Bool(col.as_boolean().value(row)),
        DataType::Int8 => CellValue::Integer(i64::from(col.as_primitive::<Int8Type>().value(row))),
        DataType::Int16 => {
            CellValue::Integer(i64::from(col.as_primitive::<Int16Type>().value(row)))
        }
        DataType::Int32 => {
            CellValue::Integer(i64::from(col.as_primitive::<Int32Type>().value(row)))
        }
        DataType::Int64 => CellValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::UInt8 => {
            CellValue::Integer(i64::from(col.as_primitive::<UInt8Type>().value(row)))
        }
        DataType::UInt16 => {
            CellValue::Integer(i64::from(col.as_primitive::<UInt16Type>().value(row)))
        }
        DataType::UInt32 => {
            CellValue::Integer(i64::from(col.as_primitive::<UInt32Type>().value(row)))
        }
        DataType::UInt64 => {
            let v = col.as_primitive::<UInt64Type>().value(row);
            i64::try_from(v).map_or(CellValue::Float(v as f64), CellValue::Integer)
        }
        DataType::Float32 => {
            CellValue::Float(f64::from(col.as_primitive::<Float32Type>().value(row)))
        }
        DataType::Float64 => CellValue::Float(col.as_primitive::<Float64Type>().value(row)),
        // Dictionary-encoded categoricals and anything else: go through the display form.
        _ => guess_cell_type(&array_value_to_string(col.as_ref(), row)?),
    };
    Ok(value)
}

use std::io::Write;
use std::path::Path;

use csv::{Writer, WriterBuilder};

use crate::error::ExtractError;
use crate::model::FactRow;

/// Header row of the CSV output, in `FactRow` field order.
pub const FACT_COLUMNS: [&str; 13] = [
    "entity",
    "metric",
    "period",
    "fiscal_year",
    "value",
    "unit",
    "page_number",
    "table_index",
    "row_index",
    "column_name",
    "extraction_method",
    "confidence",
    "source_snippet",
];

fn write_rows<W: Write>(writer: &mut Writer<W>, rows: &[FactRow]) -> Result<(), ExtractError> {
    writer.write_record(FACT_COLUMNS)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes `rows` as CSV to `path`. The header row is written even when there
/// are no rows.
///
/// # Errors
///
/// Fails when the file cannot be created or written.
pub fn write_facts_csv(path: &Path, rows: &[FactRow]) -> Result<(), ExtractError> {
    let mut writer = WriterBuilder::new().has_headers(false).from_path(path)?;
    write_rows(&mut writer, rows)
}

/// # Errors
///
/// Fails only if the CSV writer does.
pub fn write_facts_csv_to_string(rows: &[FactRow]) -> Result<String, ExtractError> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::<u8>::new());
    write_rows(&mut writer, rows)?;

    let bytes = writer
        .into_inner()
        .map_err(|error| ExtractError::Csv(error.into_error().into()))?;
    String::from_utf8(bytes)
        .map_err(|error| ExtractError::InvalidOption(format!("invalid utf-8 csv output: {error}")))
}

//! Spreadsheet ingestion for the two call-center exports.
//!
//! Columns are located by their fixed header names, so column order in
//! the export does not matter. Schema normalization happens once here:
//! a pre-computed category column is dropped, and a missing required
//! column or an empty sheet fails the whole run with a descriptive
//! error rather than producing partial output.

use std::path::Path;

use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use tracing::warn;

use crate::aggregate::coerce_identifier;
use crate::error::AnalysisError;
use crate::model::{SourceRow, SourceTag};

const ID_COLUMN: &str = "Id";
const EXTERNAL_ID_COLUMN: &str = "Id Externe";
const STATUS_COLUMN: &str = "Statut";
const EXAM_COLUMN: &str = "Examen Identifié";

/// Stale exports sometimes carry a pre-computed category column; it is
/// ignored so classification always runs from scratch.
const LEGACY_CATEGORY_COLUMN: &str = "Catégorie";

/// Read all call records from the first sheet of an export workbook.
pub fn read_source_rows(path: &Path, tag: SourceTag) -> Result<Vec<SourceRow>, AnalysisError> {
    let source_name = display_name(path);

    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| AnalysisError::EmptySheet(source_name.clone()))?;
    let range = workbook.worksheet_range(&sheet)?;

    rows_from_range(&range, tag, &source_name)
}

fn rows_from_range(
    range: &Range<Data>,
    tag: SourceTag,
    source_name: &str,
) -> Result<Vec<SourceRow>, AnalysisError> {
    let mut row_iter = range.rows();
    let header_row = row_iter
        .next()
        .ok_or_else(|| AnalysisError::EmptySheet(source_name.to_string()))?;

    let headers: Vec<String> = header_row
        .iter()
        .map(|cell| cell_to_string(cell).trim().to_string())
        .collect();

    let column = |name: &str| -> Result<usize, AnalysisError> {
        headers
            .iter()
            .position(|header| header == name)
            .ok_or_else(|| AnalysisError::MissingColumn {
                column: name.to_string(),
                source_name: source_name.to_string(),
            })
    };

    let id_col = column(ID_COLUMN)?;
    let external_id_col = column(EXTERNAL_ID_COLUMN)?;
    let status_col = column(STATUS_COLUMN)?;
    let exam_col = column(EXAM_COLUMN)?;

    if headers.iter().any(|header| header == LEGACY_CATEGORY_COLUMN) {
        warn!(
            source = source_name,
            "dropping pre-existing '{LEGACY_CATEGORY_COLUMN}' column from export"
        );
    }

    let mut rows = Vec::new();
    for cells in row_iter {
        let cell = |idx: usize| cells.get(idx).map(cell_to_string).unwrap_or_default();

        let external_id = cell(external_id_col);
        rows.push(SourceRow {
            call_id: cell(id_col),
            external_id: (!external_id.is_empty()).then_some(external_id),
            status: cell(status_col),
            exam_field: cell(exam_col),
            tag,
        });
    }

    Ok(rows)
}

/// Stringify a cell, applying the same numeric coercion policy as
/// identifiers so number cells don't surface as `123.0`.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(text) => text.trim().to_string(),
        Data::Float(value) => coerce_identifier(&value.to_string()),
        Data::Int(value) => value.to_string(),
        Data::Bool(value) => value.to_string(),
        Data::DateTime(value) => coerce_identifier(&value.as_f64().to_string()),
        Data::DateTimeIso(text) | Data::DurationIso(text) => text.clone(),
        // Formula error cells carry no usable value.
        Data::Error(_) => String::new(),
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

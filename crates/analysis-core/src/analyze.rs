//! One-shot analysis pass: ingest both exports, extract and classify
//! mentions, aggregate, and render the report workbook.

use std::path::Path;

use tracing::info;

use crate::aggregate::aggregate;
use crate::classify::CategoryMatcher;
use crate::error::AnalysisError;
use crate::extract::extract;
use crate::ingest::read_source_rows;
use crate::model::{
    Category, CategorySummary, ExamBreakdownRow, SourceRow, SourceTag, TRANSFERRED_STATUS,
};
use crate::reference::ReferenceTable;

/// Result of one analysis pass. Request-local; nothing is shared or
/// persisted across runs.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    /// Transferred call count in the "not found" export.
    pub transferred_not_found: usize,
    /// Transferred call count in the "not authorized" export.
    pub transferred_not_authorized: usize,
    pub summaries: Vec<CategorySummary>,
    pub breakdowns: Vec<ExamBreakdownRow>,
    /// The rendered report workbook.
    pub workbook: Vec<u8>,
}

impl AnalysisReport {
    /// Total transferred calls across both exports.
    pub fn total_calls(&self) -> usize {
        self.transferred_not_found + self.transferred_not_authorized
    }

    /// Number of distinct (category, exam name) pairs.
    pub fn unique_exams(&self) -> usize {
        self.breakdowns.len()
    }

    /// Number of categories with at least one mention.
    pub fn categories_found(&self) -> usize {
        self.summaries.len()
    }

    /// Mention count in the mis-transcription bucket.
    pub fn bugs_detected(&self) -> usize {
        self.summaries
            .iter()
            .find(|summary| summary.category == Category::IntitulesIncompris)
            .map(|summary| summary.total)
            .unwrap_or(0)
    }
}

/// Run the full pipeline over the two export files.
pub fn analyze(
    not_found_path: &Path,
    not_authorized_path: &Path,
    reference: &ReferenceTable,
) -> Result<AnalysisReport, AnalysisError> {
    let not_found_rows = read_source_rows(not_found_path, SourceTag::ExamNotFound)?;
    let not_authorized_rows =
        read_source_rows(not_authorized_path, SourceTag::ExamNotAuthorized)?;

    let transferred = |rows: &[SourceRow]| {
        rows.iter()
            .filter(|row| row.status == TRANSFERRED_STATUS)
            .count()
    };
    let transferred_not_found = transferred(&not_found_rows);
    let transferred_not_authorized = transferred(&not_authorized_rows);
    info!(
        not_found = transferred_not_found,
        not_authorized = transferred_not_authorized,
        "transferred calls loaded"
    );

    let matcher = CategoryMatcher::new();
    let mut mentions = extract(&not_found_rows, &matcher, reference);
    mentions.extend(extract(&not_authorized_rows, &matcher, reference));
    info!(mentions = mentions.len(), "exam mentions extracted");

    let (summaries, breakdowns) = aggregate(&mentions);
    info!(
        categories = summaries.len(),
        unique_exams = breakdowns.len(),
        "aggregation complete"
    );

    let workbook = crate::report::render(&summaries, &breakdowns)?;

    Ok(AnalysisReport {
        transferred_not_found,
        transferred_not_authorized,
        summaries,
        breakdowns,
        workbook,
    })
}

//! Record extractor: turns raw source rows into classified exam mentions.
//!
//! Only rows in the transferred status are actionable; everything else is
//! expected business filtering, not an error. The exam field is
//! multi-valued (`;`-separated), so one row can yield several mentions.

use tracing::warn;

use crate::classify::CategoryMatcher;
use crate::model::{Category, ExamMention, SourceRow, TRANSFERRED_STATUS};
use crate::reference::ReferenceTable;

/// Split the multi-valued exam field into trimmed, non-empty pieces.
pub fn split_exam_field(field: &str) -> Vec<&str> {
    field
        .split(';')
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect()
}

/// Extract one classified [`ExamMention`] per non-empty exam name in each
/// transferred row.
///
/// Mentions whose classification collides with a source-tag label are a
/// data-integrity anomaly (tags and categories must be disjoint label
/// spaces); they are excluded from aggregation and logged for operator
/// visibility rather than surfaced as an error.
pub fn extract(
    rows: &[SourceRow],
    matcher: &CategoryMatcher,
    reference: &ReferenceTable,
) -> Vec<ExamMention> {
    let mut mentions = Vec::new();

    for row in rows.iter().filter(|row| row.status == TRANSFERRED_STATUS) {
        for piece in split_exam_field(&row.exam_field) {
            let category = matcher.classify(piece, reference);

            if collides_with_tag_namespace(category) {
                warn!(
                    exam = piece,
                    category = category.label(),
                    call_id = %row.call_id,
                    "classification collides with a source-tag label, mention excluded"
                );
                continue;
            }

            mentions.push(ExamMention {
                exam_name: piece.to_string(),
                category,
                tag: row.tag,
                call_id: row.call_id.clone(),
                external_id: row.external_id.clone(),
            });
        }
    }

    mentions
}

/// Guard against a category label leaking into the tag namespace. The
/// label spaces are disjoint by construction, so a hit here means the
/// rule tables were corrupted, not a normal business path.
fn collides_with_tag_namespace(category: Category) -> bool {
    category.label().to_lowercase().contains("exam_")
}

use serde::{Deserialize, Serialize};

/// Row status that marks a call as actionable. All other statuses are
/// dropped by the extractor.
pub const TRANSFERRED_STATUS: &str = "Transféré";

/// Which of the two call-center exports a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceTag {
    /// Export of calls where the requested exam was not found.
    ExamNotFound,
    /// Export of calls where the requested exam was not authorized.
    ExamNotAuthorized,
}

impl SourceTag {
    /// Wire label used in report columns and the JSON payload.
    pub fn label(self) -> &'static str {
        match self {
            SourceTag::ExamNotFound => "exam_not_found",
            SourceTag::ExamNotAuthorized => "exam_not_authorized",
        }
    }
}

/// Exam category assigned by the keyword matcher.
///
/// The declared order matters: summaries are emitted domain categories
/// first, then the mis-transcription bucket, then the two fallbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "IRM")]
    Irm,
    #[serde(rename = "SCANNER")]
    Scanner,
    #[serde(rename = "RADIOGRAPHIE")]
    Radiographie,
    #[serde(rename = "MAMMOGRAPHIE")]
    Mammographie,
    #[serde(rename = "ECHOGRAPHIE")]
    Echographie,
    #[serde(rename = "CONE BEAM")]
    ConeBeam,
    #[serde(rename = "DENTAIRE")]
    Dentaire,
    /// Bucket for text the matcher believes is not an exam name at all
    /// (conversational filler captured by the voice bot).
    #[serde(rename = "INTITULES INCOMPRIS")]
    IntitulesIncompris,
    /// No keyword matched.
    #[serde(rename = "AUTRE")]
    Autre,
    /// Empty or whitespace-only exam text.
    #[serde(rename = "INCONNU")]
    Inconnu,
}

impl Category {
    /// All categories in declared enumeration order.
    pub const DECLARED_ORDER: [Category; 10] = [
        Category::Irm,
        Category::Scanner,
        Category::Radiographie,
        Category::Mammographie,
        Category::Echographie,
        Category::ConeBeam,
        Category::Dentaire,
        Category::IntitulesIncompris,
        Category::Autre,
        Category::Inconnu,
    ];

    /// Display label, as it appears in the report and the JSON payload.
    pub fn label(self) -> &'static str {
        match self {
            Category::Irm => "IRM",
            Category::Scanner => "SCANNER",
            Category::Radiographie => "RADIOGRAPHIE",
            Category::Mammographie => "MAMMOGRAPHIE",
            Category::Echographie => "ECHOGRAPHIE",
            Category::ConeBeam => "CONE BEAM",
            Category::Dentaire => "DENTAIRE",
            Category::IntitulesIncompris => "INTITULES INCOMPRIS",
            Category::Autre => "AUTRE",
            Category::Inconnu => "INCONNU",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One call record read from an input export. Read once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRow {
    /// Call identifier (opaque).
    pub call_id: String,
    /// External identifier (opaque); absent for some calls.
    pub external_id: Option<String>,
    /// Row status; only [`TRANSFERRED_STATUS`] is actionable.
    pub status: String,
    /// Free text, possibly several exam names separated by `;`.
    pub exam_field: String,
    /// Which export the row came from.
    pub tag: SourceTag,
}

/// One parsed exam name occurrence.
///
/// A [`SourceRow`] with N non-empty `;`-separated exam names produces
/// exactly N mentions, all sharing the row's tag and identifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamMention {
    pub exam_name: String,
    pub category: Category,
    pub tag: SourceTag,
    pub call_id: String,
    pub external_id: Option<String>,
}

/// One row of the per-category summary view. Categories with zero
/// mentions are omitted entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: Category,
    /// Total mention count across both exports.
    pub total: usize,
    pub not_found: usize,
    pub not_authorized: usize,
    /// Multi-line breakdown, one line per distinct exam name:
    /// `{name}§{count} (NF:{nf}|NA:{na})§{id|id|…}`.
    pub all_exams: String,
}

/// One row per unique (category, exam name) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamBreakdownRow {
    pub category: Category,
    pub exam_name: String,
    /// Number of mentions of this pair; equals `not_found + not_authorized`.
    pub occurrences: usize,
    pub not_found: usize,
    pub not_authorized: usize,
    /// External identifier of the first mention of this pair; may be
    /// absent even when later mentions carry one.
    pub external_id: Option<String>,
    /// Every external identifier seen for this pair. Feeds the report's
    /// cell annotations; not a visible report column.
    pub all_external_ids: Vec<String>,
}

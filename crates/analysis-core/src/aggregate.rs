//! Aggregator: groups classified mentions into the two report views.
//!
//! Both views derive from one (category, exam name) grouping pass:
//! per-category summaries in declared category order, and per-pair
//! breakdown rows in the lexical category order the report sheets use.

use std::collections::HashMap;

use crate::model::{Category, CategorySummary, ExamBreakdownRow, ExamMention, SourceTag};

/// Render an identifier for display.
///
/// Spreadsheet number cells round-trip as floats, so a stored `123.0`
/// must render as `123`. Any value that parses as a float with a zero
/// fractional part becomes its integer string; everything else is kept
/// as-is.
pub fn coerce_identifier(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Ok(value) = trimmed.parse::<f64>() {
        if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
            return (value as i64).to_string();
        }
    }
    trimmed.to_string()
}

#[derive(Debug, Default)]
struct PairStats {
    not_found: usize,
    not_authorized: usize,
    /// Identifier of the first mention of the pair; stays `None` when
    /// that mention carried no identifier, even if later ones do.
    representative: Option<String>,
    /// Every non-empty identifier, in encounter order.
    external_ids: Vec<String>,
}

impl PairStats {
    fn total(&self) -> usize {
        self.not_found + self.not_authorized
    }
}

/// Build the per-category summary view and the per-exam breakdown view.
///
/// Conservation invariant: the summary totals sum to `mentions.len()`.
pub fn aggregate(mentions: &[ExamMention]) -> (Vec<CategorySummary>, Vec<ExamBreakdownRow>) {
    let mut pairs: HashMap<(Category, String), PairStats> = HashMap::new();

    for mention in mentions {
        let key = (mention.category, mention.exam_name.clone());
        let first_mention = !pairs.contains_key(&key);
        let stats = pairs.entry(key).or_default();

        let identifier = mention
            .external_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(coerce_identifier);

        if first_mention {
            stats.representative = identifier.clone();
        }
        if let Some(id) = identifier {
            stats.external_ids.push(id);
        }

        match mention.tag {
            SourceTag::ExamNotFound => stats.not_found += 1,
            SourceTag::ExamNotAuthorized => stats.not_authorized += 1,
        }
    }

    let summaries = build_summaries(&pairs);
    let breakdowns = build_breakdowns(pairs);

    (summaries, breakdowns)
}

fn build_summaries(pairs: &HashMap<(Category, String), PairStats>) -> Vec<CategorySummary> {
    let mut summaries = Vec::new();

    for category in Category::DECLARED_ORDER {
        let mut exams: Vec<(&str, &PairStats)> = pairs
            .iter()
            .filter(|((cat, _), _)| *cat == category)
            .map(|((_, name), stats)| (name.as_str(), stats))
            .collect();
        if exams.is_empty() {
            continue;
        }

        // Descending frequency, ties broken by ascending exam name.
        exams.sort_by(|a, b| {
            b.1.total()
                .cmp(&a.1.total())
                .then_with(|| a.0.cmp(b.0))
        });

        let lines: Vec<String> = exams
            .iter()
            .map(|(name, stats)| {
                format!(
                    "{name}§{total} (NF:{nf}|NA:{na})§{ids}",
                    total = stats.total(),
                    nf = stats.not_found,
                    na = stats.not_authorized,
                    ids = stats.external_ids.join("|")
                )
            })
            .collect();

        summaries.push(CategorySummary {
            category,
            total: exams.iter().map(|(_, stats)| stats.total()).sum(),
            not_found: exams.iter().map(|(_, stats)| stats.not_found).sum(),
            not_authorized: exams.iter().map(|(_, stats)| stats.not_authorized).sum(),
            all_exams: lines.join("\n"),
        });
    }

    summaries
}

fn build_breakdowns(pairs: HashMap<(Category, String), PairStats>) -> Vec<ExamBreakdownRow> {
    let mut breakdowns: Vec<ExamBreakdownRow> = pairs
        .into_iter()
        .map(|((category, exam_name), stats)| ExamBreakdownRow {
            category,
            exam_name,
            occurrences: stats.total(),
            not_found: stats.not_found,
            not_authorized: stats.not_authorized,
            external_id: stats.representative,
            all_external_ids: stats.external_ids,
        })
        .collect();

    // Sheet emission order: lexical category label, then descending
    // occurrences, then ascending exam name.
    breakdowns.sort_by(|a, b| {
        a.category
            .label()
            .cmp(b.category.label())
            .then_with(|| b.occurrences.cmp(&a.occurrences))
            .then_with(|| a.exam_name.cmp(&b.exam_name))
    });

    breakdowns
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mention(
        exam: &str,
        category: Category,
        tag: SourceTag,
        external_id: Option<&str>,
    ) -> ExamMention {
        ExamMention {
            exam_name: exam.to_string(),
            category,
            tag,
            call_id: "call".to_string(),
            external_id: external_id.map(str::to_string),
        }
    }

    #[test]
    fn coerces_float_identifiers_to_integer_strings() {
        assert_eq!(coerce_identifier("123.0"), "123");
        assert_eq!(coerce_identifier(" 45.00 "), "45");
        assert_eq!(coerce_identifier("123"), "123");
        assert_eq!(coerce_identifier("1.5"), "1.5");
        assert_eq!(coerce_identifier("ABC-1"), "ABC-1");
        assert_eq!(coerce_identifier(""), "");
    }

    #[test]
    fn summary_totals_conserve_mention_count() {
        let mentions = vec![
            mention("IRM lombaire", Category::Irm, SourceTag::ExamNotFound, Some("1")),
            mention("IRM lombaire", Category::Irm, SourceTag::ExamNotAuthorized, Some("2")),
            mention("Scanner abdo", Category::Scanner, SourceTag::ExamNotFound, None),
            mention("Bonjour", Category::IntitulesIncompris, SourceTag::ExamNotAuthorized, Some("3")),
        ];

        let (summaries, _) = aggregate(&mentions);
        let sum: usize = summaries.iter().map(|s| s.total).sum();
        assert_eq!(sum, mentions.len());
    }

    #[test]
    fn summaries_follow_declared_order_and_skip_empty_categories() {
        let mentions = vec![
            mention("Bonjour", Category::IntitulesIncompris, SourceTag::ExamNotFound, None),
            mention("IRM lombaire", Category::Irm, SourceTag::ExamNotFound, None),
            mention("Echo rénale", Category::Echographie, SourceTag::ExamNotAuthorized, None),
        ];

        let (summaries, _) = aggregate(&mentions);
        let order: Vec<Category> = summaries.iter().map(|s| s.category).collect();
        assert_eq!(
            order,
            vec![Category::Irm, Category::Echographie, Category::IntitulesIncompris]
        );
    }

    #[test]
    fn exam_lines_sort_by_frequency_then_name() {
        let mentions = vec![
            mention("IRM lombaire", Category::Irm, SourceTag::ExamNotFound, None),
            mention("IRM cérébrale", Category::Irm, SourceTag::ExamNotFound, None),
            mention("IRM cardiaque", Category::Irm, SourceTag::ExamNotFound, None),
            mention("IRM cérébrale", Category::Irm, SourceTag::ExamNotAuthorized, None),
        ];

        let (summaries, _) = aggregate(&mentions);
        let lines: Vec<&str> = summaries[0].all_exams.lines().collect();
        assert!(lines[0].starts_with("IRM cérébrale§2"));
        // Tie at one occurrence each: lexical ascending.
        assert!(lines[1].starts_with("IRM cardiaque§1"));
        assert!(lines[2].starts_with("IRM lombaire§1"));
    }

    #[test]
    fn exam_line_encodes_counts_and_identifiers() {
        let mentions = vec![
            mention("IRM lombaire", Category::Irm, SourceTag::ExamNotFound, Some("123.0")),
            mention("IRM lombaire", Category::Irm, SourceTag::ExamNotAuthorized, Some("456")),
        ];

        let (summaries, _) = aggregate(&mentions);
        assert_eq!(summaries[0].all_exams, "IRM lombaire§2 (NF:1|NA:1)§123|456");
    }

    #[test]
    fn breakdown_pivots_tags_and_sums_occurrences() {
        let mentions = vec![
            mention("Scanner abdo", Category::Scanner, SourceTag::ExamNotFound, Some("1")),
            mention("Scanner abdo", Category::Scanner, SourceTag::ExamNotFound, Some("2")),
            mention("Scanner abdo", Category::Scanner, SourceTag::ExamNotAuthorized, Some("3")),
        ];

        let (_, breakdowns) = aggregate(&mentions);
        assert_eq!(breakdowns.len(), 1);
        let row = &breakdowns[0];
        assert_eq!(row.occurrences, 3);
        assert_eq!(row.not_found, 2);
        assert_eq!(row.not_authorized, 1);
        assert_eq!(row.external_id.as_deref(), Some("1"));
        assert_eq!(row.all_external_ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn representative_identifier_is_the_first_mention_even_when_absent() {
        let mentions = vec![
            mention("IRM lombaire", Category::Irm, SourceTag::ExamNotFound, None),
            mention("IRM lombaire", Category::Irm, SourceTag::ExamNotFound, Some("42")),
        ];

        let (_, breakdowns) = aggregate(&mentions);
        assert_eq!(breakdowns[0].external_id, None);
        assert_eq!(breakdowns[0].all_external_ids, vec!["42"]);
    }

    #[test]
    fn breakdowns_sort_by_category_label_then_occurrences() {
        let mentions = vec![
            mention("Scanner abdo", Category::Scanner, SourceTag::ExamNotFound, None),
            mention("IRM lombaire", Category::Irm, SourceTag::ExamNotFound, None),
            mention("IRM cérébrale", Category::Irm, SourceTag::ExamNotFound, None),
            mention("IRM cérébrale", Category::Irm, SourceTag::ExamNotFound, None),
            mention("Divers", Category::Autre, SourceTag::ExamNotFound, None),
        ];

        let (_, breakdowns) = aggregate(&mentions);
        let keys: Vec<(&str, &str)> = breakdowns
            .iter()
            .map(|row| (row.category.label(), row.exam_name.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("AUTRE", "Divers"),
                ("IRM", "IRM cérébrale"),
                ("IRM", "IRM lombaire"),
                ("SCANNER", "Scanner abdo"),
            ]
        );
    }

    #[test]
    fn aggregation_is_idempotent() {
        let mentions = vec![
            mention("IRM lombaire", Category::Irm, SourceTag::ExamNotFound, Some("9.0")),
            mention("Scanner abdo", Category::Scanner, SourceTag::ExamNotAuthorized, Some("8")),
            mention("Scanner abdo", Category::Scanner, SourceTag::ExamNotFound, None),
        ];

        let first = aggregate(&mentions);
        let second = aggregate(&mentions);
        assert_eq!(first, second);
    }

    #[test]
    fn no_mentions_produce_no_rows() {
        let (summaries, breakdowns) = aggregate(&[]);
        assert!(summaries.is_empty());
        assert!(breakdowns.is_empty());
    }
}

//! Category matcher: maps a free-text exam name to a fixed category.
//!
//! Matching is a two-stage scan. Mis-transcription patterns run first and
//! take priority over every domain category, because a voice-bot
//! mis-transcription ("ma mère a besoin d'un scanner") can accidentally
//! contain a medical keyword. Domain categories are then tested in
//! declared order with substring keywords; the first category with a
//! matching keyword wins, so ordering of both lists is load-bearing.

use regex::Regex;

use crate::model::Category;
use crate::reference::ReferenceTable;

/// Ordered domain category rules. Declaration order decides ties: the
/// scan stops at the first category with a matching keyword.
const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (Category::Irm, &["irm", "imagerie par résonance magnétique"]),
    (
        Category::Scanner,
        &[
            "scanner",
            "tdm",
            "tomodensitométrie",
            "ct",
            "coroscanner",
            "angioscanner",
        ],
    ),
    (
        Category::Radiographie,
        &["radio", "radiographie", "rx", "téléradiographie"],
    ),
    (Category::Mammographie, &["mammographie", "mammo"]),
    (
        Category::Echographie,
        &["échographie", "echographie", "écho", "echo", "doppler"],
    ),
    (Category::ConeBeam, &["cone beam", "conebeam"]),
    (
        Category::Dentaire,
        &["dentaire", "panoramique dentaire", "orthopantomogramme"],
    ),
];

/// Patterns that identify voice-bot mis-transcriptions: family-relation
/// words, first-person requests, age mentions, greetings, generic
/// consultation requests.
const INCOMPREHENSIBLE_PATTERNS: &[&str] = &[
    r"ma mère",
    r"ma femme",
    r"mon mari",
    r"mon père",
    r"un.*pour", // "Un scanner pour..."
    r"je veux",
    r"j'ai besoin",
    r"\d+\s*ans", // age
    r"bonjour",
    r"consultation",
];

/// Compiled matcher over the fixed rule set.
pub struct CategoryMatcher {
    incomprehensible: Vec<Regex>,
}

impl CategoryMatcher {
    pub fn new() -> Self {
        let incomprehensible = INCOMPREHENSIBLE_PATTERNS
            .iter()
            .map(|pattern| Regex::new(pattern).expect("valid regex"))
            .collect();
        Self { incomprehensible }
    }

    /// Classify one exam name.
    ///
    /// Deterministic and total: never fails, always returns one of the
    /// fixed labels, for any input including empty strings. The reference
    /// catalog is not consulted by the keyword rules yet; it is threaded
    /// through so catalog-aware matching can be added without changing
    /// call sites.
    pub fn classify(&self, exam_text: &str, _reference: &ReferenceTable) -> Category {
        let trimmed = exam_text.trim();
        if trimmed.is_empty() {
            return Category::Inconnu;
        }

        let lowered = trimmed.to_lowercase();

        if self
            .incomprehensible
            .iter()
            .any(|pattern| pattern.is_match(&lowered))
        {
            return Category::IntitulesIncompris;
        }

        for (category, keywords) in CATEGORY_KEYWORDS {
            if keywords.iter().any(|keyword| lowered.contains(keyword)) {
                return *category;
            }
        }

        Category::Autre
    }
}

impl Default for CategoryMatcher {
    fn default() -> Self {
        Self::new()
    }
}

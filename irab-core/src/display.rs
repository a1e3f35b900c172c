//! Display Records
//!
//! Turns a validated result into what the surfaces show: a colour category per
//! role, per-word cards and a condensed summary table.

use serde::{Deserialize, Serialize};
use unicode_width::UnicodeWidthStr;

use crate::response::{AnalysisResult, WordAnalysis};

/// Sample sentences offered to new users.
pub const EXAMPLE_SENTENCES: [&str; 7] = [
    "ذهب الولد إلى المدرسة",
    "قرأ الطالب الكتاب",
    "كتب المعلم الدرس على السبورة",
    "جاء الرجل من السوق",
    "إن الله غفور رحيم",
    "تفتح الأزهار في الربيع",
    "كان الطقس جميلاً في الصباح",
];

/// Broad grammatical category of a role, used for colour coding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleCategory {
    Subject,
    Object,
    Topic,
    Predicate,
    Genitive,
    Adjective,
    Circumstantial,
    Verb,
    Particle,
    Adverb,
    Other,
}

/// Matched in order; the first keyword found in the role wins.
const ARABIC_KEYWORDS: [(&str, RoleCategory); 10] = [
    ("فاعل", RoleCategory::Subject),
    ("مفعول به", RoleCategory::Object),
    ("مبتدأ", RoleCategory::Topic),
    ("خبر", RoleCategory::Predicate),
    ("مضاف إليه", RoleCategory::Genitive),
    ("نعت", RoleCategory::Adjective),
    ("حال", RoleCategory::Circumstantial),
    ("فعل", RoleCategory::Verb),
    ("حرف", RoleCategory::Particle),
    ("ظرف", RoleCategory::Adverb),
];

const ENGLISH_KEYWORDS: [(&str, RoleCategory); 12] = [
    ("subject", RoleCategory::Subject),
    ("object", RoleCategory::Object),
    ("topic", RoleCategory::Topic),
    ("predicate", RoleCategory::Predicate),
    ("genitive", RoleCategory::Genitive),
    ("adjective", RoleCategory::Adjective),
    ("circumstantial", RoleCategory::Circumstantial),
    ("verb", RoleCategory::Verb),
    ("preposition", RoleCategory::Particle),
    ("particle", RoleCategory::Particle),
    ("adverb", RoleCategory::Adverb),
    ("conjunction", RoleCategory::Particle),
];

impl RoleCategory {
    pub fn classify(role: &str) -> Self {
        let stripped = irab_text::strip_diacritics(role);
        if let Some((_, category)) = ARABIC_KEYWORDS
            .iter()
            .find(|(keyword, _)| stripped.contains(keyword))
        {
            return *category;
        }

        let lowered = role.to_lowercase();
        ENGLISH_KEYWORDS
            .iter()
            .find(|(keyword, _)| lowered.contains(keyword))
            .map(|(_, category)| *category)
            .unwrap_or(RoleCategory::Other)
    }

    pub fn color(&self) -> &'static str {
        match self {
            RoleCategory::Subject => "#2e7d32",
            RoleCategory::Object => "#1565c0",
            RoleCategory::Topic => "#e65100",
            RoleCategory::Predicate => "#ad1457",
            RoleCategory::Genitive => "#6a1b9a",
            RoleCategory::Adjective => "#00838f",
            RoleCategory::Circumstantial => "#f9a825",
            RoleCategory::Verb => "#4e342e",
            RoleCategory::Particle => "#546e7a",
            RoleCategory::Adverb => "#558b2f",
            RoleCategory::Other => "#37474f",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RoleCategory::Subject => "subject",
            RoleCategory::Object => "object",
            RoleCategory::Topic => "topic",
            RoleCategory::Predicate => "predicate",
            RoleCategory::Genitive => "genitive",
            RoleCategory::Adjective => "adjective",
            RoleCategory::Circumstantial => "circumstantial",
            RoleCategory::Verb => "verb",
            RoleCategory::Particle => "particle",
            RoleCategory::Adverb => "adverb",
            RoleCategory::Other => "other",
        }
    }
}

/// One row of the condensed table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub word: String,
    pub role: String,
    pub case_marker: String,
    pub details: String,
    pub explanation: String,
    pub category: RoleCategory,
    pub color: String,
}

impl From<&WordAnalysis> for SummaryRow {
    fn from(word: &WordAnalysis) -> Self {
        let category = RoleCategory::classify(&word.role);
        Self {
            word: word.word.clone(),
            role: word.role.clone(),
            case_marker: word.case_marker.clone(),
            details: word.attributes.describe(),
            explanation: word.explanation.clone(),
            category,
            color: category.color().to_string(),
        }
    }
}

pub fn summary_rows(result: &AnalysisResult) -> Vec<SummaryRow> {
    result.iter().map(SummaryRow::from).collect()
}

/// Full breakdown of one word, as a block of text.
pub fn render_card(word: &WordAnalysis) -> String {
    let row = SummaryRow::from(word);
    let mut card = format!("{}. {}  [{}]\n", word.index + 1, row.word, row.category.label());
    card.push_str(&format!("   الإعراب: {}\n", row.role));
    card.push_str(&format!("   العلامة: {}\n", row.case_marker));
    if !row.details.is_empty() {
        card.push_str(&format!("   التفاصيل: {}\n", row.details));
    }
    if !row.explanation.is_empty() {
        card.push_str(&format!("   {}\n", row.explanation));
    }
    card
}

const TABLE_HEADERS: [&str; 5] = ["الكلمة", "الإعراب", "العلامة", "التفاصيل", "Explanation"];

/// Condensed table, columns padded by display width.
pub fn render_table(rows: &[SummaryRow]) -> String {
    let cells: Vec<[&str; 5]> = rows
        .iter()
        .map(|row| {
            [
                row.word.as_str(),
                row.role.as_str(),
                row.case_marker.as_str(),
                row.details.as_str(),
                row.explanation.as_str(),
            ]
        })
        .collect();

    let mut widths = TABLE_HEADERS.map(|header| header.width());
    for line in &cells {
        for (width, cell) in widths.iter_mut().zip(line) {
            *width = (*width).max(cell.width());
        }
    }

    let mut out = String::new();
    push_line(&mut out, &TABLE_HEADERS, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&rule.join("-+-"));
    out.push('\n');
    for line in &cells {
        push_line(&mut out, line, &widths);
    }
    out
}

fn push_line(out: &mut String, cells: &[&str; 5], widths: &[usize; 5]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{}{}", cell, " ".repeat(width - cell.width())))
        .collect();
    out.push_str(padded.join(" | ").trim_end());
    out.push('\n');
}

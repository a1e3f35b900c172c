//! Response Validation
//!
//! The reasoning service is an untrusted boundary: its answer is parsed and
//! checked against the request contract, never repaired or reordered.

use std::collections::BTreeMap;

use irab_text::FeatureRecord;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::AnalysisError;

/// Fields every entry must carry.
pub const REQUIRED_FIELDS: [&str; 3] = ["role", "case_marker", "attributes"];

/// Morphological attributes of a word as reported by the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definiteness: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    /// Anything else the service reported (tense, mood, ...).
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

impl Attributes {
    /// One-line human readable summary, known attributes first.
    pub fn describe(&self) -> String {
        let known = [&self.definiteness, &self.gender, &self.number]
            .into_iter()
            .flatten()
            .map(|value| value.trim().to_string());
        let extra = self.other.iter().filter_map(|(key, value)| match value {
            Value::Null => None,
            Value::String(s) => Some(format!("{key}: {}", s.trim())),
            other => Some(format!("{key}: {other}")),
        });
        known
            .chain(extra)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Grammatical analysis of one token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordAnalysis {
    pub index: usize,
    /// The word as echoed by the service; may be empty.
    pub word: String,
    pub role: String,
    pub case_marker: String,
    pub attributes: Attributes,
    pub explanation: String,
}

/// Ordered per-word analyses, one per input token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalysisResult {
    words: Vec<WordAnalysis>,
}

impl AnalysisResult {
    pub fn words(&self) -> &[WordAnalysis] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, WordAnalysis> {
        self.words.iter()
    }

    pub fn into_words(self) -> Vec<WordAnalysis> {
        self.words
    }
}

impl<'a> IntoIterator for &'a AnalysisResult {
    type Item = &'a WordAnalysis;
    type IntoIter = std::slice::Iter<'a, WordAnalysis>;

    fn into_iter(self) -> Self::IntoIter {
        self.words.iter()
    }
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(default)]
    word: Option<String>,
    role: String,
    case_marker: String,
    attributes: Attributes,
    #[serde(default)]
    explanation: Option<String>,
}

/// Validate a raw service response against the expected token count.
pub fn validate(raw_response: &str, expected_token_count: usize) -> Result<AnalysisResult, AnalysisError> {
    let value: Value = serde_json::from_str(raw_response)
        .map_err(|e| AnalysisError::MalformedResponse(format!("response is not valid JSON: {e}")))?;

    let entries = value.as_array().ok_or_else(|| {
        AnalysisError::MalformedResponse("expected a JSON array of word entries".into())
    })?;

    if entries.len() != expected_token_count {
        return Err(AnalysisError::TokenCountMismatch {
            expected: expected_token_count,
            received: entries.len(),
        });
    }

    let words = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| parse_entry(index, entry))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(words = words.len(), "response validated");
    Ok(AnalysisResult { words })
}

fn parse_entry(index: usize, entry: &Value) -> Result<WordAnalysis, AnalysisError> {
    let object = entry.as_object().ok_or_else(|| {
        AnalysisError::MalformedResponse(format!("entry {index} is not a JSON object"))
    })?;

    for field in REQUIRED_FIELDS {
        if matches!(object.get(field), None | Some(Value::Null)) {
            return Err(AnalysisError::MissingField { index, field });
        }
    }

    let raw: RawEntry = serde_json::from_value(entry.clone())
        .map_err(|e| AnalysisError::MalformedResponse(format!("entry {index}: {e}")))?;

    Ok(WordAnalysis {
        index,
        word: raw.word.unwrap_or_default(),
        role: raw.role,
        case_marker: raw.case_marker,
        attributes: raw.attributes,
        explanation: raw.explanation.unwrap_or_default(),
    })
}

/// Check that every echoed word is the token at the same position.
///
/// Entries that echo no word are accepted. Nothing is realigned: the first
/// disagreement is reported as [`AnalysisError::WordMismatch`].
pub fn check_alignment(result: &AnalysisResult, features: &[FeatureRecord]) -> Result<(), AnalysisError> {
    if result.len() != features.len() {
        return Err(AnalysisError::TokenCountMismatch {
            expected: features.len(),
            received: result.len(),
        });
    }

    for (word, feature) in result.iter().zip(features) {
        let echoed: String = irab_text::extract(&word.word)
            .into_iter()
            .map(|record| record.normalized)
            .collect();
        if echoed.is_empty() {
            continue;
        }
        if echoed != feature.normalized {
            return Err(AnalysisError::WordMismatch {
                index: word.index,
                expected: feature.surface.clone(),
                received: word.word.clone(),
            });
        }
    }
    Ok(())
}

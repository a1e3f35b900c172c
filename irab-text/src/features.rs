//! Feature Extraction
//!
//! Turns a sentence into one [`FeatureRecord`] per token: base form, normalized
//! form, definite article flag and sun/moon class.

use serde::{Deserialize, Serialize};

use crate::arabic::{
    strip_diacritics, strip_last_haraka, ArabicNormalizer, DEFINITE_ARTICLE, MOON_LETTERS,
    SUN_LETTERS,
};
use crate::tokenizer::{tokenize, Token};

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("input is not valid UTF-8 (valid up to byte {valid_up_to})")]
    InvalidEncoding { valid_up_to: usize },

    #[error("unsupported control character U+{code:04X} at byte {offset}")]
    ControlCharacter { offset: usize, code: u32 },
}

/// Phonetic class of the letter following the definite article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SunMoon {
    /// The article's lam assimilates (ash-shams).
    Sun,
    /// The article's lam is pronounced (al-qamar).
    Moon,
    /// No article, or no classifiable letter after it.
    #[default]
    NotApplicable,
}

impl SunMoon {
    /// Classify the letter that follows the article.
    pub fn classify(letter: char) -> Self {
        if SUN_LETTERS.contains(&letter) {
            SunMoon::Sun
        } else if MOON_LETTERS.contains(&letter) {
            SunMoon::Moon
        } else {
            SunMoon::NotApplicable
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SunMoon::Sun => "sun",
            SunMoon::Moon => "moon",
            SunMoon::NotApplicable => "not-applicable",
        }
    }
}

impl std::fmt::Display for SunMoon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shallow morphological features of one token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub index: usize,
    /// The token exactly as written.
    pub surface: String,
    /// Surface form with all diacritics removed.
    pub base: String,
    /// Base form with letter variants collapsed.
    pub normalized: String,
    /// Surface form with only the final haraka removed.
    pub without_last_haraka: String,
    pub definite: bool,
    pub sun_moon: SunMoon,
}

/// Feature extractor. Stateless apart from its normalizer settings.
#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    normalizer: ArabicNormalizer,
}

impl FeatureExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom normalizer settings.
    pub fn with_normalizer(mut self, normalizer: ArabicNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn extract(&self, sentence: &str) -> Vec<FeatureRecord> {
        tokenize(sentence)
            .into_iter()
            .map(|token| self.record(token))
            .collect()
    }

    /// Extract from raw bytes, rejecting input that is not clean UTF-8 text.
    pub fn extract_bytes(&self, input: &[u8]) -> Result<Vec<FeatureRecord>, ExtractionError> {
        let sentence = std::str::from_utf8(input).map_err(|e| ExtractionError::InvalidEncoding {
            valid_up_to: e.valid_up_to(),
        })?;
        check_control_characters(sentence)?;
        Ok(self.extract(sentence))
    }

    fn record(&self, token: Token) -> FeatureRecord {
        let base = strip_diacritics(&token.text);
        let normalized = self.normalizer.normalize(&base);
        let definite = normalized.starts_with(DEFINITE_ARTICLE);
        let sun_moon = if definite {
            normalized[DEFINITE_ARTICLE.len()..]
                .chars()
                .next()
                .map(SunMoon::classify)
                .unwrap_or_default()
        } else {
            SunMoon::NotApplicable
        };

        FeatureRecord {
            index: token.index,
            without_last_haraka: strip_last_haraka(&token.text),
            surface: token.text,
            base,
            normalized,
            definite,
            sun_moon,
        }
    }
}

fn check_control_characters(sentence: &str) -> Result<(), ExtractionError> {
    match sentence
        .char_indices()
        .find(|(_, ch)| ch.is_control() && !matches!(ch, '\n' | '\r' | '\t'))
    {
        Some((offset, ch)) => Err(ExtractionError::ControlCharacter {
            offset,
            code: ch as u32,
        }),
        None => Ok(()),
    }
}

/// Extract features with the default extractor.
pub fn extract(sentence: &str) -> Vec<FeatureRecord> {
    FeatureExtractor::new().extract(sentence)
}

/// Extract features from raw bytes with the default extractor.
pub fn extract_bytes(input: &[u8]) -> Result<Vec<FeatureRecord>, ExtractionError> {
    FeatureExtractor::new().extract_bytes(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boy_goes_scenario() {
        let records = extract("الولد يذهب");
        assert_eq!(records.len(), 2);

        assert!(records[0].definite);
        // waw follows the article: moon letter
        assert_eq!(records[0].sun_moon, SunMoon::Moon);

        assert!(!records[1].definite);
        assert_eq!(records[1].sun_moon, SunMoon::NotApplicable);
    }

    #[test]
    fn moon_letter_after_article() {
        let records = extract("القمر");
        assert!(records[0].definite);
        assert_eq!(records[0].sun_moon, SunMoon::Moon);
    }

    #[test]
    fn sun_letter_after_voweled_article() {
        let records = extract("الشَّمْسُ");
        assert_eq!(records[0].base, "الشمس");
        assert!(records[0].definite);
        assert_eq!(records[0].sun_moon, SunMoon::Sun);
    }

    #[test]
    fn hamza_after_article_is_moon() {
        let records = extract("الأزهار");
        assert_eq!(records[0].normalized, "الازهار");
        assert_eq!(records[0].sun_moon, SunMoon::Moon);
    }

    #[test]
    fn wasla_article_is_detected_after_normalization() {
        let records = extract("ٱلْحَمْدُ");
        assert!(records[0].definite);
        assert_eq!(records[0].sun_moon, SunMoon::Moon);
    }

    #[test]
    fn hamzated_alef_lam_reads_as_article() {
        // detection runs on the normalized form, so إلى, إلا and ألم carry the
        // article flag once their hamza is dropped
        for (word, normalized) in [("إلى", "الي"), ("إلا", "الا"), ("ألم", "الم")] {
            let records = extract(word);
            assert_eq!(records[0].normalized, normalized);
            assert!(records[0].definite, "{word} not flagged");
            assert_eq!(records[0].sun_moon, SunMoon::Moon);
        }
    }

    #[test]
    fn bare_article_has_no_class() {
        let records = extract("ال");
        assert!(records[0].definite);
        assert_eq!(records[0].sun_moon, SunMoon::NotApplicable);
    }

    #[test]
    fn record_keeps_surface_and_position() {
        let records = extract("قَرَأَ الطَّالِبُ الكِتَابَ");
        assert_eq!(records[2].index, 2);
        assert_eq!(records[2].surface, "الكِتَابَ");
        assert_eq!(records[2].base, "الكتاب");
        assert_eq!(records[2].without_last_haraka, "الكِتَاب");
    }

    #[test]
    fn empty_sentence_is_not_an_error() {
        assert!(extract("").is_empty());
        assert_eq!(extract_bytes(b"  ").unwrap(), Vec::new());
    }

    #[test]
    fn rejects_invalid_utf8() {
        let err = extract_bytes(&[0xD8, 0xA7, 0xFF]).unwrap_err();
        assert_eq!(err, ExtractionError::InvalidEncoding { valid_up_to: 2 });
    }

    #[test]
    fn rejects_control_characters() {
        let err = extract_bytes("جاء\u{0000}".as_bytes()).unwrap_err();
        assert!(matches!(err, ExtractionError::ControlCharacter { code: 0, .. }));
    }

    #[test]
    fn sun_moon_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_value(SunMoon::NotApplicable).unwrap(),
            serde_json::json!("not-applicable")
        );
        assert_eq!(serde_json::to_value(SunMoon::Sun).unwrap(), serde_json::json!("sun"));
    }
}

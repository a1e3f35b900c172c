//! Shallow Arabic morphology for the irab pipeline.
//!
//! Tokenizes a sentence into Arabic word runs and annotates every token with
//! its diacritic-free base form, a normalized form, the definite article flag
//! and the sun/moon class of the letter following the article.

pub mod arabic;
pub mod features;
pub mod tokenizer;

pub use arabic::{strip_diacritics, strip_last_haraka, ArabicNormalizer};
pub use features::{extract, extract_bytes, ExtractionError, FeatureExtractor, FeatureRecord, SunMoon};
pub use tokenizer::{tokenize, Token};

//! Core data model of the irab analyzer: request building, response
//! validation, configuration and display records.

pub mod config;
pub mod display;
pub mod error;
pub mod request;
pub mod response;

use irab_text::FeatureRecord;
use serde::{Deserialize, Serialize};

pub use config::{ConfigError, IrabConfig, DEFAULT_ENDPOINT, DEFAULT_MODEL};
pub use display::{render_card, render_table, summary_rows, RoleCategory, SummaryRow, EXAMPLE_SENTENCES};
pub use error::AnalysisError;
pub use request::{
    build_request, build_request_with, AnalysisRequest, PromptTemplate, RequestPayload, TokenPayload,
    PROMPT_V1,
};
pub use response::{check_alignment, validate, AnalysisResult, Attributes, WordAnalysis, REQUIRED_FIELDS};

/// A completed analysis: the sentence, the features it was built from and the
/// validated per-word result, index-aligned with the features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub sentence: String,
    pub prompt_version: String,
    pub features: Vec<FeatureRecord>,
    pub result: AnalysisResult,
}

impl Analysis {
    pub fn new(request: AnalysisRequest, result: AnalysisResult) -> Self {
        let prompt_version = request.prompt_version().to_string();
        let sentence = request.sentence().to_string();
        Self {
            sentence,
            prompt_version,
            features: request.into_features(),
            result,
        }
    }

    pub fn summary(&self) -> Vec<SummaryRow> {
        summary_rows(&self.result)
    }

    /// Each token paired with its analysis.
    pub fn pairs(&self) -> impl Iterator<Item = (&FeatureRecord, &WordAnalysis)> {
        self.features.iter().zip(self.result.iter())
    }
}

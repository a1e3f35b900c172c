use irab_text::ExtractionError;

use crate::config::ConfigError;

/// Every way a single analysis request can fail. None of them is fatal to a
/// long-running process.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    #[error("could not read the sentence: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("no Arabic words found in the input")]
    EmptyInput,

    #[error("reasoning service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("response has {received} entries, expected one per token ({expected})")]
    TokenCountMismatch { expected: usize, received: usize },

    #[error("entry {index} is missing required field `{field}`")]
    MissingField { index: usize, field: &'static str },

    #[error("entry {index} analyses {received:?}, but token {index} is {expected:?}")]
    WordMismatch {
        index: usize,
        expected: String,
        received: String,
    },

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl AnalysisError {
    /// Whether resubmitting the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AnalysisError::ServiceUnavailable(_))
    }

    /// Stable machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::Extraction(_) => "extraction",
            AnalysisError::EmptyInput => "empty_input",
            AnalysisError::ServiceUnavailable(_) => "service_unavailable",
            AnalysisError::MalformedResponse(_) => "malformed_response",
            AnalysisError::TokenCountMismatch { .. } => "token_count_mismatch",
            AnalysisError::MissingField { .. } => "missing_field",
            AnalysisError::WordMismatch { .. } => "word_mismatch",
            AnalysisError::Configuration(_) => "configuration",
        }
    }

    /// True for failures of the response contract (the service answered, but
    /// not in the shape that was asked for).
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            AnalysisError::MalformedResponse(_)
                | AnalysisError::TokenCountMismatch { .. }
                | AnalysisError::MissingField { .. }
                | AnalysisError::WordMismatch { .. }
        )
    }
}

impl From<ConfigError> for AnalysisError {
    fn from(err: ConfigError) -> Self {
        AnalysisError::Configuration(err.to_string())
    }
}

use irab_core::{
    build_request_with, check_alignment, validate, Analysis, AnalysisError, AnalysisRequest,
    IrabConfig, PromptTemplate, PROMPT_V1,
};
use irab_text::{FeatureExtractor, FeatureRecord};
use tracing::{debug, info, instrument, warn};

use crate::gemini::GeminiClient;

/// Extract, build, call, validate. Holds no per-request state, so one pipeline
/// can serve concurrent requests.
#[derive(Debug, Clone)]
pub struct IrabPipeline {
    extractor: FeatureExtractor,
    client: GeminiClient,
    template: PromptTemplate,
    strict_word_alignment: bool,
}

impl IrabPipeline {
    /// Fails with [`AnalysisError::Configuration`] when the config is unusable.
    pub fn new(config: &IrabConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        let client = GeminiClient::new(config)?;
        info!(model = %config.model, endpoint = %config.endpoint, "analysis pipeline ready");
        Ok(Self {
            extractor: FeatureExtractor::new(),
            client,
            template: PROMPT_V1,
            strict_word_alignment: config.strict_word_alignment,
        })
    }

    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    pub fn with_extractor(mut self, extractor: FeatureExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    /// Local-only path: feature records without calling the service. A
    /// sentence without Arabic words yields an empty list.
    pub fn features(&self, sentence: &str) -> Result<Vec<FeatureRecord>, AnalysisError> {
        Ok(self.extractor.extract_bytes(sentence.trim().as_bytes())?)
    }

    /// Build the request for `sentence`; a sentence without tokens is
    /// rejected here so the service is never asked about nothing.
    pub fn prepare(&self, sentence: &str) -> Result<AnalysisRequest, AnalysisError> {
        let sentence = sentence.trim();
        let features = self.features(sentence)?;
        if features.is_empty() {
            return Err(AnalysisError::EmptyInput);
        }
        debug!(tokens = features.len(), "features extracted");
        Ok(build_request_with(self.template, sentence, features))
    }

    #[instrument(skip(self, sentence), fields(chars = sentence.chars().count()))]
    pub async fn analyze(&self, sentence: &str) -> Result<Analysis, AnalysisError> {
        let request = self.prepare(sentence)?;
        let prompt = request.prompt();

        let raw = self.client.generate(&prompt).await.map_err(|e| {
            warn!(error = %e, "reasoning service call failed");
            AnalysisError::from(e)
        })?;

        let result = validate(&raw, request.token_count()).map_err(|e| {
            warn!(kind = e.kind(), error = %e, "response rejected");
            e
        })?;

        if self.strict_word_alignment {
            check_alignment(&result, request.features()).map_err(|e| {
                warn!(kind = e.kind(), error = %e, "response out of order");
                e
            })?;
        }

        info!(
            tokens = request.token_count(),
            prompt_version = request.prompt_version(),
            "analysis complete"
        );
        Ok(Analysis::new(request, result))
    }
}

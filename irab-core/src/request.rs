//! Analysis Request
//!
//! Packs a sentence and its feature records into the fixed schema the prompt
//! template embeds, and renders the prompt by plain variable substitution.

use irab_text::{FeatureRecord, SunMoon};
use serde::{Deserialize, Serialize};

/// A versioned prompt. Only `{sentence}`, `{token_count}` and `{features}`
/// are substituted; every other brace is literal text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTemplate {
    pub version: &'static str,
    pub body: &'static str,
}

pub const PROMPT_V1: PromptTemplate = PromptTemplate {
    version: "irab-v1",
    body: r#"أنت خبير في النحو العربي والإعراب.
You are an expert in Arabic grammar and irab (grammatical analysis).

You will be given an Arabic sentence together with linguistic features extracted
before this request: tokenization, diacritic-free base form, normalized form,
definite article detection and sun/moon letter class. Use them as context.

Sentence: {sentence}

Tokens ({token_count}), in order, as JSON:
{features}

Return ONLY a valid JSON array with exactly {token_count} entries, one per token,
in the same order as the tokens above. Do not merge, split, skip or reorder tokens.
Each entry must have these fields:
- "word": the token exactly as given
- "role": الإعراب, the grammatical role (فاعل، مفعول به، مبتدأ، خبر، فعل ماض، حرف جر، ...)
- "case_marker": العلامة, the grammatical marker (مرفوع بالضمة، منصوب بالفتحة، مجرور بالكسرة، مبني، ...)
- "attributes": an object with "definiteness", "gender" and "number", plus any other relevant detail such as "tense"
- "explanation": one clear sentence in English

No markdown, no text outside the array. Shape of one entry:
{"word":"...","role":"...","case_marker":"...","attributes":{"definiteness":"...","gender":"...","number":"..."},"explanation":"..."}"#,
};

impl Default for PromptTemplate {
    fn default() -> Self {
        PROMPT_V1
    }
}

impl PromptTemplate {
    pub fn render(&self, request: &AnalysisRequest) -> String {
        let payload = request.payload();
        let features = format!("{:#}", serde_json::json!(payload.tokens));
        let token_count = request.token_count().to_string();
        substitute(
            self.body,
            &[
                ("sentence", request.sentence()),
                ("token_count", token_count.as_str()),
                ("features", features.as_str()),
            ],
        )
    }
}

/// Single-pass `{name}` substitution, so substituted values are never
/// themselves scanned for placeholders.
fn substitute(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let replaced = after.find('}').and_then(|close| {
            let name = &after[..close];
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });
        match replaced {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Per-token slice of the request schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    pub index: usize,
    pub surface: String,
    pub base: String,
    pub normalized: String,
    pub definite: bool,
    pub sun_moon: SunMoon,
}

impl From<&FeatureRecord> for TokenPayload {
    fn from(record: &FeatureRecord) -> Self {
        Self {
            index: record.index,
            surface: record.surface.clone(),
            base: record.base.clone(),
            normalized: record.normalized.clone(),
            definite: record.definite,
            sun_moon: record.sun_moon,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestPayload {
    pub prompt_version: String,
    pub sentence: String,
    pub tokens: Vec<TokenPayload>,
}

/// The sentence and its ordered features. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    sentence: String,
    features: Vec<FeatureRecord>,
    template: PromptTemplate,
}

impl AnalysisRequest {
    pub fn sentence(&self) -> &str {
        &self.sentence
    }

    pub fn features(&self) -> &[FeatureRecord] {
        &self.features
    }

    pub fn token_count(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn prompt_version(&self) -> &'static str {
        self.template.version
    }

    pub fn payload(&self) -> RequestPayload {
        RequestPayload {
            prompt_version: self.template.version.to_string(),
            sentence: self.sentence.clone(),
            tokens: self.features.iter().map(TokenPayload::from).collect(),
        }
    }

    pub fn prompt(&self) -> String {
        self.template.render(self)
    }

    pub fn into_features(self) -> Vec<FeatureRecord> {
        self.features
    }
}

/// Build a request against the current prompt template.
pub fn build_request(sentence: impl Into<String>, features: Vec<FeatureRecord>) -> AnalysisRequest {
    build_request_with(PROMPT_V1, sentence, features)
}

pub fn build_request_with(
    template: PromptTemplate,
    sentence: impl Into<String>,
    features: Vec<FeatureRecord>,
) -> AnalysisRequest {
    AnalysisRequest {
        sentence: sentence.into(),
        features,
        template,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use irab_text::extract;

    #[test]
    fn payload_preserves_token_order_and_features() {
        let sentence = "الولد يذهب";
        let request = build_request(sentence, extract(sentence));
        let payload = request.payload();

        assert_eq!(payload.prompt_version, "irab-v1");
        assert_eq!(payload.tokens.len(), 2);
        assert_eq!(payload.tokens[0].surface, "الولد");
        assert!(payload.tokens[0].definite);
        assert_eq!(payload.tokens[0].sun_moon, SunMoon::Moon);
        assert_eq!(payload.tokens[1].index, 1);

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["tokens"][1]["sun_moon"], "not-applicable");
    }

    #[test]
    fn prompt_substitutes_every_variable() {
        let sentence = "قرأ الطالب الكتاب";
        let prompt = build_request(sentence, extract(sentence)).prompt();

        assert!(prompt.contains("Sentence: قرأ الطالب الكتاب"));
        assert!(prompt.contains("exactly 3 entries"));
        assert!(prompt.contains("\"normalized\": \"الطالب\""));
        assert!(!prompt.contains("{sentence}"));
        assert!(!prompt.contains("{features}"));
        assert!(!prompt.contains("{token_count}"));
        // the literal entry shape survives substitution
        assert!(prompt.contains(r#"{"word":"...","role":"...""#));
    }

    #[test]
    fn substituted_values_are_not_rescanned() {
        let out = substitute("{a} and {b}", &[("a", "{b}"), ("b", "x")]);
        assert_eq!(out, "{b} and x");
    }

    #[test]
    fn unknown_and_unclosed_braces_are_literal() {
        assert_eq!(substitute("{x} {", &[("a", "1")]), "{x} {");
    }

    #[test]
    fn zero_token_request_can_be_built() {
        let request = build_request("", extract(""));
        assert!(request.is_empty());
        assert_eq!(request.payload().tokens, Vec::new());
    }
}

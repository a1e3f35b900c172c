//! End-to-end pipeline tests
//!
//! A small axum app stands in for the Gemini `generateContent` endpoint, so
//! these run without network access or a real credential.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use irab_client::{GeminiClient, IrabPipeline};
use irab_core::{AnalysisError, IrabConfig};
use serde_json::{json, Value};

const TEST_KEY: &str = "test-key";

#[derive(Clone)]
struct Stub {
    status: StatusCode,
    body: Value,
    delay: Duration,
    calls: Arc<AtomicUsize>,
}

impl Stub {
    fn reply(text: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            body: json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": text.into()}]},
                    "finishReason": "STOP"
                }]
            }),
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn failure(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body,
            ..Self::reply("")
        }
    }

    fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Serve the stub on an ephemeral port and return its base endpoint.
    async fn spawn(&self) -> String {
        let stub = self.clone();
        let app = Router::new().route(
            "/v1beta/models/*rest",
            post(move |headers: HeaderMap, Json(request): Json<Value>| {
                let stub = stub.clone();
                async move {
                    stub.calls.fetch_add(1, Ordering::SeqCst);
                    if headers.get("x-goog-api-key").and_then(|v| v.to_str().ok()) != Some(TEST_KEY) {
                        return (
                            StatusCode::FORBIDDEN,
                            Json(json!({"error": {"message": "API key not valid"}})),
                        );
                    }
                    if request["generationConfig"]["responseMimeType"] != "application/json" {
                        return (StatusCode::BAD_REQUEST, Json(json!({"error": "json mode expected"})));
                    }
                    tokio::time::sleep(stub.delay).await;
                    (stub.status, Json(stub.body.clone()))
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/v1beta", addr)
    }
}

fn entry(word: &str, role: &str, case_marker: &str) -> Value {
    json!({
        "word": word,
        "role": role,
        "case_marker": case_marker,
        "attributes": {"definiteness": "definite", "gender": "masculine", "number": "singular"},
        "explanation": "..."
    })
}

fn boy_goes() -> Value {
    json!([
        entry("الولد", "مبتدأ", "مرفوع بالضمة"),
        entry("يذهب", "فعل مضارع", "مرفوع بالضمة")
    ])
}

fn config(endpoint: String) -> IrabConfig {
    IrabConfig::new(TEST_KEY).with_endpoint(endpoint).with_timeout_secs(5)
}

// ============================================================================
// Successful analysis
// ============================================================================

#[tokio::test]
async fn test_analyze_returns_aligned_words() {
    let stub = Stub::reply(boy_goes().to_string());
    let pipeline = IrabPipeline::new(&config(stub.spawn().await)).unwrap();

    let analysis = pipeline.analyze("  الولد يذهب ").await.unwrap();
    assert_eq!(analysis.sentence, "الولد يذهب");
    assert_eq!(analysis.features.len(), 2);
    assert_eq!(analysis.result.len(), 2);
    assert_eq!(analysis.result.words()[1].role, "فعل مضارع");
    assert_eq!(stub.calls(), 1);
}

#[tokio::test]
async fn test_fenced_reply_is_unwrapped() {
    let fenced = format!("```json\n{}\n```", boy_goes());
    let stub = Stub::reply(fenced);
    let pipeline = IrabPipeline::new(&config(stub.spawn().await)).unwrap();

    let analysis = pipeline.analyze("الولد يذهب").await.unwrap();
    assert_eq!(analysis.result.len(), 2);
}

#[tokio::test]
async fn test_client_returns_raw_text() {
    let stub = Stub::reply("[]");
    let client = GeminiClient::new(&config(stub.spawn().await)).unwrap();
    assert_eq!(client.generate("prompt").await.unwrap(), "[]");
}

// ============================================================================
// Empty input
// ============================================================================

#[tokio::test]
async fn test_empty_input_never_calls_service() {
    let stub = Stub::reply("[]");
    let pipeline = IrabPipeline::new(&config(stub.spawn().await)).unwrap();

    for input in ["", "   ", "hello 123", "!!"] {
        let err = pipeline.analyze(input).await.unwrap_err();
        assert_eq!(err, AnalysisError::EmptyInput);
    }
    assert_eq!(stub.calls(), 0);
}

#[tokio::test]
async fn test_control_characters_are_rejected_before_the_call() {
    let stub = Stub::reply("[]");
    let pipeline = IrabPipeline::new(&config(stub.spawn().await)).unwrap();

    let err = pipeline.analyze("الولد\u{0007}يذهب").await.unwrap_err();
    assert!(matches!(err, AnalysisError::Extraction(_)));
    assert_eq!(stub.calls(), 0);
}

// ============================================================================
// Contract violations
// ============================================================================

#[tokio::test]
async fn test_extra_entry_is_a_count_mismatch() {
    let reply = json!([
        entry("الولد", "مبتدأ", "مرفوع بالضمة"),
        entry("يذهب", "فعل مضارع", "مرفوع بالضمة"),
        entry("يذهب", "فعل مضارع", "مرفوع بالضمة")
    ]);
    let stub = Stub::reply(reply.to_string());
    let pipeline = IrabPipeline::new(&config(stub.spawn().await)).unwrap();

    let err = pipeline.analyze("الولد يذهب").await.unwrap_err();
    assert_eq!(
        err,
        AnalysisError::TokenCountMismatch {
            expected: 2,
            received: 3
        }
    );
}

#[tokio::test]
async fn test_missing_case_marker_is_reported() {
    let mut reply = boy_goes();
    reply[1].as_object_mut().unwrap().remove("case_marker");
    let stub = Stub::reply(reply.to_string());
    let pipeline = IrabPipeline::new(&config(stub.spawn().await)).unwrap();

    let err = pipeline.analyze("الولد يذهب").await.unwrap_err();
    assert_eq!(
        err,
        AnalysisError::MissingField {
            index: 1,
            field: "case_marker"
        }
    );
}

#[tokio::test]
async fn test_prose_reply_is_malformed() {
    let stub = Stub::reply("Sure! Here is the analysis you asked for.");
    let pipeline = IrabPipeline::new(&config(stub.spawn().await)).unwrap();

    let err = pipeline.analyze("الولد يذهب").await.unwrap_err();
    assert!(matches!(err, AnalysisError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_swapped_entries_depend_on_alignment_setting() {
    let swapped = json!([
        entry("يذهب", "فعل مضارع", "مرفوع بالضمة"),
        entry("الولد", "مبتدأ", "مرفوع بالضمة")
    ]);
    let stub = Stub::reply(swapped.to_string());
    let endpoint = stub.spawn().await;

    let strict = IrabPipeline::new(&config(endpoint.clone())).unwrap();
    let err = strict.analyze("الولد يذهب").await.unwrap_err();
    assert!(matches!(err, AnalysisError::WordMismatch { index: 0, .. }));

    let mut lenient_config = config(endpoint);
    lenient_config.strict_word_alignment = false;
    let lenient = IrabPipeline::new(&lenient_config).unwrap();
    assert_eq!(lenient.analyze("الولد يذهب").await.unwrap().result.len(), 2);
}

// ============================================================================
// Service failures
// ============================================================================

#[tokio::test]
async fn test_daily_quota_is_unavailable_and_not_retried() {
    let stub = Stub::failure(
        StatusCode::TOO_MANY_REQUESTS,
        json!({"error": {"message": "Quota exceeded for GenerateRequestsPerDayPerProjectPerModel"}}),
    );
    let pipeline = IrabPipeline::new(&config(stub.spawn().await)).unwrap();

    let err = pipeline.analyze("الولد يذهب").await.unwrap_err();
    assert!(err.is_retryable());
    assert!(err.to_string().contains("daily quota"));
    assert_eq!(stub.calls(), 1);
}

#[tokio::test]
async fn test_timeout_is_a_single_terminal_failure() {
    let stub = Stub::reply(boy_goes().to_string()).delayed(Duration::from_secs(3));
    let endpoint = stub.spawn().await;
    let pipeline = IrabPipeline::new(&config(endpoint).with_timeout_secs(1)).unwrap();

    let err = pipeline.analyze("الولد يذهب").await.unwrap_err();
    assert!(matches!(err, AnalysisError::ServiceUnavailable(_)));
    assert!(err.to_string().contains("timed out"));
    assert_eq!(stub.calls(), 1);
}

#[tokio::test]
async fn test_rejected_key_is_a_configuration_error() {
    let stub = Stub::reply("[]");
    let endpoint = stub.spawn().await;
    let pipeline = IrabPipeline::new(&IrabConfig::new("wrong-key").with_endpoint(endpoint)).unwrap();

    let err = pipeline.analyze("الولد يذهب").await.unwrap_err();
    assert!(matches!(err, AnalysisError::Configuration(_)));
}

#[tokio::test]
async fn test_unreachable_service_is_unavailable() {
    // bind then drop to get a port nothing listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let pipeline = IrabPipeline::new(&config(format!("http://{}/v1beta", addr))).unwrap();
    let err = pipeline.analyze("الولد يذهب").await.unwrap_err();
    assert!(err.is_retryable());
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_pipeline_requires_credential() {
    let err = IrabPipeline::new(&IrabConfig::default()).unwrap_err();
    assert!(matches!(err, AnalysisError::Configuration(_)));
}

#[test]
fn test_features_path_needs_no_service() {
    let pipeline = IrabPipeline::new(&IrabConfig::new(TEST_KEY)).unwrap();
    let features = pipeline.features("قرأ الطالب الكتاب").unwrap();
    assert_eq!(features.len(), 3);
    assert!(features[1].definite);
}

//! Client for the Gemini reasoning service and the end-to-end analysis
//! pipeline built on it.

pub mod gemini;
pub mod pipeline;

pub use gemini::{unwrap_code_fence, GeminiClient, GeminiError, Result};
pub use pipeline::IrabPipeline;

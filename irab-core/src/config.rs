use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GEMINI_API_KEY not found; set it in the environment or the config file")]
    MissingCredential,

    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
}

/// Settings for the reasoning service, passed explicitly to the client and
/// pipeline at construction time.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct IrabConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Reject responses whose echoed words do not match the tokens.
    #[serde(default = "default_strict_word_alignment")]
    pub strict_word_alignment: bool,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_strict_word_alignment() -> bool {
    true
}

impl Default for IrabConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
            strict_word_alignment: default_strict_word_alignment(),
        }
    }
}

// The credential never reaches logs.
impl std::fmt::Debug for IrabConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IrabConfig")
            .field("api_key", &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("timeout_secs", &self.timeout_secs)
            .field("strict_word_alignment", &self.strict_word_alignment)
            .finish()
    }
}

impl IrabConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(ConfigError::from)
    }

    /// Read `path` when given (defaults otherwise), then apply overrides from
    /// `lookup`. Both binaries resolve their settings through here.
    pub fn load(
        path: Option<&Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let base = match path {
            Some(path) => Self::from_path(path)?,
            None => Self::default(),
        };
        base.apply_overrides(lookup)
    }

    /// Apply `GEMINI_API_KEY`, `IRAB_MODEL`, `IRAB_ENDPOINT`,
    /// `IRAB_TIMEOUT_SECS` and `IRAB_STRICT_WORD_ALIGNMENT` from `lookup`.
    pub fn apply_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(key) = lookup("GEMINI_API_KEY") {
            self.api_key = key;
        }
        if let Some(model) = lookup("IRAB_MODEL") {
            self.model = model;
        }
        if let Some(endpoint) = lookup("IRAB_ENDPOINT") {
            self.endpoint = endpoint;
        }
        if let Some(value) = lookup("IRAB_TIMEOUT_SECS") {
            self.timeout_secs = value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "IRAB_TIMEOUT_SECS",
                value,
            })?;
        }
        if let Some(value) = lookup("IRAB_STRICT_WORD_ALIGNMENT") {
            let flag = value.trim().to_ascii_lowercase();
            self.strict_word_alignment = match flag.as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "IRAB_STRICT_WORD_ALIGNMENT",
                        value,
                    })
                }
            };
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingCredential);
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "timeout_secs",
                value: "0".into(),
            });
        }
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                key: "endpoint",
                value: self.endpoint.clone(),
            });
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "model",
                value: self.model.clone(),
            });
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

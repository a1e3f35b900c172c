//! Shared pieces of the `irab` command line: service arguments and the
//! terminal renderings of features and analyses.

use std::path::PathBuf;

use clap::Args;
use irab_core::{render_card, render_table, Analysis, ConfigError, IrabConfig};
use irab_text::FeatureRecord;
use unicode_width::UnicodeWidthStr;

/// Reasoning service settings; each falls back to its environment variable.
#[derive(Debug, Clone, Default, Args)]
pub struct ServiceArgs {
    /// Path to a JSON config file
    #[arg(long, global = true, env = "IRAB_CONFIG")]
    pub config: Option<PathBuf>,

    /// Gemini API key
    #[arg(long, global = true, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Gemini model name
    #[arg(long, global = true, env = "IRAB_MODEL")]
    pub model: Option<String>,

    /// Gemini API base URL
    #[arg(long, global = true, env = "IRAB_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, env = "IRAB_TIMEOUT_SECS")]
    pub timeout_secs: Option<String>,

    /// Reject responses whose echoed words are out of order (true/false, on/off, 1/0)
    #[arg(long, global = true, env = "IRAB_STRICT_WORD_ALIGNMENT")]
    pub strict_word_alignment: Option<String>,
}

impl ServiceArgs {
    /// Config file (or defaults) with command line values on top. Not
    /// validated, so commands that never call the service still work without
    /// a key.
    pub fn resolve(&self) -> Result<IrabConfig, ConfigError> {
        IrabConfig::load(self.config.as_deref(), |key| self.lookup(key))
    }

    fn lookup(&self, key: &str) -> Option<String> {
        match key {
            "GEMINI_API_KEY" => self.api_key.clone(),
            "IRAB_MODEL" => self.model.clone(),
            "IRAB_ENDPOINT" => self.endpoint.clone(),
            "IRAB_TIMEOUT_SECS" => self.timeout_secs.clone(),
            "IRAB_STRICT_WORD_ALIGNMENT" => self.strict_word_alignment.clone(),
            _ => None,
        }
    }
}

/// Join positional words into one sentence.
pub fn join_sentence(words: &[String]) -> String {
    words.join(" ").trim().to_string()
}

const FEATURE_HEADERS: [&str; 6] = ["#", "Token", "Base", "Normalized", "Definite", "Sun/Moon"];

pub fn render_features(records: &[FeatureRecord]) -> String {
    if records.is_empty() {
        return "no Arabic words found\n".to_string();
    }

    let rows: Vec<[String; 6]> = records
        .iter()
        .map(|record| {
            [
                (record.index + 1).to_string(),
                record.surface.clone(),
                record.base.clone(),
                record.normalized.clone(),
                if record.definite { "yes" } else { "no" }.to_string(),
                record.sun_moon.to_string(),
            ]
        })
        .collect();

    let mut widths = FEATURE_HEADERS.map(|header| header.width());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.width());
        }
    }

    let mut out = String::new();
    push_row(&mut out, FEATURE_HEADERS.iter().copied(), &widths);
    for row in &rows {
        push_row(&mut out, row.iter().map(String::as_str), &widths);
    }
    out
}

fn push_row<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize; 6]) {
    let line: Vec<String> = cells
        .zip(widths)
        .map(|(cell, width)| format!("{}{}", cell, " ".repeat(width - cell.width())))
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}

/// Cards for every word followed by the summary table.
pub fn render_analysis(analysis: &Analysis) -> String {
    let mut out = format!("{}\n\n", analysis.sentence);
    for word in &analysis.result {
        out.push_str(&render_card(word));
        out.push('\n');
    }
    out.push_str(&render_table(&analysis.summary()));
    out
}

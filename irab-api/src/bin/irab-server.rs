use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use irab_api::start_server;
use irab_client::IrabPipeline;
use irab_core::IrabConfig;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "irab-server", about = "Arabic irab analysis service")]
struct Cli {
    /// HTTP listening address
    #[arg(long, env = "IRAB_ADDR", default_value = "0.0.0.0:8080")]
    addr: SocketAddr,

    /// JSON config file
    #[arg(long, env = "IRAB_CONFIG")]
    config: Option<PathBuf>,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Gemini model name
    #[arg(long, env = "IRAB_MODEL")]
    model: Option<String>,

    /// Gemini API base URL
    #[arg(long, env = "IRAB_ENDPOINT")]
    endpoint: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, env = "IRAB_TIMEOUT_SECS")]
    timeout_secs: Option<String>,

    /// Reject responses whose echoed words are out of order (true/false, on/off, 1/0)
    #[arg(long, env = "IRAB_STRICT_WORD_ALIGNMENT")]
    strict_word_alignment: Option<String>,
}

impl Cli {
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

    fn load_config(&self) -> anyhow::Result<IrabConfig> {
        let config = IrabConfig::load(self.config.as_deref(), |key| self.lookup(key))
            .context("loading configuration")?;
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_observability();

    let cli = Cli::parse();
    let config = cli.load_config()?;
    info!(config = ?config, "starting irab-server");

    let pipeline = IrabPipeline::new(&config)?;

    let shutdown = async {
        if tokio::signal::ctrl_c().await.is_err() {
            tracing::warn!("failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received");
    };

    let listener = tokio::net::TcpListener::bind(cli.addr).await?;
    info!("Listening on http://{}", cli.addr);
    start_server(listener, pipeline, shutdown).await.await??;

    info!("Server stopped");
    Ok(())
}

fn init_observability() {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_line_number(true)
        .with_file(true)
        .json();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,irab_api=debug,irab_client=debug,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alignment_flag_accepts_switch_words() {
        let cli = Cli::try_parse_from([
            "irab-server",
            "--api-key",
            "key",
            "--strict-word-alignment",
            "off",
        ])
        .unwrap();
        let config = cli.load_config().unwrap();
        assert!(!config.strict_word_alignment);
        assert_eq!(config.api_key, "key");
    }

    #[test]
    fn test_bad_timeout_fails_at_startup() {
        let cli = Cli::try_parse_from(["irab-server", "--api-key", "key", "--timeout-secs", "0"]).unwrap();
        assert!(cli.load_config().is_err());
    }
}

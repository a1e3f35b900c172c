use clap::{Parser, Subcommand};
use irab_cli::{join_sentence, render_analysis, render_features, ServiceArgs};
use irab_client::IrabPipeline;
use irab_core::{build_request, EXAMPLE_SENTENCES};
use irab_text::FeatureExtractor;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "irab", about = "Grammatical analysis (irab) of Arabic sentences")]
struct Cli {
    #[command(flatten)]
    service: ServiceArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Analyze a sentence with the reasoning service
    Analyze {
        /// The sentence (quoted, or as separate words)
        #[arg(required = true, num_args = 1..)]
        sentence: Vec<String>,
        /// Print the analysis as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the extracted features only; no network access
    Features {
        #[arg(required = true, num_args = 1..)]
        sentence: Vec<String>,
        #[arg(long)]
        json: bool,
    },
    /// Print the prompt that would be sent for a sentence
    Prompt {
        #[arg(required = true, num_args = 1..)]
        sentence: Vec<String>,
    },
    /// List example sentences
    Examples {},
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze { sentence, json } => {
            let config = cli.service.resolve()?;
            let pipeline = IrabPipeline::new(&config)?;
            let analysis = pipeline.analyze(&join_sentence(&sentence)).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&analysis)?);
            } else {
                print!("{}", render_analysis(&analysis));
            }
        }
        Commands::Features { sentence, json } => {
            let sentence = join_sentence(&sentence);
            let records = FeatureExtractor::new().extract_bytes(sentence.as_bytes())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                print!("{}", render_features(&records));
            }
        }
        Commands::Prompt { sentence } => {
            let sentence = join_sentence(&sentence);
            let records = FeatureExtractor::new().extract_bytes(sentence.as_bytes())?;
            println!("{}", build_request(sentence, records).prompt());
        }
        Commands::Examples {} => {
            for (i, example) in EXAMPLE_SENTENCES.iter().enumerate() {
                println!("{}. {}", i + 1, example);
            }
        }
    }
    Ok(())
}

// Logs go to stderr so `--json` output stays clean.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use vf_ai::index::ensure_index;
use vf_ai::ollama::OllamaClient;
use vf_ai::service::{FactCheckService, Providers};
use vf_core::config::AppConfig;
use vf_core::error::AppError;
use vf_core::ingest::corpus_csv::load_corpus_file;
use vf_core::store::{CollectionInfo, FactStore};

#[derive(Parser, Debug)]
#[command(name = "factcheck", version, about = "Verify claims against a corpus of verified statements")]
struct Cli {
    /// SQLite fact store (overrides FACTCHECK_STORE_PATH)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Verified-statement CSV (overrides FACTCHECK_CORPUS_CSV)
    #[arg(long, global = true)]
    corpus: Option<PathBuf>,

    /// Evidence statements retrieved per claim (overrides FACTCHECK_TOP_K)
    #[arg(long, global = true)]
    top_k: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Embed the corpus into the fact store unless it is already populated
    Ingest,
    /// Fact-check one claim
    Check {
        /// Claim text; multiple words are joined with spaces
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Report fact store contents and Ollama reachability
    Status,
}

#[derive(Debug, Serialize)]
struct AiHealthStatus {
    ok: bool,
    message: String,
}

#[derive(Debug, Serialize)]
struct StatusReport {
    store_path: String,
    collection: String,
    collection_info: Option<CollectionInfo>,
    ollama: AiHealthStatus,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(code = %e.code, "{}", e.message);
            let body = serde_json::to_string_pretty(&e).unwrap_or_else(|_| e.to_string());
            eprintln!("{body}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<String, AppError> {
    let config = load_config(&cli)?;

    match cli.command {
        Command::Ingest => {
            let providers = Providers::from_config(&config)?;
            let store = FactStore::from_config(&config)?;
            let summary = ensure_index(
                &store,
                providers.embedder.as_ref(),
                config.embed_batch_size,
                || load_corpus_file(&config.corpus_csv_path),
            )?;
            to_json(&summary)
        }
        Command::Check { text } => {
            let providers = Providers::from_config(&config)?;
            let mut service = FactCheckService::new();
            service.initialize(&config, providers)?;
            let result = service.check(&text.join(" "))?;
            to_json(&result)
        }
        Command::Status => to_json(&status(&config)?),
    }
}

fn load_config(cli: &Cli) -> Result<AppConfig, AppError> {
    apply_overrides(AppConfig::from_env()?, cli)
}

/// Command-line flags win over the environment.
fn apply_overrides(mut config: AppConfig, cli: &Cli) -> Result<AppConfig, AppError> {
    if let Some(p) = &cli.store {
        config.store_path = p.clone();
    }
    if let Some(p) = &cli.corpus {
        config.corpus_csv_path = p.clone();
    }
    if let Some(k) = cli.top_k {
        config.top_k = k;
    }
    config.validate()?;
    Ok(config)
}

fn status(config: &AppConfig) -> Result<StatusReport, AppError> {
    let store = FactStore::from_config(config)?;
    let client = OllamaClient::new(&config.ollama_base_url)?;
    let ollama = match client.health_check() {
        Ok(()) => AiHealthStatus {
            ok: true,
            message: format!("Ollama reachable at {}", client.base_url()),
        },
        Err(e) => AiHealthStatus {
            ok: false,
            message: e.to_string(),
        },
    };

    Ok(StatusReport {
        store_path: store.path().display().to_string(),
        collection: store.collection().to_string(),
        collection_info: store.info()?,
        ollama,
    })
}

fn to_json<T: Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string_pretty(value).map_err(|e| {
        AppError::new("OUTPUT_ENCODE_FAILED", "Failed to encode output as JSON").with_details(e.to_string())
    })
}

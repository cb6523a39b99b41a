mod handlers;
mod server;

use chrono::Utc;
use clap::{Parser, Subcommand};
use docqa_core::{
    AppConfig, Document, MemoryAdapter, QaService, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL,
    DEFAULT_SUPERMEMORY_BASE_URL,
};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::server::{AppState, DEFAULT_MAX_UPLOAD_BYTES};

#[derive(Parser)]
#[command(name = "docqa", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Supermemory API key
    #[arg(long, env = "SUPERMEMORY_API_KEY", hide_env_values = true)]
    supermemory_api_key: Option<String>,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    gemini_api_key: Option<String>,

    /// Supermemory API base URL
    #[arg(long, env = "SUPERMEMORY_BASE_URL", default_value = DEFAULT_SUPERMEMORY_BASE_URL)]
    supermemory_base_url: String,

    /// Gemini API base URL
    #[arg(long, env = "GEMINI_BASE_URL", default_value = DEFAULT_GEMINI_BASE_URL)]
    gemini_base_url: String,

    /// Gemini model used for answer generation
    #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_GEMINI_MODEL)]
    gemini_model: String,

    /// Memory adapter: `json` (text to /memories) or `file-upload` (raw file, reranked search)
    #[arg(long, env = "MEMORY_ADAPTER", default_value_t = MemoryAdapter::Json)]
    memory_adapter: MemoryAdapter,

    /// Largest accepted request body in bytes
    #[arg(long, env = "DOCQA_MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    max_upload_bytes: usize,

    /// Address the web server binds to
    #[arg(long, env = "DOCQA_BIND", default_value = "127.0.0.1:5001")]
    bind: String,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the upload/ask web interface (default).
    Serve,
    /// Send one file to the memory service.
    Ingest {
        /// File to upload.
        #[arg(long)]
        file: PathBuf,
    },
    /// Answer a question from previously ingested documents.
    Ask {
        /// Question text.
        #[arg(long)]
        question: String,
    },
}

impl Cli {
    fn app_config(&self) -> AppConfig {
        AppConfig {
            supermemory_api_key: self.supermemory_api_key.clone(),
            gemini_api_key: self.gemini_api_key.clone(),
            supermemory_base_url: self.supermemory_base_url.clone(),
            gemini_base_url: self.gemini_base_url.clone(),
            gemini_model: self.gemini_model.clone(),
            memory_adapter: self.memory_adapter,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    if let Ok(path) = &dotenv {
        info!(path = %path.display(), "loaded environment file");
    }

    let cli = Cli::parse();
    let config = cli.app_config();

    info!(
        version = app_version,
        adapter = %config.memory_adapter,
        started_at = %Utc::now().to_rfc3339(),
        "docqa boot"
    );

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let service = match QaService::from_config(&config) {
                Ok(service) => Some(service),
                Err(error) => {
                    error!(%error, "qa service unavailable; serving configuration error");
                    None
                }
            };
            let state = AppState::new(service).with_max_upload_bytes(cli.max_upload_bytes);
            server::start_server(&cli.bind, state).await?;
        }
        Command::Ingest { file } => {
            let service = QaService::from_config(&config)?;
            let document = Document::from_path(&file).await?;
            let ack = service.ingest_document(&document).await?;

            println!(
                "'{}' was successfully added to Supermemory (id={}, status={})",
                document.name,
                ack.id.as_deref().unwrap_or("-"),
                ack.status.as_deref().unwrap_or("-"),
            );
        }
        Command::Ask { question } => {
            let service = QaService::from_config(&config)?;
            let answer = service.answer(&question).await?;
            println!("{}", answer.text());
        }
    }

    Ok(())
}

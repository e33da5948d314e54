use std::path::PathBuf;

use clap::{Parser, Subcommand};
use docs_qa::{QaError, Result};
use docs_qa::commands::{ask, chat, clear_cache, configure, ingest, set_key, show_status};
use docs_qa::config::resolve_config_dir;
use tokio_util::sync::CancellationToken;
use tracing::warn;

#[derive(Parser)]
#[command(name = "docs-qa")]
#[command(about = "Ask questions about a set of documents using retrieval-augmented generation")]
#[command(version)]
struct Cli {
    /// Directory holding config.toml and the index database (default: ~/.docs-qa)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the model service, retrieval sizes and document location
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Store the OpenAI API key (prompted when omitted)
    Key {
        /// Key starting with "sk-"
        key: Option<String>,
    },
    /// Load, chunk and embed the documents into the index cache
    Ingest {
        /// Rebuild even when a cached index exists
        #[arg(long)]
        force: bool,
    },
    /// Answer a single question from the indexed documents
    Ask {
        /// The question to answer
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },
    /// Start an interactive question-and-answer session
    Chat,
    /// Show the state of the index cache and credentials
    Status,
    /// Delete the cached index so the next run rebuilds it
    ClearCache,
}

impl Commands {
    /// Commands that make service requests Ctrl-C should cancel
    const fn cancels_on_interrupt(&self) -> bool {
        matches!(self, Self::Ingest { .. } | Self::Ask { .. } | Self::Chat)
    }
}

/// A token cancelled by the first Ctrl-C
fn cancel_on_interrupt() -> CancellationToken {
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling pending requests");
            on_interrupt.cancel();
        }
    });
    cancel
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_dir =
        resolve_config_dir(cli.data_dir).map_err(|e| QaError::Config(e.to_string()))?;

    // Prompts in the other commands must stay abortable with Ctrl-C
    let cancel = if cli.command.cancels_on_interrupt() {
        cancel_on_interrupt()
    } else {
        CancellationToken::new()
    };

    match cli.command {
        Commands::Config { show } => {
            configure(&config_dir, show)?;
        }
        Commands::Key { key } => {
            set_key(&config_dir, key).await?;
        }
        Commands::Ingest { force } => {
            ingest(&config_dir, force, &cancel).await?;
        }
        Commands::Ask { question } => {
            ask(&config_dir, &question.join(" "), &cancel).await?;
        }
        Commands::Chat => {
            chat(&config_dir, &cancel).await?;
        }
        Commands::Status => {
            show_status(&config_dir).await?;
        }
        Commands::ClearCache => {
            clear_cache(&config_dir).await?;
        }
    }

    Ok(())
}

use anyhow::{Context, Result};
use console::style;
use dialoguer::Input;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::QaError;
use crate::completion::AnswerClient;
use crate::config::{Config, prompt_api_key, run_interactive_config, show_config};
use crate::database::{CredentialStore, Database, IndexStore};
use crate::documents::{DocumentOutcome, default_extractor, source_for};
use crate::embeddings::EmbeddingClient;
use crate::indexer::{IndexOrigin, Indexer, IngestionReport};
use crate::progress::TerminalProgress;
use crate::session::{Answer, Conversation, QaSession, Role};

/// Configuration and storage shared by every command
struct Workspace {
    config: Config,
    database: Database,
}

impl Workspace {
    async fn open(config_dir: &Path) -> Result<Self> {
        let config = Config::load(config_dir)?;
        let database = Database::initialize_from_config_dir(config.get_base_dir())
            .await
            .context("Failed to initialize database")?;
        Ok(Self { config, database })
    }

    fn credentials(&self) -> CredentialStore {
        CredentialStore::new(self.database.clone())
    }

    fn index_store(&self) -> IndexStore {
        IndexStore::new(self.database.clone())
    }

    async fn indexer(&self) -> Result<(Indexer, String)> {
        let api_key = self.credentials().require_api_key().await?;
        let embeddings = EmbeddingClient::new(&self.config, api_key.as_str())?;
        info!("Embedding model: {}", embeddings.model());
        let indexer = Indexer::new(
            &self.config,
            self.database.clone(),
            embeddings,
            source_for(&self.config)?,
            default_extractor(),
        );
        Ok((indexer, api_key))
    }

    async fn session(&self, cancel: &CancellationToken) -> Result<QaSession> {
        let (indexer, api_key) = self.indexer().await?;
        let answers = AnswerClient::new(&self.config, api_key)?;
        info!("Completion model: {}", answers.model());
        let progress = TerminalProgress::new();
        let session = QaSession::open(&self.config, &indexer, answers, &progress, cancel).await?;

        if let Some(report) = session.report() {
            print_report(report);
        }

        Ok(session)
    }
}

/// Interactive configuration, or a read-only view with `show`
#[inline]
pub fn configure(config_dir: &Path, show: bool) -> Result<()> {
    if show {
        show_config(config_dir)
    } else {
        run_interactive_config(config_dir)
    }
}

/// Store the API key, prompting for it when not given
#[inline]
pub async fn set_key(config_dir: &Path, key: Option<String>) -> Result<()> {
    let key = match key {
        Some(key) => key,
        None => prompt_api_key()?,
    };

    let workspace = Workspace::open(config_dir).await?;
    workspace.credentials().save(&key).await?;

    println!("{} API key saved", style("✓").green());
    if std::env::var_os(crate::database::credentials::API_KEY_ENV).is_some() {
        println!(
            "{}",
            style("Note: OPENAI_API_KEY is set and takes precedence over the stored key").yellow()
        );
    }

    Ok(())
}

/// Build the document index, reusing the cache unless `force` is set
#[inline]
pub async fn ingest(config_dir: &Path, force: bool, cancel: &CancellationToken) -> Result<()> {
    let workspace = Workspace::open(config_dir).await?;
    let (indexer, _) = workspace.indexer().await?;
    let progress = TerminalProgress::new();

    let (_, report) = indexer
        .load_or_build(force, &progress, cancel)
        .await
        .inspect_err(|e| error!("Ingestion failed: {:#}", e))?;

    print_report(&report);
    if let Some(built_at) = indexer.store().built_at().await? {
        println!("  Index built {} UTC", built_at.format("%Y-%m-%d %H:%M:%S"));
    }
    Ok(())
}

/// Answer a single question
#[inline]
pub async fn ask(config_dir: &Path, question: &str, cancel: &CancellationToken) -> Result<()> {
    let workspace = Workspace::open(config_dir).await?;
    let session = workspace.session(cancel).await?;

    let answer = session.ask(question, cancel).await?;
    print_answer(&answer);
    Ok(())
}

/// Interactive question loop; blank lines are ignored and `exit` ends it
#[inline]
pub async fn chat(config_dir: &Path, cancel: &CancellationToken) -> Result<()> {
    let workspace = Workspace::open(config_dir).await?;
    let session = workspace.session(cancel).await?;
    let mut conversation = Conversation::new();

    println!(
        "{} Ask about your documents. Type {} to leave.",
        style("Ready.").green().bold(),
        style("exit").cyan()
    );

    loop {
        let Ok(question) = Input::<String>::new()
            .with_prompt(Role::User.to_string())
            .allow_empty(true)
            .interact_text()
        else {
            break;
        };

        let question = question.trim();
        if question.is_empty() {
            continue;
        }
        if matches!(question, "exit" | "quit") {
            break;
        }

        conversation.push(Role::User, question);

        match session.ask(question, &cancel.child_token()).await {
            Ok(answer) => {
                print_answer(&answer);
                conversation.push(Role::Assistant, answer.text());
            }
            Err(e) if matches!(e.downcast_ref::<QaError>(), Some(QaError::Cancelled)) => {
                return Err(e);
            }
            Err(e) => {
                warn!("Query error: {:#}", e);
                let message = format!("Error: {e}");
                println!(
                    "{} {}",
                    style(format!("{}:", Role::Assistant)).bold(),
                    style(&message).red()
                );
                conversation.push(Role::Assistant, message);
            }
        }
    }

    info!("Chat ended after {} messages", conversation.len());
    Ok(())
}

/// Show cache, credential and document-source state
#[inline]
pub async fn show_status(config_dir: &Path) -> Result<()> {
    let workspace = Workspace::open(config_dir).await?;
    let store = workspace.index_store();

    println!("{}", style("docs-qa status").bold().underlined());
    println!();
    println!("  Data directory: {}", style(config_dir.display()).dim());
    println!(
        "  Database: {}",
        style(workspace.config.database_path().display()).dim()
    );
    println!("  Documents: {}", style(&workspace.config.documents.location).cyan());

    let credential = if std::env::var_os(crate::database::credentials::API_KEY_ENV).is_some() {
        style("from OPENAI_API_KEY").green()
    } else if workspace.credentials().stored_key().await?.is_some() {
        style("stored").green()
    } else {
        style("missing (run `docs-qa key`)").red()
    };
    println!("  API key: {}", credential);
    println!();

    match store.load().await? {
        Some(index) => {
            println!("  Index cache: {}", style("present").green());
            println!("  Chunks: {}", index.len());
            println!("  Cache size: {} bytes", store.stored_bytes().await?);
            if let Some(dimension) = index.dimension() {
                println!("  Embedding dimension: {}", dimension);
            }
            if let Some(built_at) = store.built_at().await? {
                println!("  Built: {} UTC", built_at.format("%Y-%m-%d %H:%M:%S"));
            }

            let sources = index.sources();
            if !sources.is_empty() {
                println!("  Sources:");
                for source in sources {
                    println!("    {} {}", style("•").green(), source);
                }
            }
        }
        None => {
            println!("  Index cache: {}", style("empty").yellow());
            println!("  Run `docs-qa ingest` to build it.");
        }
    }

    Ok(())
}

/// Drop the cached index so the next run rebuilds it
#[inline]
pub async fn clear_cache(config_dir: &Path) -> Result<()> {
    let workspace = Workspace::open(config_dir).await?;

    if workspace.index_store().clear().await? {
        println!("{} Index cache cleared", style("✓").green());
    } else {
        println!("Index cache was already empty");
    }

    Ok(())
}

fn print_report(report: &IngestionReport) {
    match report.origin {
        IndexOrigin::Cache => {
            println!(
                "{} Using cached index ({} chunks)",
                style("✓").green(),
                report.chunk_count
            );
        }
        IndexOrigin::Built => {
            let failed = report
                .documents
                .iter()
                .filter(|(_, outcome)| matches!(outcome, DocumentOutcome::Failed { .. }))
                .count();
            let loaded = report
                .documents
                .iter()
                .filter(|(_, outcome)| outcome.is_loaded())
                .count();

            println!(
                "{} Indexed {} chunks from {} of {} documents",
                style("✓").green(),
                report.chunk_count,
                loaded,
                report.documents.len()
            );
            if failed > 0 {
                println!("{}", style(format!("  {failed} documents failed")).red());
            }
        }
    }
}

fn print_answer(answer: &Answer) {
    if let Answer::Generated {
        relevant_chunks, ..
    } = answer
    {
        println!(
            "{}",
            style(format!("(using {relevant_chunks} relevant context chunks)")).dim()
        );
    }
    println!(
        "{} {}",
        style(format!("{}:", Role::Assistant)).bold(),
        answer.text()
    );
}

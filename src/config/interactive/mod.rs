
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Password};

use super::{Config, ConfigError, DocumentsConfig, RetrievalConfig, ServiceConfig};
use crate::database::credentials::validate_api_key;

#[inline]
pub fn run_interactive_config(config_dir: &Path) -> Result<()> {
    eprintln!("{}", style("🔧 Docs QA Configuration Setup").bold().cyan());
    eprintln!();

    let mut config = load_existing_config(config_dir)?;

    eprintln!("{}", style("Service Configuration").bold().yellow());
    eprintln!("Configure the hosted embedding and chat-completion service.");
    eprintln!();

    configure_service(&mut config.service)?;

    eprintln!();
    eprintln!("{}", style("Retrieval Configuration").bold().yellow());
    configure_retrieval(&mut config.retrieval)?;

    eprintln!();
    eprintln!("{}", style("Documents").bold().yellow());
    configure_documents(&mut config.documents)?;

    eprintln!();
    eprintln!("{}", style("Testing configuration...").yellow());

    if test_service_connection(&config.service) {
        eprintln!("{}", style("✓ Service reachable!").green());
    } else {
        eprintln!(
            "{}",
            style("⚠ Warning: Could not reach the service").yellow()
        );
        eprintln!("You can continue, but questions will fail until it is reachable.");
    }

    eprintln!();
    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("✓ Configuration saved successfully!").green());
        eprintln!(
            "Configuration saved to: {}",
            style(config.config_file_path().display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config(config_dir: &Path) -> Result<()> {
    let config = Config::load(config_dir).context("Failed to load configuration")?;

    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Service Settings:").bold().yellow());
    eprintln!("  Base URL: {}", style(&config.service.base_url).cyan());
    eprintln!(
        "  Embedding Model: {}",
        style(&config.service.embedding_model).cyan()
    );
    eprintln!(
        "  Completion Model: {}",
        style(&config.service.completion_model).cyan()
    );
    eprintln!("  Batch Size: {}", style(config.service.batch_size).cyan());
    eprintln!(
        "  Timeout: {}s",
        style(config.service.timeout_seconds).cyan()
    );

    eprintln!();
    eprintln!("{}", style("Retrieval Settings:").bold().yellow());
    eprintln!(
        "  Chunk Size: {} chars",
        style(config.retrieval.chunk_size).cyan()
    );
    eprintln!(
        "  Max Context Length: {} chars",
        style(config.retrieval.max_context_length).cyan()
    );

    eprintln!();
    match config.document_location() {
        Ok(location) => eprintln!("  Documents: {}", style(format!("{location:?}")).cyan()),
        Err(e) => eprintln!("  Documents: {} ({})", style("Invalid").red(), e),
    }

    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );

    Ok(())
}

/// Ask the operator for an API key; only the `sk-` prefix is checked
#[inline]
pub fn prompt_api_key() -> Result<String> {
    let key = Password::new()
        .with_prompt("OpenAI API key")
        .validate_with(|input: &String| -> Result<(), String> {
            validate_api_key(input)
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
        .interact()?;

    Ok(validate_api_key(&key)?)
}

fn load_existing_config(config_dir: &Path) -> Result<Config> {
    Config::load(config_dir).map_or_else(
        |_| {
            eprintln!(
                "{}",
                style("No usable configuration found. Using defaults.").yellow()
            );
            Ok(Config {
                base_dir: config_dir.to_path_buf(),
                ..Config::default()
            })
        },
        |config| {
            eprintln!("{}", style("Found existing configuration.").green());
            Ok(config)
        },
    )
}

fn configure_service(service: &mut ServiceConfig) -> Result<()> {
    let base_url: String = Input::new()
        .with_prompt("Service base URL")
        .default(service.base_url.clone())
        .validate_with(|input: &String| -> Result<(), ConfigError> {
            ServiceConfig {
                base_url: input.clone(),
                ..ServiceConfig::default()
            }
            .service_url()
            .map(|_| ())
        })
        .interact_text()?;

    let embedding_model: String = Input::new()
        .with_prompt("Embedding model")
        .default(service.embedding_model.clone())
        .validate_with(|input: &String| non_empty(input))
        .interact_text()?;

    let completion_model: String = Input::new()
        .with_prompt("Completion model")
        .default(service.completion_model.clone())
        .validate_with(|input: &String| non_empty(input))
        .interact_text()?;

    let batch_size: u32 = Input::new()
        .with_prompt("Batch size for embedding generation")
        .default(service.batch_size)
        .validate_with(|input: &u32| -> Result<(), &str> {
            if *input == 0 {
                Err("Batch size must be greater than 0")
            } else if *input > 2048 {
                Err("Batch size must be 2048 or less")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    service.set_base_url(base_url)?;
    service.set_embedding_model(embedding_model)?;
    service.set_completion_model(completion_model)?;
    service.set_batch_size(batch_size)?;

    Ok(())
}

fn configure_retrieval(retrieval: &mut RetrievalConfig) -> Result<()> {
    let chunk_size: usize = Input::new()
        .with_prompt("Chunk size (characters)")
        .default(retrieval.chunk_size)
        .validate_with(|input: &usize| -> Result<(), &str> {
            if (100..=100_000).contains(input) {
                Ok(())
            } else {
                Err("Chunk size must be between 100 and 100000")
            }
        })
        .interact_text()?;

    let max_context_length: usize = Input::new()
        .with_prompt("Max context length (characters)")
        .default(retrieval.max_context_length.max(chunk_size))
        .validate_with(|input: &usize| -> Result<(), String> {
            if *input >= chunk_size {
                Ok(())
            } else {
                Err(format!("Context length must be at least {chunk_size}"))
            }
        })
        .interact_text()?;

    *retrieval = RetrievalConfig {
        chunk_size,
        max_context_length,
    };
    retrieval.validate()?;

    Ok(())
}

fn configure_documents(documents: &mut DocumentsConfig) -> Result<()> {
    let location: String = Input::new()
        .with_prompt("Documents location (directory or listing URL)")
        .default(documents.location.clone())
        .validate_with(|input: &String| -> Result<(), ConfigError> {
            DocumentsConfig {
                location: input.clone(),
            }
            .validate()
        })
        .interact_text()?;

    documents.set_location(location)?;
    Ok(())
}

fn non_empty(input: &str) -> Result<(), &'static str> {
    if input.trim().is_empty() {
        Err("Model name cannot be empty")
    } else {
        Ok(())
    }
}

/// Any HTTP answer, including 401 without a key, means the service is reachable
fn test_service_connection(service: &ServiceConfig) -> bool {
    let Ok(url) = service.service_url().and_then(|base| {
        base.join("models")
            .map_err(|_| ConfigError::InvalidUrl(service.base_url.clone()))
    }) else {
        return false;
    };

    let agent = crate::http::build_agent(Duration::from_secs(5));
    crate::http::get(&agent, url.as_str()).is_ok()
}

#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Select};

use super::{ChatConfig, Config, EmbeddingConfig, parse_endpoint};
use crate::chat::ChatProviderKind;
use crate::embeddings::chunking::ChunkingConfig;

#[inline]
pub fn run_interactive_config() -> Result<()> {
    eprintln!("{}", style("🔧 PDF RAG Chat Configuration Setup").bold().cyan());
    eprintln!();

    let mut config = load_existing_config()?;

    eprintln!("{}", style("Embedding Provider").bold().yellow());
    eprintln!("Configure the OpenAI-compatible endpoint used to index uploaded documents.");
    eprintln!();
    configure_embedding(&mut config.embedding)?;

    eprintln!();
    eprintln!("{}", style("Chat Provider").bold().yellow());
    configure_chat(&mut config.chat)?;

    eprintln!();
    eprintln!("{}", style("Retrieval").bold().yellow());
    configure_retrieval(&mut config)?;

    eprintln!();
    eprintln!("{}", style("Testing configuration...").yellow());

    if test_embedding_endpoint(&config.embedding) {
        eprintln!("{}", style("✓ Embedding endpoint reachable!").green());
    } else {
        eprintln!(
            "{}",
            style("⚠ Warning: Could not reach the embedding endpoint").yellow()
        );
        eprintln!("You can continue, but uploads will fail until it is reachable.");
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
pub fn show_config() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Server:").bold().yellow());
    eprintln!("  Bind: {}", style(config.server.bind_address()).cyan());
    eprintln!(
        "  Upload limit: {} bytes",
        style(config.server.max_upload_bytes).cyan()
    );

    eprintln!();
    eprintln!("{}", style("Embeddings:").bold().yellow());
    eprintln!("  Endpoint: {}", style(&config.embedding.base_url).cyan());
    eprintln!("  Model: {}", style(&config.embedding.model).cyan());
    eprintln!("  Batch Size: {}", style(config.embedding.batch_size).cyan());

    eprintln!();
    eprintln!("{}", style("Chat:").bold().yellow());
    eprintln!(
        "  Default provider: {}",
        style(&config.chat.default_provider).cyan()
    );
    eprintln!("  Default model: {}", style(&config.chat.default_model).cyan());
    eprintln!("  OpenAI endpoint: {}", style(&config.chat.openai_base_url).cyan());
    eprintln!(
        "  Together endpoint: {}",
        style(&config.chat.together_base_url).cyan()
    );

    eprintln!();
    eprintln!("{}", style("Retrieval:").bold().yellow());
    eprintln!(
        "  Chunk size / overlap: {} / {}",
        style(config.chunking.chunk_size).cyan(),
        style(config.chunking.chunk_overlap).cyan()
    );
    eprintln!("  Top k: {}", style(config.retrieval.top_k).cyan());

    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );

    Ok(())
}

fn load_existing_config() -> Result<Config> {
    Config::load().map_or_else(
        |_| {
            eprintln!(
                "{}",
                style("No existing configuration found. Using defaults.").yellow()
            );
            Ok(Config {
                base_dir: Config::config_dir()?,
                ..Config::default()
            })
        },
        |config| {
            eprintln!("{}", style("Found existing configuration.").green());
            Ok(config)
        },
    )
}

fn configure_embedding(embedding: &mut EmbeddingConfig) -> Result<()> {
    let base_url: String = Input::new()
        .with_prompt("Embedding endpoint")
        .default(embedding.base_url.clone())
        .validate_with(|input: &String| -> Result<(), String> {
            parse_endpoint(input).map(|_| ()).map_err(|e| e.to_string())
        })
        .interact_text()?;

    let model: String = Input::new()
        .with_prompt("Embedding model")
        .default(embedding.model.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Model name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let batch_size: usize = Input::new()
        .with_prompt("Texts per embedding request")
        .default(embedding.batch_size)
        .validate_with(|input: &usize| -> Result<(), &str> {
            if *input == 0 {
                Err("Batch size must be greater than 0")
            } else if *input > 2048 {
                Err("Batch size must be 2048 or less")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    embedding.set_base_url(base_url)?;
    embedding.set_model(model)?;
    embedding.set_batch_size(batch_size)?;

    Ok(())
}

fn configure_chat(chat: &mut ChatConfig) -> Result<()> {
    let providers: Vec<&str> = ChatProviderKind::ALL.iter().map(|p| p.as_str()).collect();
    let default_index = providers
        .iter()
        .position(|&p| p == chat.default_provider)
        .unwrap_or(0);

    let provider_index = Select::new()
        .with_prompt("Default chat provider")
        .default(default_index)
        .items(&providers)
        .interact()?;
    let provider = ChatProviderKind::ALL[provider_index];

    let models = provider.available_models();
    let model_index = Select::new()
        .with_prompt("Default chat model")
        .default(
            models
                .iter()
                .position(|&m| m == chat.default_model)
                .unwrap_or(0),
        )
        .items(models)
        .interact()?;

    chat.set_default_provider(provider.as_str().to_string())?;
    chat.set_default_model(models[model_index].to_string())?;

    Ok(())
}

fn configure_retrieval(config: &mut Config) -> Result<()> {
    let chunk_size: usize = Input::new()
        .with_prompt("Chunk size (characters)")
        .default(config.chunking.chunk_size)
        .validate_with(|input: &usize| -> Result<(), &str> {
            if *input == 0 {
                Err("Chunk size must be greater than 0")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let chunk_overlap: usize = Input::new()
        .with_prompt("Chunk overlap (characters)")
        .default(config.chunking.chunk_overlap.min(chunk_size - 1))
        .validate_with(|input: &usize| -> Result<(), &str> {
            if *input >= chunk_size {
                Err("Overlap must be smaller than the chunk size")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let top_k: usize = Input::new()
        .with_prompt("Passages retrieved per question")
        .default(config.retrieval.top_k)
        .validate_with(|input: &usize| -> Result<(), &str> {
            if (1..=100).contains(input) {
                Ok(())
            } else {
                Err("Top k must be between 1 and 100")
            }
        })
        .interact_text()?;

    config.chunking = ChunkingConfig {
        chunk_size,
        chunk_overlap,
    };
    config.retrieval.top_k = top_k;
    config.validate()?;

    Ok(())
}

fn test_embedding_endpoint(embedding: &EmbeddingConfig) -> bool {
    let Ok(Ok(url)) = embedding.endpoint().map(|base| base.join("models")) else {
        return false;
    };

    let agent: ureq::Agent = ureq::Agent::config_builder()
        .timeout_global(Some(std::time::Duration::from_secs(5)))
        .build()
        .into();

    // Any HTTP answer, including 401 without a key, proves the endpoint is up
    match agent.get(url.as_str()).call() {
        Ok(_) => true,
        Err(ureq::Error::StatusCode(code)) => (400..500).contains(&code),
        Err(_) => false,
    }
}

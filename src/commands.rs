use anyhow::{Context, Result, anyhow};
use console::style;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use itertools::Itertools;
use serde_json::{Value, json};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::chat::{ChatProviderKind, LanguageModel, OpenAiCompatibleClient};
use crate::config::Config;
use crate::embeddings::{CharacterTextSplitter, EmbeddingProvider, OpenAiEmbeddingClient};
use crate::rag::{IndexedDocument, RagChat};
use crate::server;

pub const DEFAULT_SYSTEM_MESSAGE: &str = "You are a helpful assistant.";
pub const DEFAULT_CHECK_URL: &str = "http://localhost:8000";

/// Start the HTTP API, optionally overriding the configured address
#[inline]
pub async fn serve(host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config.validate().context("Invalid configuration")?;

    info!(
        "Starting server on {} (embedding model {}, top-k {})",
        config.server.bind_address(),
        config.embedding.model,
        config.retrieval.top_k
    );
    server::serve(&config).await
}

/// Options for a one-off question against a local document
#[derive(Debug, Clone, Default)]
pub struct AskOptions {
    pub file: PathBuf,
    pub question: String,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub system: Option<String>,
    pub no_stream: bool,
}

/// Index `options.file` and answer `options.question` from it
#[inline]
pub async fn ask(options: AskOptions) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    let provider = match options.provider.as_deref() {
        Some(raw) => raw.parse::<ChatProviderKind>()?,
        None => config.chat.default_provider_kind()?,
    };
    let model_name = options
        .model
        .clone()
        .unwrap_or_else(|| config.chat.default_model.clone());

    let chat_key = provider.resolve_api_key(options.api_key.as_deref())?;
    // Embeddings always go to the OpenAI-compatible endpoint
    let embedding_key = match provider {
        ChatProviderKind::OpenAi => chat_key.clone(),
        ChatProviderKind::Together => ChatProviderKind::OpenAi.resolve_api_key(None)?,
    };

    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(
        OpenAiEmbeddingClient::new(&config.embedding, &embedding_key)?
            .with_timeout(Duration::from_secs(config.embedding.timeout_seconds)),
    );
    let model: Arc<dyn LanguageModel> = Arc::new(OpenAiCompatibleClient::from_config(
        &config.chat,
        provider,
        &chat_key,
        &model_name,
    )?);

    let document = index_with_spinner(&options.file, &config, embedder).await?;

    let rag = RagChat::new(model).with_top_k(config.retrieval.top_k);
    let system = options.system.as_deref().unwrap_or(DEFAULT_SYSTEM_MESSAGE);

    if options.no_stream {
        let (answer, grounding) = rag
            .answer(system, &options.question, Some(&document))
            .await?;
        eprintln!("{}", style(format!("grounding: {}", grounding)).dim());
        println!("{}", answer);
        return Ok(());
    }

    let answer = rag
        .stream_answer(system, &options.question, Some(&document))
        .await?;
    eprintln!("{}", style(format!("grounding: {}", answer.grounding)).dim());

    let mut deltas = answer.deltas;
    let mut stdout = std::io::stdout();
    while let Some(delta) = deltas.next().await {
        let delta = delta?;
        stdout
            .write_all(delta.as_bytes())
            .context("Failed to write answer")?;
        stdout.flush().context("Failed to write answer")?;
    }
    writeln!(stdout).context("Failed to write answer")?;

    Ok(())
}

async fn index_with_spinner(
    path: &Path,
    config: &Config,
    embedder: Arc<dyn EmbeddingProvider>,
) -> Result<IndexedDocument> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow!("{} is not a file", path.display()))?;
    let splitter = CharacterTextSplitter::from_config(&config.chunking)?;

    let bar = if console::user_attended_stderr() {
        ProgressBar::new_spinner().with_style(
            ProgressStyle::with_template("{spinner} Indexing {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        )
    } else {
        ProgressBar::hidden()
    };
    bar.set_message(file_name.clone());
    bar.enable_steady_tick(Duration::from_millis(100));

    let result = IndexedDocument::build(path, &file_name, &splitter, embedder).await;
    bar.finish_and_clear();

    let document = result.with_context(|| format!("Failed to index {}", path.display()))?;
    eprintln!(
        "{} {} ({} chunks)",
        style("✓ Indexed").green(),
        document.file_name(),
        document.chunk_count()
    );
    Ok(document)
}

/// Result of one smoke-test step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub name: &'static str,
    pub passed: bool,
    pub detail: String,
}

impl CheckOutcome {
    fn from_result(name: &'static str, result: Result<String>) -> Self {
        match result {
            Ok(detail) => Self {
                name,
                passed: true,
                detail,
            },
            Err(e) => Self {
                name,
                passed: false,
                detail: format!("{:#}", e),
            },
        }
    }
}

/// Exercise health, status and chat against a running server
#[inline]
pub fn run_checks(base_url: &str, api_key: Option<&str>) -> Vec<CheckOutcome> {
    let base = base_url.trim_end_matches('/');
    let agent: ureq::Agent = ureq::Agent::config_builder()
        .timeout_global(Some(Duration::from_secs(60)))
        .build()
        .into();

    vec![
        CheckOutcome::from_result("Health Check", check_health(&agent, base)),
        CheckOutcome::from_result("PDF Status", check_status(&agent, base)),
        CheckOutcome::from_result("Chat without PDF", check_chat(&agent, base, api_key)),
    ]
}

fn get_json(agent: &ureq::Agent, url: &str) -> Result<Value> {
    debug!("GET {}", url);
    let body = agent
        .get(url)
        .call()
        .and_then(|mut resp| resp.body_mut().read_to_string())
        .with_context(|| format!("GET {} failed", url))?;
    serde_json::from_str(&body).with_context(|| format!("{} did not return JSON", url))
}

fn check_health(agent: &ureq::Agent, base: &str) -> Result<String> {
    let body = get_json(agent, &format!("{}/api/health", base))?;
    if body["status"] == "ok" {
        Ok(body.to_string())
    } else {
        Err(anyhow!("unexpected health response {}", body))
    }
}

fn check_status(agent: &ureq::Agent, base: &str) -> Result<String> {
    let body = get_json(agent, &format!("{}/api/pdf-status", base))?;
    if body.get("pdf_uploaded").is_some_and(Value::is_boolean) {
        Ok(body.to_string())
    } else {
        Err(anyhow!("unexpected status response {}", body))
    }
}

fn check_chat(agent: &ureq::Agent, base: &str, api_key: Option<&str>) -> Result<String> {
    let api_key = ChatProviderKind::OpenAi.resolve_api_key(api_key)?;
    let url = format!("{}/api/chat", base);
    let payload = json!({
        "developer_message": DEFAULT_SYSTEM_MESSAGE,
        "user_message": "Hello, how are you?",
        "model": "gpt-4o-mini",
        "api_key": api_key,
    });

    debug!("POST {}", url);
    let mut response = agent
        .post(&url)
        .header("Content-Type", "application/json")
        .send(payload.to_string().as_str())
        .with_context(|| format!("POST {} failed", url))?;

    let mut text = String::new();
    response
        .body_mut()
        .as_reader()
        .read_to_string(&mut text)
        .context("Failed to read streamed answer")?;

    if text.trim().is_empty() {
        warn!("Chat check returned an empty answer");
        return Err(anyhow!("empty answer"));
    }
    Ok(text)
}

/// Run the smoke test and print a PASS/FAIL report
#[inline]
pub async fn check(url: Option<String>, api_key: Option<String>) -> Result<()> {
    let url = url.unwrap_or_else(|| DEFAULT_CHECK_URL.to_string());

    println!("{}", style("Testing PDF RAG Chat API").bold());
    println!("{}", "=".repeat(50));

    let target = url.clone();
    let outcomes = tokio::task::spawn_blocking(move || run_checks(&target, api_key.as_deref()))
        .await
        .context("Smoke test task failed")?;

    for outcome in &outcomes {
        let mark = if outcome.passed {
            style("PASS").green()
        } else {
            style("FAIL").red()
        };
        println!("  {}: {}", outcome.name, mark);
        println!("    {}", outcome.detail.lines().join("\n    "));
    }

    let passed = outcomes.iter().filter(|o| o.passed).count();
    println!();
    println!("Overall: {}/{} checks passed against {}", passed, outcomes.len(), url);

    if passed == outcomes.len() {
        Ok(())
    } else {
        Err(anyhow!("{} of {} checks failed", outcomes.len() - passed, outcomes.len()))
    }
}

//! HTTP API
//!
//! The router exposes document upload, grounded chat and a few status
//! endpoints. All handlers share one [`AppState`], which owns the live
//! [`DocumentSession`] and builds provider clients per request from the
//! caller's credential.

pub mod errors;
pub mod handlers;
pub mod protocol;
pub mod validation;


use anyhow::{Context, Result};
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::chat::{ChatProviderKind, LanguageModel, OpenAiCompatibleClient};
use crate::config::{ChatConfig, Config, EmbeddingConfig};
use crate::embeddings::{CharacterTextSplitter, EmbeddingProvider, OpenAiEmbeddingClient};
use crate::rag::DocumentSession;

pub use errors::ApiError;

/// Builds provider clients from a per-request credential
pub trait ProviderFactory: Send + Sync {
    fn embedder(&self, api_key: &str) -> crate::Result<Arc<dyn EmbeddingProvider>>;

    fn language_model(
        &self,
        provider: ChatProviderKind,
        api_key: &str,
        model: &str,
    ) -> crate::Result<Arc<dyn LanguageModel>>;
}

/// Provider clients pointed at the configured endpoints
#[derive(Debug, Clone)]
pub struct ConfiguredProviders {
    embedding: EmbeddingConfig,
    chat: ChatConfig,
}

impl ConfiguredProviders {
    #[inline]
    pub fn new(embedding: EmbeddingConfig, chat: ChatConfig) -> Self {
        Self { embedding, chat }
    }
}

impl ProviderFactory for ConfiguredProviders {
    #[inline]
    fn embedder(&self, api_key: &str) -> crate::Result<Arc<dyn EmbeddingProvider>> {
        let client = OpenAiEmbeddingClient::new(&self.embedding, api_key)?
            .with_timeout(Duration::from_secs(self.embedding.timeout_seconds));
        Ok(Arc::new(client))
    }

    #[inline]
    fn language_model(
        &self,
        provider: ChatProviderKind,
        api_key: &str,
        model: &str,
    ) -> crate::Result<Arc<dyn LanguageModel>> {
        let client = OpenAiCompatibleClient::from_config(&self.chat, provider, api_key, model)?;
        Ok(Arc::new(client))
    }
}

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<DocumentSession>,
    pub providers: Arc<dyn ProviderFactory>,
    pub splitter: CharacterTextSplitter,
    pub top_k: usize,
    pub max_upload_bytes: usize,
}

impl AppState {
    /// State with real provider clients
    #[inline]
    pub fn from_config(config: &Config) -> crate::Result<Self> {
        let providers = ConfiguredProviders::new(config.embedding.clone(), config.chat.clone());
        Self::with_providers(config, Arc::new(providers))
    }

    #[inline]
    pub fn with_providers(
        config: &Config,
        providers: Arc<dyn ProviderFactory>,
    ) -> crate::Result<Self> {
        Ok(Self {
            session: Arc::new(DocumentSession::new()),
            providers,
            splitter: CharacterTextSplitter::from_config(&config.chunking)?,
            top_k: config.retrieval.top_k,
            max_upload_bytes: config.server.max_upload_bytes,
        })
    }
}

#[inline]
pub fn router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/pdf-status", get(handlers::pdf_status))
        .route("/api/clear-pdf", post(handlers::clear_pdf))
        .route("/api/models", get(handlers::models))
        .route("/api/upload-pdf", post(handlers::upload_pdf))
        .route("/api/chat", post(handlers::chat))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve on an already bound listener until `shutdown` resolves
#[inline]
pub async fn serve_on<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let address = listener
        .local_addr()
        .context("Failed to read listener address")?;
    info!("Listening on http://{}", address);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed")
}

/// Bind the configured address and serve until Ctrl-C
#[inline]
pub async fn serve(config: &Config) -> Result<()> {
    let address = config.server.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    let state = AppState::from_config(config)?;

    serve_on(listener, state, async {
        let _ = tokio::signal::ctrl_c().await;
        info!("Shutdown signal received");
    })
    .await
}

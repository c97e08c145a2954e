
use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use url::Url;

use super::sse::{SseDecoder, SseEvent};
use super::{ChatCompletion, ChatMessage, ChatProviderKind, DeltaStream, LanguageModel};
use crate::config::ChatConfig;
use crate::{RagError, Result};

const DEFAULT_STREAM_BUFFER: usize = 64;
const DEFAULT_TIMEOUT_SECONDS: u64 = 120;
const CONNECT_TIMEOUT_SECONDS: u64 = 10;
const MAX_ERROR_BODY_CHARS: usize = 300;

/// Chat completions client for any OpenAI-compatible endpoint
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleClient {
    http: reqwest::Client,
    kind: ChatProviderKind,
    base_url: Url,
    api_key: String,
    model: String,
    stream_buffer: usize,
    timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderInfo {
    pub provider: ChatProviderKind,
    pub model: String,
    pub base_url: String,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl OpenAiCompatibleClient {
    #[inline]
    pub fn new(kind: ChatProviderKind, base_url: Url, api_key: &str, model: &str) -> Result<Self> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(RagError::Configuration(format!(
                "an API key is required for provider {}",
                kind
            )));
        }
        if model.trim().is_empty() {
            return Err(RagError::Configuration(
                "a model identifier is required".to_string(),
            ));
        }

        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECONDS))
            .build()
            .map_err(|e| RagError::Configuration(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            kind,
            base_url,
            api_key: api_key.to_string(),
            model: model.trim().to_string(),
            stream_buffer: DEFAULT_STREAM_BUFFER,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
        })
    }

    /// Build a client for `kind` using the endpoint and limits in `config`
    #[inline]
    pub fn from_config(
        config: &ChatConfig,
        kind: ChatProviderKind,
        api_key: &str,
        model: &str,
    ) -> Result<Self> {
        let base_url = config.base_url_for(kind)?;
        Ok(Self::new(kind, base_url, api_key, model)?
            .with_stream_buffer(config.stream_buffer)
            .with_timeout(Duration::from_secs(config.timeout_seconds)))
    }

    #[inline]
    pub fn with_stream_buffer(mut self, capacity: usize) -> Self {
        self.stream_buffer = capacity.max(1);
        self
    }

    /// Timeout for non-streaming completions
    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[inline]
    pub const fn kind(&self) -> ChatProviderKind {
        self.kind
    }

    #[inline]
    pub fn provider_info(&self) -> ProviderInfo {
        ProviderInfo {
            provider: self.kind,
            model: self.model.clone(),
            base_url: self.base_url.to_string(),
        }
    }

    fn completions_url(&self) -> Result<Url> {
        self.base_url.join("chat/completions").map_err(|e| {
            RagError::Configuration(format!("invalid chat completions URL: {}", e))
        })
    }

    async fn send(&self, messages: &[ChatMessage], stream: bool) -> Result<reqwest::Response> {
        let url = self.completions_url()?;
        let body = CompletionRequest {
            model: &self.model,
            messages,
            stream,
        };

        debug!(
            "Sending chat completion to {} (provider {}, model {}, stream {})",
            url, self.kind, self.model, stream
        );

        let mut request = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&body);
        if !stream {
            request = request.timeout(self.timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RagError::GenerationProvider(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Chat provider {} returned {}", self.kind, status);
            return Err(RagError::GenerationProvider(describe_http_error(
                status.as_u16(),
                &body,
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl LanguageModel for OpenAiCompatibleClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<ChatCompletion> {
        let response = self.send(messages, false).await?;
        let completion: ChatCompletion = response.json().await.map_err(|e| {
            RagError::GenerationProvider(format!("failed to parse completion: {}", e))
        })?;

        info!(
            "Completion received from {} ({} choices)",
            self.kind,
            completion.choices.len()
        );
        Ok(completion)
    }

    async fn stream(&self, messages: &[ChatMessage]) -> Result<DeltaStream> {
        let response = self.send(messages, true).await?;
        let provider = self.kind;

        Ok(DeltaStream::spawn(self.stream_buffer, move |sender| {
            forward_deltas(response, sender, provider)
        }))
    }
}

/// Pump SSE events from the response body into `sender` until the provider
/// finishes, fails, or the consumer goes away.
async fn forward_deltas(
    response: reqwest::Response,
    sender: mpsc::Sender<Result<String>>,
    provider: ChatProviderKind,
) {
    let mut body = response.bytes_stream();
    let mut decoder = SseDecoder::new();
    let mut forwarded = 0usize;

    while let Some(chunk) = body.next().await {
        let decoded = match chunk {
            Ok(bytes) => decoder.push(&bytes),
            Err(e) => vec![Err(RagError::GenerationProvider(format!(
                "stream interrupted: {}",
                e
            )))],
        };

        for item in decoded {
            if !forward(&sender, item, provider, &mut forwarded).await {
                return;
            }
        }
    }

    if let Some(item) = decoder.finish() {
        forward(&sender, item, provider, &mut forwarded).await;
    }

    debug!("{} stream ended after {} deltas", provider, forwarded);
}

/// Send one decoded item on; false once the stream should stop
async fn forward(
    sender: &mpsc::Sender<Result<String>>,
    item: Result<SseEvent>,
    provider: ChatProviderKind,
    forwarded: &mut usize,
) -> bool {
    match item {
        Ok(SseEvent::Delta(text)) => {
            if sender.send(Ok(text)).await.is_err() {
                debug!("Consumer dropped {} stream, stopping", provider);
                return false;
            }
            *forwarded += 1;
            true
        }
        Ok(SseEvent::Done) => {
            debug!("{} stream done after {} deltas", provider, forwarded);
            false
        }
        Err(e) => {
            warn!("{} stream failed after {} deltas: {}", provider, forwarded, e);
            let _ = sender.send(Err(e)).await;
            false
        }
    }
}

fn describe_http_error(status: u16, body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
        return format!("HTTP {}: {}", status, envelope.error.message);
    }

    let body = body.trim();
    if body.is_empty() {
        format!("HTTP {}", status)
    } else {
        let excerpt: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
        format!("HTTP {}: {}", status, excerpt)
    }
}

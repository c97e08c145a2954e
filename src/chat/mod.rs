//! Language model clients
//!
//! A single [`LanguageModel`] capability covers every chat provider. Provider
//! differences (endpoint, credential variable, model catalogue) live in
//! [`ChatProviderKind`] and are resolved once at construction time.

pub mod openai;
pub mod sse;


use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::pin::Pin;
use std::str::FromStr;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

use crate::config::ConfigError;
use crate::{RagError, Result};

pub use openai::{OpenAiCompatibleClient, ProviderInfo};

const OPENAI_MODELS: &[&str] = &[
    "gpt-4o-mini",
    "gpt-4o",
    "gpt-4-turbo",
    "gpt-4",
    "gpt-3.5-turbo",
];

const TOGETHER_MODELS: &[&str] = &[
    "meta-llama/Meta-Llama-3.1-8B-Instruct-Turbo",
    "meta-llama/Meta-Llama-3.1-70B-Instruct-Turbo",
    "meta-llama/Meta-Llama-3.1-405B-Instruct-Turbo",
    "mistralai/Mixtral-8x7B-Instruct-v0.1",
    "mistralai/Mixtral-8x22B-Instruct-v0.1",
    "NousResearch/Nous-Hermes-2-Mixtral-8x7B-DPO",
    "Qwen/Qwen2-72B-Instruct",
    "microsoft/DialoGPT-medium",
];

/// OpenAI-compatible chat providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatProviderKind {
    #[serde(rename = "openai")]
    OpenAi,
    Together,
}

impl ChatProviderKind {
    pub const ALL: [Self; 2] = [Self::OpenAi, Self::Together];

    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Together => "together",
        }
    }

    #[inline]
    pub const fn default_base_url(self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Together => "https://api.together.xyz/v1",
        }
    }

    /// Environment variable consulted when no credential is given explicitly
    #[inline]
    pub const fn api_key_env(self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Together => "TOGETHER_API_KEY",
        }
    }

    #[inline]
    pub const fn available_models(self) -> &'static [&'static str] {
        match self {
            Self::OpenAi => OPENAI_MODELS,
            Self::Together => TOGETHER_MODELS,
        }
    }

    /// Use the explicit key when present and non-blank, otherwise the
    /// provider's environment variable.
    #[inline]
    pub fn resolve_api_key(self, explicit: Option<&str>) -> Result<String> {
        if let Some(key) = explicit.map(str::trim).filter(|k| !k.is_empty()) {
            return Ok(key.to_string());
        }

        std::env::var(self.api_key_env())
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| RagError::Configuration(format!("{} is not set", self.api_key_env())))
    }
}

impl fmt::Display for ChatProviderKind {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatProviderKind {
    type Err = ConfigError;

    #[inline]
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "together" => Ok(Self::Together),
            _ => Err(ConfigError::UnsupportedProvider(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    #[inline]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    #[inline]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Full non-streaming response; only `choices[0].message` is relied on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletion {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    pub choices: Vec<CompletionChoice>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionChoice {
    pub message: CompletionMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletion {
    /// Text of the first choice
    #[inline]
    pub fn text(&self) -> Option<&str> {
        self.choices.first()?.message.content.as_deref()
    }
}

/// Chat completion capability shared by every provider
#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn model(&self) -> &str;

    /// Run a completion and return the provider's full response object
    async fn complete(&self, messages: &[ChatMessage]) -> Result<ChatCompletion>;

    /// Start a streaming completion. Failures before the first delta are
    /// returned here; later failures arrive as an `Err` item on the stream.
    async fn stream(&self, messages: &[ChatMessage]) -> Result<DeltaStream>;

    /// Run a completion and return only the text of the first choice
    async fn complete_text(&self, messages: &[ChatMessage]) -> Result<String> {
        let completion = self.complete(messages).await?;
        completion.text().map(str::to_string).ok_or_else(|| {
            RagError::GenerationProvider("completion contained no message content".to_string())
        })
    }
}

/// Ordered text deltas pushed by a producer task through a bounded channel.
///
/// Dropping the stream aborts the producer, which releases its upstream
/// connection.
#[derive(Debug)]
pub struct DeltaStream {
    receiver: mpsc::Receiver<Result<String>>,
    producer: Option<AbortHandle>,
}

impl DeltaStream {
    /// Spawn `produce` with the sending half of a channel of `capacity` slots
    #[inline]
    pub fn spawn<F, Fut>(capacity: usize, produce: F) -> Self
    where
        F: FnOnce(mpsc::Sender<Result<String>>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(produce(sender));
        Self {
            receiver,
            producer: Some(handle.abort_handle()),
        }
    }

    #[inline]
    pub fn from_receiver(receiver: mpsc::Receiver<Result<String>>) -> Self {
        Self {
            receiver,
            producer: None,
        }
    }

    /// Receive the next delta, `None` once the producer has finished
    #[inline]
    pub async fn recv(&mut self) -> Option<Result<String>> {
        self.receiver.recv().await
    }

    /// Drain the stream into one string, stopping at the first error
    #[inline]
    pub async fn collect_text(mut self) -> Result<String> {
        let mut text = String::new();
        while let Some(delta) = self.recv().await {
            text.push_str(&delta?);
        }
        Ok(text)
    }
}

impl Stream for DeltaStream {
    type Item = Result<String>;

    #[inline]
    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

impl Drop for DeltaStream {
    #[inline]
    fn drop(&mut self) {
        if let Some(producer) = self.producer.take() {
            producer.abort();
        }
    }
}

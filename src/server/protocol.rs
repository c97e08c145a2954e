//! Request and response bodies for the HTTP API

use serde::{Deserialize, Serialize};

use crate::chat::ChatProviderKind;

pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_PROVIDER: &str = "openai";

/// Header naming how the chat answer was grounded
pub const GROUNDING_HEADER: &str = "x-rag-grounding";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub developer_message: String,
    pub user_message: String,
    #[serde(default = "default_model")]
    pub model: String,
    pub api_key: String,
    #[serde(default = "default_provider")]
    pub api_provider: String,
}

fn default_model() -> String {
    DEFAULT_CHAT_MODEL.to_string()
}

fn default_provider() -> String {
    DEFAULT_PROVIDER.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub chunks_count: usize,
}

impl UploadResponse {
    #[inline]
    pub fn processed(chunks_count: usize) -> Self {
        Self {
            success: true,
            message: format!(
                "PDF processed successfully. Extracted {} text chunks.",
                chunks_count
            ),
            chunks_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearResponse {
    pub success: bool,
    pub message: String,
}

impl ClearResponse {
    #[inline]
    pub fn cleared() -> Self {
        Self {
            success: true,
            message: "PDF cleared successfully".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub openai: Vec<String>,
    pub together: Vec<String>,
}

impl ModelsResponse {
    #[inline]
    pub fn catalogue() -> Self {
        let models = |kind: ChatProviderKind| {
            kind.available_models()
                .iter()
                .map(|m| (*m).to_string())
                .collect()
        };

        Self {
            openai: models(ChatProviderKind::OpenAi),
            together: models(ChatProviderKind::Together),
        }
    }
}

use axum::Json;
use axum::body::{Body, Bytes};
use axum::extract::{Multipart, State};
use axum::http::{StatusCode, header};
use axum::response::Response;
use futures::StreamExt;
use tracing::{debug, info, warn};

use super::AppState;
use super::errors::ApiError;
use super::protocol::{
    ChatRequest, ClearResponse, DEFAULT_PROVIDER, GROUNDING_HEADER, HealthResponse,
    ModelsResponse, UploadResponse,
};
use super::validation::{parse_provider, require_api_key, require_pdf_file_name};
use crate::rag::{IndexedDocument, RagChat, SessionStatus};

#[inline]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

#[inline]
pub async fn pdf_status(State(state): State<AppState>) -> Json<SessionStatus> {
    Json(state.session.status().await)
}

#[inline]
pub async fn clear_pdf(State(state): State<AppState>) -> Json<ClearResponse> {
    state.session.clear().await;
    Json(ClearResponse::cleared())
}

#[inline]
pub async fn models() -> Json<ModelsResponse> {
    Json(ModelsResponse::catalogue())
}

/// Fields of the upload form
#[derive(Debug, Default)]
struct UploadForm {
    file_name: Option<String>,
    file: Option<Bytes>,
    api_key: Option<String>,
    api_provider: Option<String>,
}

async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                form.file_name = field.file_name().map(str::to_string);
                form.file = Some(field.bytes().await?);
            }
            "api_key" => form.api_key = Some(field.text().await?),
            "api_provider" => form.api_provider = Some(field.text().await?),
            other => debug!("Ignoring unexpected upload field {:?}", other),
        }
    }

    Ok(form)
}

/// Index an uploaded PDF and make it the live document
#[inline]
pub async fn upload_pdf(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let form = read_upload_form(multipart).await?;

    let api_key = require_api_key(form.api_key.as_deref())?;
    let file_name = require_pdf_file_name(form.file_name.as_deref())?;
    let provider = parse_provider(form.api_provider.as_deref().unwrap_or(DEFAULT_PROVIDER))?;
    let bytes = form
        .file
        .ok_or_else(|| ApiError::bad_request("A PDF file is required"))?;

    info!(
        "Received {} ({} bytes) for indexing, chat provider {}",
        file_name,
        bytes.len(),
        provider
    );

    let temp_file = tempfile::Builder::new()
        .prefix("upload-")
        .suffix(".pdf")
        .tempfile()
        .map_err(|e| ApiError::internal(format!("Failed to stage upload: {}", e)))?;
    tokio::fs::write(temp_file.path(), &bytes)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to stage upload: {}", e)))?;

    let embedder = state.providers.embedder(&api_key)?;
    let document =
        IndexedDocument::build(temp_file.path(), &file_name, &state.splitter, embedder).await;

    // The staged copy is only needed while loading
    if let Err(e) = temp_file.close() {
        warn!("Failed to remove staged upload: {}", e);
    }

    let document = state.session.publish(document?).await;
    Ok(Json(UploadResponse::processed(document.chunk_count())))
}

/// Stream an answer, grounded in the live document when there is one
#[inline]
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Response, ApiError> {
    let provider = parse_provider(&request.api_provider)?;
    let api_key = require_api_key(Some(&request.api_key))?;

    let model = state
        .providers
        .language_model(provider, &api_key, &request.model)?;
    let rag = RagChat::new(model).with_top_k(state.top_k);

    let document = state.session.snapshot().await;
    let answer = rag
        .stream_answer(
            &request.developer_message,
            &request.user_message,
            document.as_deref(),
        )
        .await?;

    info!(
        "Streaming {} answer from {} ({})",
        answer.grounding, provider, request.model
    );

    let deltas = answer.deltas.inspect(|delta| {
        if let Err(e) = delta {
            warn!("Answer stream ended with an error: {}", e);
        }
    });

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(GROUNDING_HEADER, answer.grounding.label())
        .body(Body::from_stream(deltas))
        .map_err(|e| ApiError::internal(format!("Failed to build response: {}", e)))
}

//! HTTP error responses
//!
//! Every failure leaves the server as a JSON body `{"detail": "..."}` with a
//! status derived from the [`RagError`] category.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::{error, warn};

use crate::RagError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    detail: &'a str,
}

impl ApiError {
    #[inline]
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    #[inline]
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    #[inline]
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, detail)
    }

    #[inline]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    #[inline]
    pub fn detail(&self) -> &str {
        &self.detail
    }
}

/// Status code for each error category
#[inline]
pub const fn status_for(err: &RagError) -> StatusCode {
    match err {
        RagError::Configuration(_) | RagError::UnreadableDocument(_) => StatusCode::BAD_REQUEST,
        RagError::EmbeddingProvider(_) | RagError::GenerationProvider(_) => {
            StatusCode::BAD_GATEWAY
        }
        RagError::DimensionMismatch { .. } | RagError::Io(_) | RagError::Other(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<RagError> for ApiError {
    #[inline]
    fn from(err: RagError) -> Self {
        Self::new(status_for(&err), err.to_string())
    }
}

impl From<axum::extract::multipart::MultipartError> for ApiError {
    #[inline]
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        Self::new(err.status(), format!("Invalid upload: {}", err.body_text()))
    }
}

impl IntoResponse for ApiError {
    #[inline]
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!("Request failed with {}: {}", self.status, self.detail);
        } else {
            warn!("Request rejected with {}: {}", self.status, self.detail);
        }

        (
            self.status,
            Json(ErrorBody {
                detail: &self.detail,
            }),
        )
            .into_response()
    }
}

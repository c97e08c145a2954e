//! Input checks shared by the upload and chat handlers

use std::path::Path;

use super::errors::ApiError;
use crate::chat::ChatProviderKind;

/// Trimmed, non-blank credential
#[inline]
pub fn require_api_key(raw: Option<&str>) -> Result<String, ApiError> {
    raw.map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::bad_request("API key is required"))
}

/// Accept only file names ending in `.pdf`, in any case
#[inline]
pub fn require_pdf_file_name(raw: Option<&str>) -> Result<String, ApiError> {
    let name = raw.map(str::trim).unwrap_or_default();
    let is_pdf = Path::new(name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

    if is_pdf {
        Ok(name.to_string())
    } else {
        Err(ApiError::bad_request("Only PDF files are allowed"))
    }
}

#[inline]
pub fn parse_provider(raw: &str) -> Result<ChatProviderKind, ApiError> {
    raw.parse().map_err(|_| {
        ApiError::bad_request("Invalid API provider. Must be 'openai' or 'together'")
    })
}

//! Server-sent events decoding for streamed chat completions
//!
//! Bytes are buffered until a full line is available, so multi-byte characters
//! split across network chunks decode correctly.

#[cfg(test)]
mod tests;

use serde::Deserialize;
use tracing::debug;

use crate::{RagError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// Non-empty content from `choices[0].delta.content`
    Delta(String),
    /// The provider sent `[DONE]`
    Done,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    error: Option<StreamError>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Option<StreamDelta>,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamError {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes and decode every completed line.
    ///
    /// Decoding stops at the first line that fails, whose error is the last
    /// item. Events decoded before it are kept.
    #[inline]
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Result<SseEvent>> {
        self.buffer.extend_from_slice(bytes);

        let mut decoded = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            match parse_line(&line) {
                Ok(Some(event)) => decoded.push(Ok(event)),
                Ok(None) => {}
                Err(e) => {
                    decoded.push(Err(e));
                    break;
                }
            }
        }
        decoded
    }

    /// Flush a trailing line that was not newline-terminated
    #[inline]
    pub fn finish(&mut self) -> Option<Result<SseEvent>> {
        if self.buffer.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.buffer);
        parse_line(&line).transpose()
    }
}

fn parse_line(raw: &[u8]) -> Result<Option<SseEvent>> {
    let line = std::str::from_utf8(raw)
        .map_err(|e| RagError::GenerationProvider(format!("stream is not valid UTF-8: {}", e)))?
        .trim_end_matches(['\r', '\n']);

    if line.is_empty() || line.starts_with(':') {
        return Ok(None);
    }

    let Some(payload) = line.strip_prefix("data:") else {
        debug!("Ignoring non-data SSE field: {}", line);
        return Ok(None);
    };
    let payload = payload.trim_start();

    if payload == "[DONE]" {
        return Ok(Some(SseEvent::Done));
    }

    let chunk: StreamChunk = serde_json::from_str(payload).map_err(|e| {
        RagError::GenerationProvider(format!("malformed stream chunk: {}", e))
    })?;

    if let Some(error) = chunk.error {
        return Err(RagError::GenerationProvider(
            error
                .message
                .unwrap_or_else(|| "provider reported an error mid-stream".to_string()),
        ));
    }

    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta)
        .and_then(|delta| delta.content)
        .filter(|content| !content.is_empty())
        .map(SseEvent::Delta))
}

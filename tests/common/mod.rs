// Shared fixtures for the integration tests. Each test crate uses a subset.
#![allow(dead_code)]

use serde_json::{Value, json};
use std::fmt::Write as _;
use wiremock::{Request, Respond, ResponseTemplate};

pub fn init_test_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init()
        .ok(); // Ignore error if already initialized
}

/// Counts of a few letters plus a small bias, so no vector has zero norm
pub fn letter_vector(text: &str) -> Vec<f32> {
    ['a', 'b', 'c', 'd', 'e', 'l', 'o']
        .iter()
        .map(|letter| {
            text.chars()
                .filter(|c| c.eq_ignore_ascii_case(letter))
                .count() as f32
                + 0.01
        })
        .collect()
}

/// Answers `/embeddings` with letter vectors, listing items in reverse order
pub struct LetterEmbeddings;

impl Respond for LetterEmbeddings {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let Ok(body) = serde_json::from_slice::<Value>(&request.body) else {
            return ResponseTemplate::new(400);
        };
        let inputs: Vec<String> = body["input"]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        let data: Vec<Value> = inputs
            .iter()
            .enumerate()
            .rev()
            .map(|(index, text)| {
                json!({
                    "object": "embedding",
                    "index": index,
                    "embedding": letter_vector(text)
                })
            })
            .collect();

        ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": data,
            "model": body["model"],
            "usage": {"prompt_tokens": 0, "total_tokens": 0}
        }))
    }
}

/// SSE body carrying `deltas` as chat completion chunks
pub fn sse_body(deltas: &[&str]) -> String {
    let mut body = String::new();
    // Role-only opening chunk, as OpenAI sends
    body.push_str(
        "data: {\"id\":\"chatcmpl-1\",\"choices\":[{\"index\":0,\"delta\":{\"role\":\"assistant\",\"content\":null}}]}\n\n",
    );
    for delta in deltas {
        let chunk = json!({
            "id": "chatcmpl-1",
            "object": "chat.completion.chunk",
            "choices": [{"index": 0, "delta": {"content": delta}, "finish_reason": null}]
        });
        write!(body, "data: {}\n\n", chunk).expect("write to string");
    }
    body.push_str("data: [DONE]\n\n");
    body
}

pub fn sse_response(deltas: &[&str]) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(sse_body(deltas), "text/event-stream")
}

/// Streams the last message of the request back word by word
pub struct EchoLastMessage;

impl Respond for EchoLastMessage {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let Ok(body) = serde_json::from_slice::<Value>(&request.body) else {
            return ResponseTemplate::new(400);
        };
        let content = body["messages"]
            .as_array()
            .and_then(|messages| messages.last())
            .and_then(|message| message["content"].as_str())
            .unwrap_or_default()
            .to_string();

        let words: Vec<&str> = content.split_inclusive(' ').collect();
        sse_response(&words)
    }
}

/// Single page PDF showing `text` in Helvetica, with a correct xref table
pub fn minimal_pdf(text: &str) -> Vec<u8> {
    let content = format!("BT /F1 12 Tf 72 712 Td ({}) Tj ET", text);
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R \
         /Resources << /Font << /F1 5 0 R >> >> >>"
            .to_string(),
        format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            content.len(),
            content
        ),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
    ];

    let mut pdf = String::from("%PDF-1.4\n");
    let mut offsets = Vec::new();
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        write!(pdf, "{} 0 obj\n{}\nendobj\n", i + 1, body).expect("write to string");
    }

    let xref = pdf.len();
    write!(pdf, "xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).expect("write to string");
    for offset in offsets {
        write!(pdf, "{:010} 00000 n \n", offset).expect("write to string");
    }
    write!(
        pdf,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref
    )
    .expect("write to string");

    pdf.into_bytes()
}

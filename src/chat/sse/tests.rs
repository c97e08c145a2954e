use super::*;

fn data(content: &str) -> String {
    format!(
        "data: {}\n\n",
        serde_json::json!({"choices": [{"index": 0, "delta": {"content": content}}]})
    )
}

fn events(decoded: Vec<Result<SseEvent>>) -> Vec<SseEvent> {
    decoded
        .into_iter()
        .map(|item| item.expect("valid stream"))
        .collect()
}

#[test]
fn decodes_content_deltas_in_order() {
    let mut decoder = SseDecoder::new();
    let body = format!("{}{}data: [DONE]\n\n", data("Hel"), data("lo"));

    assert_eq!(
        events(decoder.push(body.as_bytes())),
        vec![
            SseEvent::Delta("Hel".to_string()),
            SseEvent::Delta("lo".to_string()),
            SseEvent::Done,
        ]
    );
}

#[test]
fn null_and_empty_deltas_are_dropped() {
    let mut decoder = SseDecoder::new();
    let body = concat!(
        "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n",
        "data: {\"choices\":[{\"delta\":{\"content\":null}}]}\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"\"}}]}\n",
        "data: {\"choices\":[],\"usage\":{\"total_tokens\":3}}\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"ok\"},\"finish_reason\":\"stop\"}]}\n",
    );

    assert_eq!(
        events(decoder.push(body.as_bytes())),
        vec![SseEvent::Delta("ok".to_string())]
    );
}

#[test]
fn lines_split_across_chunks_are_reassembled() {
    let mut decoder = SseDecoder::new();
    let body = data("héllo");
    let bytes = body.as_bytes();
    // Split inside the two-byte 'é'
    let split = body.find('é').expect("has accent") + 1;

    assert!(decoder.push(&bytes[..split]).is_empty());
    assert_eq!(
        events(decoder.push(&bytes[split..])),
        vec![SseEvent::Delta("héllo".to_string())]
    );
}

#[test]
fn comments_and_other_fields_are_ignored() {
    let mut decoder = SseDecoder::new();
    let body = ": keep-alive\r\nevent: message\r\nid: 7\r\n\r\n";

    assert!(decoder.push(body.as_bytes()).is_empty());
}

#[test]
fn finish_flushes_unterminated_line() {
    let mut decoder = SseDecoder::new();
    assert!(decoder.push(b"data: [DONE]").is_empty());
    assert!(matches!(decoder.finish(), Some(Ok(SseEvent::Done))));
    assert!(decoder.finish().is_none());
}

#[test]
fn provider_error_payload_is_an_error() {
    let mut decoder = SseDecoder::new();
    let body = "data: {\"error\":{\"message\":\"rate limit exceeded\"}}\n";

    let decoded = decoder.push(body.as_bytes());
    assert_eq!(decoded.len(), 1);
    assert!(matches!(
        &decoded[0],
        Err(RagError::GenerationProvider(m)) if m.contains("rate limit")
    ));
}

#[test]
fn malformed_json_is_an_error() {
    let mut decoder = SseDecoder::new();
    let decoded = decoder.push(b"data: {not json}\n");
    assert!(matches!(
        decoded.as_slice(),
        [Err(RagError::GenerationProvider(_))]
    ));
}

#[test]
fn deltas_before_an_error_in_the_same_read_are_kept() {
    let mut decoder = SseDecoder::new();
    let body = format!(
        "{}data: {{\"error\":{{\"message\":\"overloaded\"}}}}\n\n{}",
        data("Partial"),
        data("never decoded")
    );

    let decoded = decoder.push(body.as_bytes());
    assert_eq!(decoded.len(), 2);
    assert!(matches!(&decoded[0], Ok(SseEvent::Delta(text)) if text == "Partial"));
    assert!(matches!(
        &decoded[1],
        Err(RagError::GenerationProvider(m)) if m == "overloaded"
    ));
}

#[test]
fn unterminated_error_line_is_reported_on_finish() {
    let mut decoder = SseDecoder::new();
    let body = format!("{}data: {{broken", data("kept"));

    assert_eq!(
        events(decoder.push(body.as_bytes())),
        vec![SseEvent::Delta("kept".to_string())]
    );
    assert!(matches!(
        decoder.finish(),
        Some(Err(RagError::GenerationProvider(_)))
    ));
}

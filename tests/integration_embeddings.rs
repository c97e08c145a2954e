#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

mod common;

use common::{LetterEmbeddings, init_test_tracing, letter_vector};
use pdf_rag_chat::RagError;
use pdf_rag_chat::config::EmbeddingConfig;
use pdf_rag_chat::embeddings::{EmbeddingProvider, OpenAiEmbeddingClient};
use pdf_rag_chat::store::VectorStore;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, batch_size: usize) -> OpenAiEmbeddingClient {
    let mut config = EmbeddingConfig::default();
    config.base_url = format!("{}/v1", server.uri());
    config.batch_size = batch_size;

    OpenAiEmbeddingClient::new(&config, "sk-test")
        .expect("Failed to create embedding client")
        .with_retry_attempts(1)
}

fn texts(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

#[tokio::test]
async fn single_embedding_sends_credentials_and_model() {
    init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "text-embedding-3-small",
            "input": ["abc"]
        })))
        .respond_with(LetterEmbeddings)
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, 16);
    let vector = client.embed("abc").await.expect("embedding succeeds");
    assert_eq!(vector, letter_vector("abc"));
}

#[tokio::test]
async fn batches_are_split_and_reordered() {
    init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(LetterEmbeddings)
        .expect(3)
        .mount(&server)
        .await;

    let inputs = texts(&["aaaa", "bbbb", "cccc", "dddd", "eeee"]);
    let client = client_for(&server, 2);
    let vectors = client.embed_batch(&inputs).await.expect("batch succeeds");

    assert_eq!(vectors.len(), inputs.len());
    for (input, vector) in inputs.iter().zip(&vectors) {
        assert_eq!(vector, &letter_vector(input));
    }
}

#[tokio::test]
async fn missing_vectors_are_an_integrity_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"index": 0, "embedding": [0.1, 0.2]}]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, 16);
    let err = client
        .embed_batch(&texts(&["first", "second"]))
        .await
        .expect_err("count mismatch");

    assert!(matches!(err, RagError::EmbeddingProvider(ref m) if m.contains("Mismatch")));
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "Incorrect API key provided"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = EmbeddingConfig::default();
    config.base_url = format!("{}/v1", server.uri());
    let client = OpenAiEmbeddingClient::new(&config, "sk-wrong")
        .expect("client builds")
        .with_retry_attempts(3);

    let err = client.embed("hello").await.expect_err("unauthorized");
    assert!(matches!(err, RagError::EmbeddingProvider(ref m) if m.contains("401")));
}

#[tokio::test]
async fn server_errors_are_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let mut config = EmbeddingConfig::default();
    config.base_url = format!("{}/v1", server.uri());
    let client = OpenAiEmbeddingClient::new(&config, "sk-test")
        .expect("client builds")
        .with_retry_attempts(2);

    let result = client.embed("hello").await;
    assert!(matches!(result, Err(RagError::EmbeddingProvider(_))));
}

#[tokio::test]
async fn store_built_through_the_client_finds_each_chunk() {
    init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(LetterEmbeddings)
        .mount(&server)
        .await;

    let client = client_for(&server, 2);
    let chunks = texts(&["AAAA BBBB ", "B CCCC DDD", "DDD"]);
    let store = VectorStore::build_from_texts(&client, &chunks)
        .await
        .expect("store builds");

    for chunk in &chunks {
        let hits = store
            .search_by_text(&client, chunk, 3)
            .await
            .expect("search succeeds");
        assert_eq!(&hits[0].text, chunk);
        assert!((hits[0].score - 1.0).abs() < 1e-5);
    }
}

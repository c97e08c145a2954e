use super::load_existing_config as load_existing_config_impl;
use super::test_embedding_endpoint;
use crate::config::EmbeddingConfig;

#[test]
fn load_existing_config() {
    let config = load_existing_config_impl().expect("config loaded successfully");
    assert!(!config.embedding.model.is_empty());
    assert!(config.embedding.batch_size > 0);
    assert!(config.chunking.chunk_overlap < config.chunking.chunk_size);
}

#[test]
fn unreachable_endpoint_reports_false() {
    let embedding = EmbeddingConfig {
        base_url: "http://127.0.0.1:9/v1".to_string(),
        ..EmbeddingConfig::default()
    };
    assert!(!test_embedding_endpoint(&embedding));
}

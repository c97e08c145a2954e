use super::*;

fn hit(text: &str, score: f32) -> SearchHit {
    SearchHit {
        text: text.to_string(),
        score,
    }
}

#[test]
fn context_keeps_rank_order() {
    let hits = vec![hit("best", 0.9), hit("second", 0.5), hit("third", 0.1)];
    assert_eq!(assemble_context(&hits), "best\n\nsecond\n\nthird");
    assert_eq!(assemble_context(&[]), "");
}

#[test]
fn augmented_question_layout() {
    let prompt = augment_question("Paris is the capital of France.", "What is the capital?");

    assert!(prompt.starts_with("Based on the following context from the uploaded PDF"));
    assert!(prompt.contains(
        "If the context doesn't contain enough information to answer the question, please say so.\n\nContext:\nParis is the capital of France.\n\nQuestion: What is the capital?"
    ));
    assert!(prompt.ends_with("Question: What is the capital?"));
}

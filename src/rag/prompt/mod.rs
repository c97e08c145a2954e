#[cfg(test)]
mod tests;

use itertools::Itertools;

use crate::store::SearchHit;

pub const CONTEXT_SEPARATOR: &str = "\n\n";

const AUGMENTATION_PREAMBLE: &str = "Based on the following context from the uploaded PDF, please answer the question. Only use information from the provided context. If the context doesn't contain enough information to answer the question, please say so.";

/// Join retrieved passages in rank order
#[inline]
pub fn assemble_context(hits: &[SearchHit]) -> String {
    hits.iter().map(|hit| hit.text.as_str()).join(CONTEXT_SEPARATOR)
}

/// Wrap `question` with the retrieved `context`
#[inline]
pub fn augment_question(context: &str, question: &str) -> String {
    format!(
        "{}\n\nContext:\n{}\n\nQuestion: {}",
        AUGMENTATION_PREAMBLE, context, question
    )
}

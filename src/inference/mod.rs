//! Inference collaborators built on the [`LlmClient`](crate::ports::LlmClient)
//! port: semantic grouping and process-flow description, plus the heuristic
//! classifier used when no model is configured.

pub mod classify;
pub mod flow;
pub mod grouping;

/// Extracts the JSON object embedded in a model answer.
///
/// Tolerates Markdown code fences and prose before or after the object.
pub(crate) fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

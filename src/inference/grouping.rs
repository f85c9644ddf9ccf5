//! Semantic grouping of files into conceptual modules.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{classify, extract_json};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::ports::{CompletionRequest, LlmClient};

/// Where a grouping came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupSource {
    /// The inference collaborator answered.
    Inferred,
    /// The directory/filename heuristic was used.
    Heuristic,
}

/// A file → group assignment and its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct Grouping {
    /// File path → group name, covering every requested file.
    pub groups: BTreeMap<String, String>,
    /// Which tier produced the grouping.
    pub source: GroupSource,
}

/// Groups `files` into conceptual modules.
///
/// Asks the model when one is configured; any failure or unusable answer
/// falls back to [`classify::classify_all`]. Files the model left out are
/// classified heuristically.
pub async fn infer_groups(
    llm: Option<&dyn LlmClient>,
    config: &EngineConfig,
    files: &[String],
) -> Grouping {
    if let Some(llm) = llm.filter(|_| !files.is_empty()) {
        match ask_model(llm, config, files).await {
            Ok(mut groups) => {
                for file in files {
                    groups.entry(file.clone()).or_insert_with(|| classify::classify(file).to_string());
                }
                groups.retain(|path, _| files.contains(path));
                debug!(groups = groups.len(), "semantic grouping inferred");
                return Grouping { groups, source: GroupSource::Inferred };
            }
            Err(e) => warn!(error = %e, "group inference failed, using path heuristic"),
        }
    }
    Grouping { groups: classify::classify_all(files), source: GroupSource::Heuristic }
}

/// Builds the grouping prompt.
fn build_prompt(files: &[String]) -> String {
    let mut prompt = String::from(
        "Group the following source files into 3 to 8 conceptual modules of the \
         system's architecture (for example \"Authentication\", \"Billing\", \
         \"Presentation\"). Every file belongs to exactly one module.\n\nFiles:\n",
    );
    for file in files {
        prompt.push_str(&format!("- {file}\n"));
    }
    prompt.push_str(
        "\nRespond with JSON only: {\"groups\": {\"<file path>\": \"<module name>\", ...}}",
    );
    prompt
}

async fn ask_model(
    llm: &dyn LlmClient,
    config: &EngineConfig,
    files: &[String],
) -> Result<BTreeMap<String, String>> {
    let request = CompletionRequest {
        model: config.model.clone(),
        prompt: build_prompt(files),
        max_tokens: config.max_tokens,
    };
    let response = llm.complete(&request).await.map_err(|e| EngineError::Collaborator {
        collaborator: "grouping",
        message: e.to_string(),
    })?;
    parse_groups(&response.text)
}

/// Parses a grouping answer, accepting either `{"groups": {...}}` or a bare map.
fn parse_groups(text: &str) -> Result<BTreeMap<String, String>> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Answer {
        Wrapped { groups: BTreeMap<String, String> },
        Bare(BTreeMap<String, String>),
    }

    let json = extract_json(text).ok_or_else(|| EngineError::Collaborator {
        collaborator: "grouping",
        message: "answer contains no JSON object".into(),
    })?;
    let answer: Answer = serde_json::from_str(json).map_err(|e| EngineError::Collaborator {
        collaborator: "grouping",
        message: format!("failed to parse grouping answer: {e}"),
    })?;
    let groups = match answer {
        Answer::Wrapped { groups } | Answer::Bare(groups) => groups,
    };
    let groups: BTreeMap<String, String> =
        groups.into_iter().filter(|(_, g)| !g.trim().is_empty()).collect();
    if groups.is_empty() {
        return Err(EngineError::TrivialResult { collaborator: "grouping", nodes: 0 });
    }
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{CompletionFuture, CompletionResponse, PortError};

    #[test]
    fn prompt_lists_every_file_on_its_own_line() {
        let prompt = build_prompt(&["src/a.rs".to_string(), "src/b.rs".to_string()]);
        assert!(prompt.contains("Files:\n- src/a.rs\n- src/b.rs\n"));
        assert!(prompt.ends_with("...}}"));
    }

    struct CannedLlm(std::result::Result<String, String>);

    impl LlmClient for CannedLlm {
        fn complete(&self, _request: &CompletionRequest) -> CompletionFuture<'_> {
            let answer = self.0.clone();
            Box::pin(async move {
                answer
                    .map(|text| CompletionResponse { text, prompt_tokens: 1, completion_tokens: 1 })
                    .map_err(|e| -> PortError { e.into() })
            })
        }
    }

    fn files() -> Vec<String> {
        vec!["src/ui/app.tsx".into(), "src/billing/invoice.ts".into(), "tests/app.test.ts".into()]
    }

    #[tokio::test]
    async fn without_a_model_the_heuristic_is_used() {
        let grouping = infer_groups(None, &EngineConfig::default(), &files()).await;
        assert_eq!(grouping.source, GroupSource::Heuristic);
        assert_eq!(grouping.groups["src/ui/app.tsx"], classify::PRESENTATION);
        assert_eq!(grouping.groups["tests/app.test.ts"], classify::TESTS);
    }

    #[tokio::test]
    async fn model_answer_is_used_and_gaps_are_classified() {
        let llm = CannedLlm(Ok("```json\n{\"groups\": {\"src/ui/app.tsx\": \"Shell\", \
             \"src/billing/invoice.ts\": \"Billing\", \"elsewhere.rs\": \"Ghost\"}}\n```"
            .into()));
        let grouping = infer_groups(Some(&llm), &EngineConfig::default(), &files()).await;

        assert_eq!(grouping.source, GroupSource::Inferred);
        assert_eq!(grouping.groups.len(), 3);
        assert_eq!(grouping.groups["src/billing/invoice.ts"], "Billing");
        assert_eq!(grouping.groups["tests/app.test.ts"], classify::TESTS);
    }

    #[tokio::test]
    async fn failing_model_falls_back_to_the_heuristic() {
        let llm = CannedLlm(Err("rate limited".into()));
        let grouping = infer_groups(Some(&llm), &EngineConfig::default(), &files()).await;
        assert_eq!(grouping.source, GroupSource::Heuristic);
    }

    #[test]
    fn bare_maps_are_accepted() {
        let groups = parse_groups("{\"a.rs\": \"Core\"}").unwrap();
        assert_eq!(groups["a.rs"], "Core");
    }

    #[test]
    fn empty_answers_are_trivial() {
        let err = parse_groups("{\"groups\": {}}").unwrap_err();
        assert!(matches!(err, EngineError::TrivialResult { .. }));
    }
}

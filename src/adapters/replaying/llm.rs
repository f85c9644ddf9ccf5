//! Replaying adapter for the `LlmClient` port.

use super::{next_output, replay_result, SharedReplayer};
use crate::ports::{CompletionFuture, CompletionRequest, LlmClient};

/// Serves recorded LLM completions from a cassette.
pub struct ReplayingLlmClient {
    replayer: Option<SharedReplayer>,
}

impl ReplayingLlmClient {
    /// Create a replaying LLM client backed by the given replayer.
    #[must_use]
    pub fn new(replayer: SharedReplayer) -> Self {
        Self { replayer: Some(replayer) }
    }

    /// Create a replaying LLM client with no cassette. Panics when called.
    #[must_use]
    pub fn unconfigured() -> Self {
        Self { replayer: None }
    }
}

impl LlmClient for ReplayingLlmClient {
    fn complete(&self, _request: &CompletionRequest) -> CompletionFuture<'_> {
        let output = next_output(self.replayer.as_ref(), "llm", "complete");
        Box::pin(async move { replay_result(output) })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::adapters::replaying::tests::shared;

    fn request() -> CompletionRequest {
        CompletionRequest { model: "m".into(), prompt: "p".into(), max_tokens: 1 }
    }

    #[tokio::test]
    async fn replays_completions_in_order() {
        let llm = ReplayingLlmClient::new(shared(vec![
            ("llm", "complete", json!({}), json!({"ok": {"text": "one", "prompt_tokens": 1, "completion_tokens": 1}})),
            ("llm", "complete", json!({}), json!({"err": "rate limited"})),
        ]));

        assert_eq!(llm.complete(&request()).await.unwrap().text, "one");
        assert_eq!(llm.complete(&request()).await.unwrap_err().to_string(), "rate limited");
    }
}

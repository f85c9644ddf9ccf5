//! Recording adapter for the `LlmClient` port.

use std::sync::Arc;

use super::record_result;
use crate::cassette::session::SharedRecorder;
use crate::ports::{CompletionFuture, CompletionRequest, LlmClient};

/// Records LLM interactions while delegating to an inner implementation.
pub struct RecordingLlmClient {
    inner: Box<dyn LlmClient>,
    recorder: SharedRecorder,
}

impl RecordingLlmClient {
    /// Creates a new recording LLM client wrapping the given implementation.
    pub fn new(inner: Box<dyn LlmClient>, recorder: SharedRecorder) -> Self {
        Self { inner, recorder }
    }
}

impl LlmClient for RecordingLlmClient {
    fn complete(&self, request: &CompletionRequest) -> CompletionFuture<'_> {
        let request = request.clone();
        let recorder = Arc::clone(&self.recorder);

        Box::pin(async move {
            let result = self.inner.complete(&request).await;
            record_result(&recorder, "llm", "complete", &request, &result);
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::adapters::recording::tests::{finish, recorder_in};
    use crate::ports::CompletionResponse;

    struct Echo;

    impl LlmClient for Echo {
        fn complete(&self, request: &CompletionRequest) -> CompletionFuture<'_> {
            let text = request.prompt.to_uppercase();
            Box::pin(async move { Ok(CompletionResponse { text, prompt_tokens: 1, completion_tokens: 1 }) })
        }
    }

    #[tokio::test]
    async fn records_request_and_response() {
        let dir = std::env::temp_dir().join("archscope_rec_llm_test");
        let recorder = recorder_in(&dir, "llm");
        let request = CompletionRequest { model: "m".into(), prompt: "hi".into(), max_tokens: 8 };

        {
            let llm = RecordingLlmClient::new(Box::new(Echo), recorder.clone());
            assert_eq!(llm.complete(&request).await.unwrap().text, "HI");
        }

        let cassette = finish(recorder);
        let interaction = &cassette.interactions[0];
        assert_eq!(interaction.input["prompt"], json!("hi"));
        assert_eq!(interaction.output["ok"]["text"], json!("HI"));

        let _ = std::fs::remove_dir_all(&dir);
    }
}

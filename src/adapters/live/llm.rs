//! Inference collaborator backed by the Anthropic messages API.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ports::{CompletionFuture, CompletionRequest, CompletionResponse, LlmClient, PortError};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);
const SYSTEM_PROMPT: &str = "You analyze the architecture of software projects. \
                             Answer with a single JSON object and nothing else.";

/// Sends grouping and process-flow prompts to Claude.
pub struct LiveLlmClient {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl LiveLlmClient {
    /// Creates a client authenticating with `api_key`.
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build().unwrap_or_else(|e| {
            debug!(error = %e, "falling back to a default HTTP client");
            Client::new()
        });
        Self { client, api_key: api_key.into(), endpoint: ANTHROPIC_API_URL.to_string() }
    }

    /// Sends requests to `endpoint` instead of the public API.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    usage: Usage,
}

/// Only text blocks carry a `text`; other block types are skipped.
#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Turns an HTTP status and body into a completion.
fn decode(status: StatusCode, body: &str) -> Result<CompletionResponse, PortError> {
    if !status.is_success() {
        let message = serde_json::from_str::<ApiError>(body).map_or_else(|_| body.to_string(), |e| e.error.message);
        return Err(format!("Anthropic API error ({}): {message}", status.as_u16()).into());
    }

    let parsed: MessagesResponse = serde_json::from_str(body)
        .map_err(|e| -> PortError { format!("Failed to parse Anthropic API response: {e}").into() })?;
    let text: String = parsed.content.into_iter().filter_map(|block| block.text).collect();
    if text.trim().is_empty() {
        return Err("Anthropic API returned no text".into());
    }

    Ok(CompletionResponse {
        text,
        prompt_tokens: parsed.usage.input_tokens,
        completion_tokens: parsed.usage.output_tokens,
    })
}

impl LlmClient for LiveLlmClient {
    fn complete(&self, request: &CompletionRequest) -> CompletionFuture<'_> {
        let request = request.clone();

        Box::pin(async move {
            let body = MessagesRequest {
                model: &request.model,
                max_tokens: request.max_tokens,
                system: SYSTEM_PROMPT,
                messages: [Message { role: "user", content: &request.prompt }],
            };

            let response = self
                .client
                .post(&self.endpoint)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&body)
                .send()
                .await
                .map_err(|e| -> PortError { format!("Anthropic API request failed: {e}").into() })?;

            let status = response.status();
            let text = response
                .text()
                .await
                .map_err(|e| -> PortError { format!("Failed to read Anthropic API response: {e}").into() })?;
            let completion = decode(status, &text)?;
            debug!(
                model = %request.model,
                prompt_tokens = completion.prompt_tokens,
                completion_tokens = completion.completion_tokens,
                "completion received"
            );
            Ok(completion)
        })
    }
}

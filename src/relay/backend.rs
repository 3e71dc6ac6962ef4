use futures_util::stream::{self, BoxStream, StreamExt, TryStreamExt};
use log::debug;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use super::{sse, RelayError};
use crate::config::LlmConfig;

pub type DeltaStream = BoxStream<'static, Result<String, RelayError>>;

/// Source of streamed completion text for one prompt.
///
/// Implementations must yield deltas in the order the upstream produced them
/// and end the stream after the upstream end-of-stream signal, or with a
/// single `Err`.
pub trait CompletionBackend: Send + Sync {
    fn stream_completion(&self, prompt: String) -> DeltaStream;

    /// Short human-readable description for logs and the status line.
    fn describe(&self) -> String;
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
}

/// Streams chat completions from any OpenAI-compatible `/chat/completions`
/// endpoint (Groq by default).
pub struct OpenAiCompatibleBackend {
    config: LlmConfig,
    client: Client,
}

impl OpenAiCompatibleBackend {
    pub fn new(config: LlmConfig) -> Result<Self, RelayError> {
        let mut builder = Client::builder();
        if let Some(secs) = config.max_duration_secs.filter(|s| *s > 0) {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| RelayError::Client(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url())
    }
}

impl CompletionBackend for OpenAiCompatibleBackend {
    fn stream_completion(&self, prompt: String) -> DeltaStream {
        let client = self.client.clone();
        let config = self.config.clone();
        let url = self.completions_url();

        let opened = async move {
            // Read on every call so a key exported after launch is picked up.
            let api_key = config
                .resolve_api_key()
                .ok_or_else(|| RelayError::MissingApiKey(config.api_key_env.clone()))?;

            let request_body = ChatCompletionRequest {
                model: config.model.clone(),
                messages: vec![ChatMessage {
                    role: "user".to_string(),
                    content: prompt,
                }],
                stream: true,
            };

            debug!("Sending streaming chat completion request to: {}", url);

            let response = client
                .post(&url)
                .bearer_auth(api_key)
                .json(&request_body)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Failed to read error response".to_string());
                return Err(RelayError::from_status(status.as_u16(), error_text));
            }

            Ok::<_, RelayError>(sse::delta_stream(response.bytes_stream()))
        };

        stream::once(opened).try_flatten().boxed()
    }

    fn describe(&self) -> String {
        format!("{} via {}", self.config.model, self.config.base_url())
    }
}

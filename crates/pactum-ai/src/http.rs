//! HTTP chat-completions client for the generation service.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::generate::{GenerateError, TextGenerator};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
///
/// Rate-limit responses (429) and request timeouts are retried with linear
/// backoff up to `max_retries`; everything else surfaces immediately as a
/// typed [`GenerateError`].
pub struct ChatGenerator {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    timeout: Duration,
    max_retries: u32,
}

impl ChatGenerator {
    /// Create a client for the given base URL (no trailing slash needed)
    /// and model name.
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    async fn send_once(
        &self,
        request: &ChatRequest,
    ) -> Result<reqwest::Response, reqwest::Error> {
        let mut builder = self
            .client
            .post(self.endpoint())
            .timeout(self.timeout)
            .json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        builder.send().await
    }
}

#[async_trait]
impl TextGenerator for ChatGenerator {
    async fn generate(
        &self,
        prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, GenerateError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".into(),
                content: prompt.to_string(),
            }],
            temperature,
            max_tokens,
        };

        let mut attempt = 0u32;
        loop {
            match self.send_once(&request).await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        let parsed: ChatResponse = resp.json().await?;
                        return parsed
                            .choices
                            .into_iter()
                            .next()
                            .map(|c| c.message.content)
                            .ok_or_else(|| {
                                GenerateError::Failed("response contained no choices".into())
                            });
                    }
                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        let retry_after_secs = retry_after(&resp);
                        if attempt >= self.max_retries {
                            return Err(GenerateError::RateLimited { retry_after_secs });
                        }
                        let backoff = Duration::from_millis(500 * (attempt as u64 + 1));
                        warn!(attempt, ?backoff, "generation service rate limited, retrying");
                        tokio::time::sleep(backoff).await;
                        attempt += 1;
                        continue;
                    }
                    let body = resp.text().await.unwrap_or_default();
                    return Err(GenerateError::Server {
                        status: status.as_u16(),
                        body,
                    });
                }
                Err(err) if err.is_timeout() => {
                    if attempt >= self.max_retries {
                        return Err(GenerateError::Timeout);
                    }
                    let backoff = Duration::from_millis(500 * (attempt as u64 + 1));
                    warn!(attempt, ?backoff, "generation request timed out, retrying");
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(err) => return Err(GenerateError::Http(err)),
            }
        }
    }
}

fn retry_after(resp: &reqwest::Response) -> Option<u64> {
    resp.headers()
        .get("retry-after")?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_trailing_slash() {
        let client = ChatGenerator::new("http://localhost:8080/", "test-model");
        assert_eq!(client.base_url, "http://localhost:8080");
        assert_eq!(client.endpoint(), "http://localhost:8080/chat/completions");
    }

    #[test]
    fn chat_request_serialises() {
        let request = ChatRequest {
            model: "test-model".into(),
            messages: vec![ChatMessage {
                role: "user".into(),
                content: "Analyze this clause".into(),
            }],
            temperature: 0.3,
            max_tokens: 1000,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "test-model");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["max_tokens"], 1000);
    }

    #[test]
    fn chat_response_deserialises() {
        let json = r#"{
            "choices": [
                {"message": {"role": "assistant", "content": "{\"risk_score\": 7}"}}
            ]
        }"#;
        let parsed: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.choices[0].message.content, "{\"risk_score\": 7}");
    }

    #[test]
    fn empty_choices_deserialises() {
        let parsed: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(parsed.choices.is_empty());
    }
}

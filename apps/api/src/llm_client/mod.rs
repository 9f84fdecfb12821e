/// LLM client: the single point of entry for all AI gateway calls.
///
/// No other module may call the gateway directly. Handlers build prompts in
/// their own `prompts.rs` and go through `call_json_object` / `call_json_array`.
///
/// The gateway speaks the OpenAI-compatible chat-completions protocol.
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod lenient;
pub mod prompts;

/// Model used for text-only calls (shortlisting, matching, profile analysis).
pub const TEXT_MODEL: &str = "google/gemini-2.5-flash";
/// Model used for calls that include an image or video frame.
pub const VISION_MODEL: &str = "google/gemini-2.5-pro";
const TEMPERATURE: f32 = 0.7;
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("No JSON {0} found in LLM response")]
    NoJson(&'static str),
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: MessageContent<'a>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart<'a>>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl<'a> },
}

#[derive(Debug, Serialize)]
struct ImageUrl<'a> {
    url: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
}

impl ChatResponse {
    /// Extracts the text content of the first choice.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .filter(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct GatewayError {
    error: GatewayErrorBody,
}

#[derive(Debug, Deserialize)]
struct GatewayErrorBody {
    message: String,
}

/// A single model call: system prompt, user prompt, and optional image.
#[derive(Debug, Clone, Copy)]
pub struct LlmCall<'a> {
    pub system: Option<&'a str>,
    pub prompt: &'a str,
    pub image_url: Option<&'a str>,
    pub max_tokens: Option<u32>,
}

impl<'a> LlmCall<'a> {
    pub fn text(system: &'a str, prompt: &'a str) -> Self {
        Self {
            system: Some(system),
            prompt,
            image_url: None,
            max_tokens: None,
        }
    }

    /// A vision call: the prompt and image travel in one user message, no system prompt.
    pub fn vision(prompt: &'a str, image_url: &'a str, max_tokens: u32) -> Self {
        Self {
            system: None,
            prompt,
            image_url: Some(image_url),
            max_tokens: Some(max_tokens),
        }
    }

    fn model(&self) -> &'static str {
        if self.image_url.is_some() {
            VISION_MODEL
        } else {
            TEXT_MODEL
        }
    }
}

/// The single AI gateway client used by all services.
/// Wraps chat completions with retry logic and structured output helpers.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    endpoint: String,
    base_backoff_ms: u64,
}

impl LlmClient {
    pub fn new(api_key: String, endpoint: String) -> anyhow::Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()?,
            api_key,
            endpoint,
            base_backoff_ms: 1000,
        })
    }

    #[cfg(test)]
    fn with_backoff_ms(mut self, ms: u64) -> Self {
        self.base_backoff_ms = ms;
        self
    }

    /// Makes a raw call to the gateway, returning the full response object.
    /// Retries on 429 (rate limit), 5xx and transport errors with exponential backoff.
    pub async fn call(&self, call: LlmCall<'_>) -> Result<ChatResponse, LlmError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = call.system {
            messages.push(ChatMessage {
                role: "system",
                content: MessageContent::Text(system),
            });
        }
        let user_content = match call.image_url {
            Some(url) => MessageContent::Parts(vec![
                ContentPart::Text { text: call.prompt },
                ContentPart::ImageUrl {
                    image_url: ImageUrl { url },
                },
            ]),
            None => MessageContent::Text(call.prompt),
        };
        messages.push(ChatMessage {
            role: "user",
            content: user_content,
        });

        let request_body = ChatRequest {
            model: call.model(),
            messages,
            temperature: TEMPERATURE,
            max_tokens: call.max_tokens,
        };

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay =
                    std::time::Duration::from_millis(self.base_backoff_ms * (1 << (attempt - 1)));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("AI gateway returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<GatewayError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let chat_response: ChatResponse = response.json().await?;

            if let Some(usage) = &chat_response.usage {
                debug!(
                    "LLM call succeeded: model={}, prompt_tokens={}, completion_tokens={}",
                    request_body.model, usage.prompt_tokens, usage.completion_tokens
                );
            }

            return Ok(chat_response);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }

    /// Calls the model and deserializes the outermost `{ ... }` of the reply.
    pub async fn call_json_object<T: DeserializeOwned>(
        &self,
        call: LlmCall<'_>,
    ) -> Result<T, LlmError> {
        let response = self.call(call).await?;
        let text = response.text().ok_or(LlmError::EmptyContent)?;
        let json = extract_json_span(text, '{', '}').ok_or(LlmError::NoJson("object"))?;
        serde_json::from_str(json).map_err(LlmError::Parse)
    }

    /// Calls the model and deserializes the outermost `[ ... ]` of the reply.
    pub async fn call_json_array<T: DeserializeOwned>(
        &self,
        call: LlmCall<'_>,
    ) -> Result<Vec<T>, LlmError> {
        let response = self.call(call).await?;
        let text = response.text().ok_or(LlmError::EmptyContent)?;
        let json = extract_json_span(text, '[', ']').ok_or(LlmError::NoJson("array"))?;
        serde_json::from_str(json).map_err(LlmError::Parse)
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

/// Returns the slice from the first `open` to the last `close`, after fence stripping.
/// Models often wrap the payload in prose; the outermost span is the payload.
fn extract_json_span(text: &str, open: char, close: char) -> Option<&str> {
    let text = strip_json_fences(text);
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_extract_object_from_prose() {
        let input = "Here is the evaluation:\n{\"matchScore\": 72}\nLet me know!";
        assert_eq!(
            extract_json_span(input, '{', '}'),
            Some("{\"matchScore\": 72}")
        );
    }

    #[test]
    fn test_extract_array_keeps_nested_objects() {
        let input = "```json\n[{\"a\": 1}, {\"b\": [2, 3]}]\n```";
        let span = extract_json_span(input, '[', ']').unwrap();
        let parsed: Value = serde_json::from_str(span).unwrap();
        assert_eq!(parsed, json!([{"a": 1}, {"b": [2, 3]}]));
    }

    #[test]
    fn test_extract_returns_none_without_payload() {
        assert_eq!(extract_json_span("I cannot help with that.", '[', ']'), None);
        assert_eq!(extract_json_span("} backwards {", '{', '}'), None);
    }

    #[test]
    fn test_vision_call_serializes_image_part() {
        let call = LlmCall::vision("Describe", "https://cdn/x.mp4", 2000);
        let body = ChatRequest {
            model: call.model(),
            messages: vec![ChatMessage {
                role: "user",
                content: MessageContent::Parts(vec![
                    ContentPart::Text { text: call.prompt },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: call.image_url.unwrap(),
                        },
                    },
                ]),
            }],
            temperature: TEMPERATURE,
            max_tokens: call.max_tokens,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["model"], VISION_MODEL);
        assert_eq!(value["messages"][0]["content"][0]["type"], "text");
        assert_eq!(value["messages"][0]["content"][1]["type"], "image_url");
        assert_eq!(
            value["messages"][0]["content"][1]["image_url"]["url"],
            "https://cdn/x.mp4"
        );
        assert_eq!(value["max_tokens"], 2000);
    }

    #[test]
    fn test_text_call_omits_max_tokens() {
        let body = ChatRequest {
            model: TEXT_MODEL,
            messages: vec![ChatMessage {
                role: "system",
                content: MessageContent::Text("sys"),
            }],
            temperature: TEMPERATURE,
            max_tokens: None,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("max_tokens").is_none());
        assert_eq!(value["messages"][0]["content"], "sys");
    }

    fn completion_body(content: &str) -> String {
        json!({
            "choices": [{ "message": { "role": "assistant", "content": content } }],
            "usage": { "prompt_tokens": 10, "completion_tokens": 5 }
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_call_json_object_against_gateway() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(completion_body("```json\n{\"matchScore\": 81}\n```"))
            .create_async()
            .await;

        let client = LlmClient::new(
            "test-key".into(),
            format!("{}/v1/chat/completions", server.url()),
        )
        .unwrap();
        let value: Value = client
            .call_json_object(LlmCall::text("sys", "prompt"))
            .await
            .unwrap();

        assert_eq!(value["matchScore"], 81);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(402)
            .with_body(r#"{"error": {"message": "Payment required"}}"#)
            .expect(1)
            .create_async()
            .await;

        let client = LlmClient::new(
            "k".into(),
            format!("{}/v1/chat/completions", server.url()),
        )
        .unwrap();
        let err = client.call(LlmCall::text("s", "p")).await.unwrap_err();

        match err {
            LlmError::Api { status, message } => {
                assert_eq!(status, 402);
                assert_eq!(message, "Payment required");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_error_retried_until_exhausted() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(503)
            .with_body("overloaded")
            .expect(3)
            .create_async()
            .await;

        let client = LlmClient::new(
            "k".into(),
            format!("{}/v1/chat/completions", server.url()),
        )
        .unwrap()
        .with_backoff_ms(1);
        let err = client.call(LlmCall::text("s", "p")).await.unwrap_err();

        assert!(matches!(err, LlmError::Api { status: 503, .. }));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_array_call_without_array_is_no_json() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(completion_body("Sorry, no applicants matched."))
            .create_async()
            .await;

        let client = LlmClient::new(
            "k".into(),
            format!("{}/v1/chat/completions", server.url()),
        )
        .unwrap();
        let err = client
            .call_json_array::<Value>(LlmCall::text("s", "p"))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::NoJson("array")));
    }
}

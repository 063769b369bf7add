use std::pin::Pin;

use futures::{Stream, StreamExt};
use serde_json::{json, Value};
use thiserror::Error;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("GEMINI_API_KEY environment variable not found. Please set it to use Gemini.")]
    MissingApiKey,
    #[error("request to Gemini failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Gemini API error (status {status}): {message}")]
    Api { status: u16, message: String },
    #[error("failed to parse Gemini response: {0}")]
    Parse(String),
}

pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, GenerationError>> + Send>>;

/// Thin client over the Gemini REST API: one streaming call for code
/// generation, one plain call for the explanation.
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn from_env() -> Result<Self, GenerationError> {
        let api_key = std::env::var("GEMINI_API_KEY").map_err(|_| GenerationError::MissingApiKey)?;
        Ok(Self::new(api_key, GEMINI_BASE_URL.to_string()))
    }

    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url,
        }
    }

    /// Open a streaming `streamGenerateContent` exchange. Fragments are
    /// yielded in the order the service emits them; no reordering, no
    /// deduplication.
    pub async fn stream_generate(
        &self,
        model: &str,
        system_instruction: &str,
        user_message: &str,
        temperature: f32,
        max_output_tokens: u32,
    ) -> Result<FragmentStream, GenerationError> {
        let url = format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.base_url, model
        );
        let payload = json!({
            "system_instruction": { "parts": [{ "text": system_instruction }] },
            "contents": [{ "role": "user", "parts": [{ "text": user_message }] }],
            "generationConfig": {
                "temperature": temperature,
                "maxOutputTokens": max_output_tokens,
            },
        });

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GenerationError::Api {
                status: status.as_u16(),
                message,
            });
        }

        // SSE events can be split across network chunks, so carry an
        // incomplete trailing line over to the next chunk.
        let stream = response
            .bytes_stream()
            .scan(String::new(), |buffer, result| {
                let item = match result {
                    Ok(bytes) => {
                        buffer.push_str(&String::from_utf8_lossy(&bytes));
                        let mut text = String::new();
                        while let Some(pos) = buffer.find('\n') {
                            let line: String = buffer.drain(..=pos).collect();
                            if let Some(data) = line.trim().strip_prefix("data: ") {
                                if let Some(fragment) = extract_fragment_text(data) {
                                    text.push_str(&fragment);
                                }
                            }
                        }
                        if text.is_empty() {
                            None
                        } else {
                            Some(Ok(text))
                        }
                    }
                    Err(e) => Some(Err(GenerationError::Transport(e))),
                };
                futures::future::ready(Some(item))
            })
            .filter_map(futures::future::ready);

        Ok(Box::pin(stream))
    }

    /// One non-streaming `generateContent` call. Used for the explanation
    /// request after a successful generation.
    pub async fn generate(&self, model: &str, user_message: &str) -> Result<String, GenerationError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        let payload = json!({
            "contents": [{ "role": "user", "parts": [{ "text": user_message }] }],
        });

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GenerationError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| GenerationError::Parse(e.to_string()))?;

        extract_text(&body)
            .ok_or_else(|| GenerationError::Parse("response contained no text parts".to_string()))
    }
}

/// Pull the concatenated text parts out of one response payload.
/// Returns None when the payload is not JSON or carries no text,
/// which streaming treats as a keep-alive and skips.
fn extract_fragment_text(data: &str) -> Option<String> {
    let json: Value = serde_json::from_str(data).ok()?;
    extract_text(&json)
}

fn extract_text(json: &Value) -> Option<String> {
    let parts = json
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;

    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_fragment_text() {
        let data = r#"{"candidates":[{"content":{"parts":[{"text":"def "},{"text":"foo():"}]}}]}"#;
        assert_eq!(extract_fragment_text(data), Some("def foo():".to_string()));
    }

    #[test]
    fn test_extract_skips_non_json_keepalives() {
        assert_eq!(extract_fragment_text(""), None);
        assert_eq!(extract_fragment_text("[DONE]"), None);
        assert_eq!(extract_fragment_text("{\"usageMetadata\":{}}"), None);
    }

    #[test]
    fn test_extract_skips_textless_candidates() {
        let data = r#"{"candidates":[{"content":{"parts":[{"functionCall":{}}]}}]}"#;
        assert_eq!(extract_fragment_text(data), None);
    }

    #[test]
    fn test_missing_api_key_error_message() {
        let err = GenerationError::MissingApiKey;
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }
}

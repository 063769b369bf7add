use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::{Stream, StreamExt};

use crate::llm::{GeminiClient, GenerationError};
use crate::prompts::PromptsConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenerationStatus {
    #[default]
    Idle,
    Streaming,
    Complete,
    Failed,
}

#[derive(Debug, Clone, Default)]
pub struct GenerationResult {
    pub code: String,
    pub explanation: String,
    pub status: GenerationStatus,
}

/// Per-session cancellation token. Starting a new generation cancels the
/// previous session's token, so fragments from an orphaned exchange can
/// never leak into a newer accumulator.
#[derive(Debug, Clone, Default)]
pub struct SessionToken(Arc<AtomicBool>);

impl SessionToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Drain a fragment stream into one accumulated string. Each fragment is
/// forwarded to `on_fragment` before the next one is awaited; the token
/// is checked before every append. A transport error ends consumption
/// immediately with no further callbacks.
pub async fn consume_fragments<S, F>(
    mut stream: S,
    token: &SessionToken,
    mut on_fragment: F,
) -> Result<String, GenerationError>
where
    S: Stream<Item = Result<String, GenerationError>> + Unpin,
    F: FnMut(&str),
{
    let mut accumulated = String::new();
    while let Some(item) = stream.next().await {
        if token.is_cancelled() {
            break;
        }
        let fragment = item?;
        accumulated.push_str(&fragment);
        on_fragment(&fragment);
    }
    Ok(accumulated)
}

/// Settings for one generation run, taken from the app config.
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub code_model: String,
    pub explain_model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

/// One streaming exchange with the model plus the follow-up explanation
/// request. At most one result is in flight: `generate` cancels the
/// previous token and starts from an empty accumulator.
pub struct GenerationSession {
    client: GeminiClient,
    settings: GenerationSettings,
    token: SessionToken,
    result: GenerationResult,
}

impl GenerationSession {
    pub fn new(client: GeminiClient, settings: GenerationSettings) -> Self {
        Self {
            client,
            settings,
            token: SessionToken::new(),
            result: GenerationResult::default(),
        }
    }

    pub fn result(&self) -> &GenerationResult {
        &self.result
    }

    pub fn status(&self) -> GenerationStatus {
        self.result.status
    }

    /// Stream the generated script, forwarding each fragment to
    /// `on_fragment` as it arrives. On failure the partial accumulator is
    /// discarded; whatever the caller already rendered is its own
    /// business.
    pub async fn generate<F>(
        &mut self,
        system_instruction: &str,
        user_message: &str,
        on_fragment: F,
    ) -> Result<&str, GenerationError>
    where
        F: FnMut(&str),
    {
        self.token.cancel();
        self.token = SessionToken::new();
        self.result = GenerationResult {
            status: GenerationStatus::Streaming,
            ..Default::default()
        };

        let stream = match self
            .client
            .stream_generate(
                &self.settings.code_model,
                system_instruction,
                user_message,
                self.settings.temperature,
                self.settings.max_output_tokens,
            )
            .await
        {
            Ok(stream) => stream,
            Err(e) => {
                self.result.status = GenerationStatus::Failed;
                return Err(e);
            }
        };

        match consume_fragments(stream, &self.token.clone(), on_fragment).await {
            Ok(code) => {
                self.result.code = code;
                self.result.status = GenerationStatus::Complete;
                Ok(&self.result.code)
            }
            Err(e) => {
                self.result.status = GenerationStatus::Failed;
                Err(e)
            }
        }
    }

    /// Ask for a short explanation of the generated code. Best-effort:
    /// any failure is swallowed and replaced with the static fallback, so
    /// the code itself always stays available.
    pub async fn explain(&mut self, prompts: &PromptsConfig) -> &str {
        let prompt = prompts.explain_prompt(&self.result.code);
        self.result.explanation = match self
            .client
            .generate(&self.settings.explain_model, &prompt)
            .await
        {
            Ok(text) => text,
            Err(_) => prompts.explain_fallback().to_string(),
        };
        &self.result.explanation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn fragments(items: Vec<Result<&str, GenerationError>>) -> impl Stream<Item = Result<String, GenerationError>> + Unpin + use<'_> {
        stream::iter(items.into_iter().map(|r| r.map(String::from)))
    }

    #[tokio::test]
    async fn test_accumulation_equals_concatenation() {
        let stream = fragments(vec![Ok("def "), Ok("foo():\n"), Ok("    pass")]);
        let token = SessionToken::new();
        let mut seen = Vec::new();

        let code = consume_fragments(stream, &token, |f| seen.push(f.to_string()))
            .await
            .unwrap();

        assert_eq!(code, "def foo():\n    pass");
        assert_eq!(seen, vec!["def ", "foo():\n", "    pass"]);
    }

    #[tokio::test]
    async fn test_transport_failure_stops_callbacks() {
        let stream = fragments(vec![
            Ok("partial"),
            Err(GenerationError::Parse("connection reset".to_string())),
            Ok("never delivered"),
        ]);
        let token = SessionToken::new();
        let mut seen = Vec::new();

        let result = consume_fragments(stream, &token, |f| seen.push(f.to_string())).await;

        assert!(result.is_err());
        assert_eq!(seen, vec!["partial"]);
    }

    #[tokio::test]
    async fn test_cancelled_token_drops_fragments() {
        let stream = fragments(vec![Ok("a"), Ok("b")]);
        let token = SessionToken::new();
        token.cancel();
        let mut calls = 0;

        let code = consume_fragments(stream, &token, |_| calls += 1).await.unwrap();

        assert_eq!(code, "");
        assert_eq!(calls, 0);
    }

    #[tokio::test]
    async fn test_cancel_mid_stream() {
        let token = SessionToken::new();
        let cancel_after_first = token.clone();
        let mut count = 0;
        let stream = fragments(vec![Ok("one"), Ok("two"), Ok("three")]);

        let code = consume_fragments(stream, &token, |_| {
            count += 1;
            // Simulates a newer session invalidating this one.
            cancel_after_first.cancel();
        })
        .await
        .unwrap();

        assert_eq!(code, "one");
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_explain_failure_yields_fallback() {
        // Nothing listens on the discard port, so the explain call fails
        // at the transport level and the static fallback takes over.
        let client = GeminiClient::new("test-key".to_string(), "http://127.0.0.1:9".to_string());
        let settings = GenerationSettings {
            code_model: "code-model".to_string(),
            explain_model: "explain-model".to_string(),
            temperature: 0.2,
            max_output_tokens: 8192,
        };
        let mut session = GenerationSession::new(client, settings);
        let prompts = PromptsConfig::default();

        let explanation = session.explain(&prompts).await.to_string();

        assert_eq!(explanation, prompts.explain_fallback());
        assert_eq!(session.result().explanation, explanation);
    }

    #[test]
    fn test_status_starts_idle() {
        let result = GenerationResult::default();
        assert_eq!(result.status, GenerationStatus::Idle);
        assert!(result.code.is_empty());
    }
}

//! OpenAI Interpretation Provider
//!
//! Implementation of `InterpretationProvider` over the OpenAI streaming
//! chat-completions API. Responses arrive as server-sent events; each
//! `data:` line carries a JSON delta that is decoded into a `StreamChunk`.

use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;

use tarot_core::{
    error::{FortuneError, Result},
    provider::{InterpretationProvider, InterpretationStream, StreamChunk},
    reading::ReadingRequest,
};

/// OpenAI provider configuration
#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    /// API key (required)
    pub api_key: String,

    /// API base URL; any OpenAI-compatible endpoint works
    pub base_url: String,

    /// Model identifier
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Maximum tokens per interpretation
    pub max_tokens: u32,
}

impl OpenAiConfig {
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| FortuneError::Config("OPENAI_API_KEY not set".into()))?;

        Ok(Self {
            api_key,
            base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".into()),
            model: std::env::var("FORTUNE_MODEL").unwrap_or_else(|_| "gpt-4".into()),
            temperature: 0.8,
            max_tokens: 800,
        })
    }
}

/// OpenAI streaming provider
pub struct OpenAiProvider {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiProvider {
    pub fn from_config(config: OpenAiConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self::from_config(OpenAiConfig::from_env()?))
    }

    fn completion_body(&self, request: &ReadingRequest) -> serde_json::Value {
        serde_json::json!({
            "model": self.config.model,
            "messages": [{ "role": "user", "content": build_prompt(request) }],
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
            "stream": true,
        })
    }
}

#[async_trait]
impl InterpretationProvider for OpenAiProvider {
    async fn stream_reading(&self, request: &ReadingRequest) -> Result<InterpretationStream> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&self.completion_body(request))
            .send()
            .await
            .map_err(|e| FortuneError::ProviderUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, %body, "interpretation request rejected");
            return Err(FortuneError::Provider(format!("status {status}")));
        }

        let stream = response
            .bytes_stream()
            .scan(SseDecoder::new(), |decoder, chunk| {
                let frames = match chunk {
                    Ok(bytes) => decoder.feed(&bytes),
                    Err(e) => vec![Err(FortuneError::ProviderUnavailable(e.to_string()))],
                };
                futures::future::ready(Some(futures::stream::iter(frames)))
            })
            .flatten();

        Ok(Box::pin(stream))
    }

    async fn health_check(&self) -> Result<bool> {
        let response = self
            .client
            .get(format!("{}/models", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .send()
            .await
            .map_err(|e| FortuneError::ProviderUnavailable(e.to_string()))?;
        Ok(response.status().is_success())
    }
}

/// Render the reading into the single-prompt shape the generator expects
fn build_prompt(request: &ReadingRequest) -> String {
    let mut prompt = String::from(
        "You are a warm, honest tarot reader. Interpret the three-card \
         spread below for the asker's question. Speak plainly, avoid doom, \
         and never give medical, legal, or financial directives.\n\n",
    );
    prompt.push_str(&format!("Question:\n{}\n\nDrawn cards:\n", request.question));
    for card in &request.cards {
        prompt.push_str(&format!("- {}: {}\n", card.position.label(), card.describe()));
    }
    prompt
}

/// Accumulates SSE bytes and yields complete decoded frames.
///
/// Splits on newlines only, so multi-byte characters broken across network
/// chunks are never decoded mid-sequence.
struct SseDecoder {
    buf: Vec<u8>,
}

impl SseDecoder {
    fn new() -> Self {
        Self { buf: Vec::new() }
    }

    fn feed(&mut self, bytes: &[u8]) -> Vec<Result<StreamChunk>> {
        self.buf.extend_from_slice(bytes);

        let mut frames = Vec::new();
        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            if let Some(frame) = parse_sse_line(line.trim()) {
                frames.push(frame);
            }
        }
        frames
    }
}

#[derive(Deserialize)]
struct ChatChunk {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    delta: ChatDelta,
}

#[derive(Deserialize)]
struct ChatDelta {
    content: Option<String>,
}

/// Decode one SSE line; `None` for keep-alives and empty deltas
fn parse_sse_line(line: &str) -> Option<Result<StreamChunk>> {
    let data = line.strip_prefix("data:")?.trim();
    if data == "[DONE]" {
        return Some(Ok(StreamChunk {
            delta: String::new(),
            done: true,
        }));
    }

    match serde_json::from_str::<ChatChunk>(data) {
        Ok(chunk) => {
            let delta = chunk
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.delta.content)
                .unwrap_or_default();
            if delta.is_empty() {
                None
            } else {
                Some(Ok(StreamChunk { delta, done: false }))
            }
        }
        Err(e) => Some(Err(FortuneError::Parse(format!("bad stream frame: {e}")))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tarot_core::reading::{DrawnCard, SpreadPosition};

    fn request() -> ReadingRequest {
        ReadingRequest {
            question: "Should I change jobs?".into(),
            cards: vec![
                DrawnCard {
                    position: SpreadPosition::Past,
                    card_name: "The Fool".into(),
                    reversed: false,
                },
                DrawnCard {
                    position: SpreadPosition::Present,
                    card_name: "The Tower".into(),
                    reversed: true,
                },
                DrawnCard {
                    position: SpreadPosition::Future,
                    card_name: "The Star".into(),
                    reversed: false,
                },
            ],
        }
    }

    #[test]
    fn prompt_carries_question_and_cards() {
        let prompt = build_prompt(&request());
        assert!(prompt.contains("Should I change jobs?"));
        assert!(prompt.contains("Present: The Tower (reversed)"));
        assert!(prompt.contains("Future: The Star (upright)"));
    }

    #[test]
    fn parses_delta_line() {
        let line = r#"data: {"choices":[{"delta":{"content":"The cards"}}]}"#;
        let chunk = parse_sse_line(line).unwrap().unwrap();
        assert_eq!(chunk.delta, "The cards");
        assert!(!chunk.done);
    }

    #[test]
    fn parses_done_sentinel() {
        let chunk = parse_sse_line("data: [DONE]").unwrap().unwrap();
        assert!(chunk.done);
    }

    #[test]
    fn skips_keepalives_and_empty_deltas() {
        assert!(parse_sse_line("").is_none());
        assert!(parse_sse_line(": keep-alive").is_none());
        assert!(parse_sse_line(r#"data: {"choices":[{"delta":{}}]}"#).is_none());
    }

    #[test]
    fn decoder_handles_frames_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.feed(br#"data: {"choices":[{"delta":{"content":"He"#);
        assert!(frames.is_empty());

        let frames = decoder.feed(b"llo\"}}]}\ndata: [DONE]\n");
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].as_ref().unwrap().delta, "Hello");
        assert!(frames[1].as_ref().unwrap().done);
    }
}

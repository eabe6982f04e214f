//! Groq provider implementation.
//!
//! Groq speaks the OpenAI-compatible `/v1/chat/completions` API. Requests
//! always ask for incremental (SSE) delivery; the returned stream yields
//! content fragments parsed from `data:` lines until the `[DONE]` terminal.

use super::{ChatRequest, CompletionProvider, CompletionStream, Message, ProviderError};
use async_trait::async_trait;
use futures_util::{stream, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Groq API provider.
pub struct GroqProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GroqProvider {
    /// Create a new Groq provider against the public endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, "https://api.groq.com/openai")
    }

    /// Create with a custom base URL (for compatible APIs or tests).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn error(&self, model: &str, message: String, status_code: Option<u16>) -> ProviderError {
        ProviderError {
            provider: "groq".into(),
            model: model.to_string(),
            message,
            status_code,
        }
    }
}

#[async_trait]
impl CompletionProvider for GroqProvider {
    fn name(&self) -> &str {
        "groq"
    }

    async fn chat_stream(&self, request: ChatRequest) -> Result<CompletionStream, ProviderError> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let groq_request = GroqRequest {
            model: &request.model,
            messages: &request.messages,
            temperature: request.temperature,
            top_p: request.top_p,
            max_tokens: request.max_tokens,
            stream: true,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Accept", "text/event-stream")
            .json(&groq_request)
            .send()
            .await
            .map_err(|e| self.error(&request.model, format!("Request failed: {e}"), None))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.error(
                &request.model,
                format!("API error: {body}"),
                Some(status.as_u16()),
            ));
        }

        Ok(sse_fragment_stream(
            response.bytes_stream().boxed(),
            "groq".to_string(),
            request.model,
        ))
    }
}

// ============================================================================
// SSE Stream Parsing
// ============================================================================

/// One parsed server-sent event from the completion stream.
#[derive(Debug, PartialEq)]
enum StreamEvent {
    /// A content fragment (may be empty for role-only deltas).
    Delta(String),
    /// The `data: [DONE]` terminal.
    Done,
}

struct SseState<S> {
    inner: S,
    buffer: String,
    pending: VecDeque<String>,
    done: bool,
    provider: String,
    model: String,
}

/// Wrap a raw byte stream into a stream of completion text fragments.
///
/// Events are delimited by blank lines; fragments are emitted in order and
/// the stream terminates after `[DONE]` or on the first transport error.
fn sse_fragment_stream<S, B>(byte_stream: S, provider: String, model: String) -> CompletionStream
where
    S: Stream<Item = Result<B, reqwest::Error>> + Send + Unpin + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    let state = SseState {
        inner: byte_stream,
        buffer: String::new(),
        pending: VecDeque::new(),
        done: false,
        provider,
        model,
    };

    Box::pin(stream::unfold(state, |mut st| async move {
        loop {
            if let Some(fragment) = st.pending.pop_front() {
                return Some((Ok(fragment), st));
            }
            if st.done {
                return None;
            }

            match st.inner.next().await {
                Some(Ok(chunk)) => {
                    st.buffer.push_str(&String::from_utf8_lossy(chunk.as_ref()));

                    while let Some(pos) = st.buffer.find("\n\n") {
                        let event_text = st.buffer[..pos].to_string();
                        st.buffer.drain(..pos + 2);

                        match parse_stream_event(&event_text) {
                            Some(StreamEvent::Delta(text)) if !text.is_empty() => {
                                st.pending.push_back(text);
                            }
                            Some(StreamEvent::Done) => {
                                st.done = true;
                                break;
                            }
                            _ => {}
                        }
                    }
                }
                Some(Err(e)) => {
                    st.done = true;
                    st.pending.clear();
                    let err = ProviderError {
                        provider: st.provider.clone(),
                        model: st.model.clone(),
                        message: format!("Stream error: {e}"),
                        status_code: None,
                    };
                    return Some((Err(err), st));
                }
                None => return None,
            }
        }
    }))
}

/// Parse a single SSE event block into a stream event.
fn parse_stream_event(text: &str) -> Option<StreamEvent> {
    let mut data_line: Option<&str> = None;

    for line in text.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("data:") {
            data_line = Some(rest.trim());
        }
    }

    let data = data_line?;

    if data == "[DONE]" {
        return Some(StreamEvent::Done);
    }

    let chunk: StreamChunk = serde_json::from_str(data).ok()?;
    let content = chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta.content)
        .unwrap_or_default();

    Some(StreamEvent::Delta(content))
}

// ============================================================================
// Groq API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct GroqRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<i64>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::collect_stream;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn parse_done_terminal() {
        assert_eq!(
            parse_stream_event("data: [DONE]"),
            Some(StreamEvent::Done)
        );
    }

    #[test]
    fn parse_content_delta() {
        let event = r#"data: {"choices":[{"delta":{"content":"Hello"}}]}"#;
        assert_eq!(
            parse_stream_event(event),
            Some(StreamEvent::Delta("Hello".into()))
        );
    }

    #[test]
    fn parse_role_only_delta_is_empty() {
        let event = r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#;
        assert_eq!(parse_stream_event(event), Some(StreamEvent::Delta(String::new())));
    }

    #[test]
    fn parse_ignores_comment_events() {
        assert_eq!(parse_stream_event(": keep-alive"), None);
    }

    #[tokio::test]
    async fn streamed_fragments_concatenate() {
        let server = MockServer::start().await;

        let body = concat!(
            "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hello\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\" world\"}}]}\n\n",
            "data: [DONE]\n\n",
        );

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .mount(&server)
            .await;

        let provider = GroqProvider::with_base_url("gsk_test", server.uri());
        let request = ChatRequest {
            model: "mistral-saba-24b".into(),
            messages: vec![Message::user("Hi")],
            max_tokens: Some(1024),
            temperature: Some(0.5),
            top_p: Some(1.0),
        };

        let stream = provider.chat_stream(request).await.unwrap();
        assert_eq!(collect_stream(stream).await.unwrap(), "Hello world");
    }

    #[tokio::test]
    async fn api_error_carries_status_code() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let provider = GroqProvider::with_base_url("bad-key", server.uri());
        let request = ChatRequest {
            model: "mistral-saba-24b".into(),
            messages: vec![Message::user("Hi")],
            max_tokens: None,
            temperature: None,
            top_p: None,
        };

        let err = provider.chat_stream(request).await.err().unwrap();
        assert_eq!(err.status_code, Some(401));
        assert!(err.message.contains("invalid api key"));
    }
}

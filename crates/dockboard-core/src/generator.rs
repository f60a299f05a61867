//! Text generation over the Anthropic Messages API.

use dockboard_common::config::GenerationConfig;
use dockboard_common::constants::{GENERATION_API_VERSION, GENERATION_MAX_TOKENS};
use dockboard_common::error::{DockboardError, Result};
use serde::{Deserialize, Serialize};

use crate::description::TextGenerator;

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [Message<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// [`TextGenerator`] calling `POST /v1/messages` with a blocking client.
///
/// Must not be called (or dropped) from inside an async context; the HTTP
/// layer reaches it through `spawn_blocking`.
#[derive(Debug)]
pub struct AnthropicGenerator {
    client: reqwest::blocking::Client,
    config: GenerationConfig,
}

impl AnthropicGenerator {
    /// Builds a generator with the configured request timeout.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the HTTP client cannot be built.
    pub fn new(config: GenerationConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DockboardError::Config {
                message: format!("failed to build generation HTTP client: {e}"),
            })?;
        Ok(Self { client, config })
    }

    /// Model requested from the API.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.config.model
    }
}

impl TextGenerator for AnthropicGenerator {
    fn generate(&self, prompt: &str) -> Result<String> {
        let request = MessagesRequest {
            model: &self.config.model,
            max_tokens: GENERATION_MAX_TOKENS,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", GENERATION_API_VERSION)
            .json(&request)
            .send()
            .map_err(|e| external(format!("request to {} failed: {e}", self.config.endpoint)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(external(format!("HTTP {status}: {}", body.trim())));
        }

        let parsed: MessagesResponse = response
            .json()
            .map_err(|e| external(format!("malformed response: {e}")))?;
        first_text(&parsed)
    }
}

fn first_text(response: &MessagesResponse) -> Result<String> {
    let text = response
        .content
        .iter()
        .filter(|block| block.kind == "text")
        .find_map(|block| block.text.as_deref())
        .map(str::trim)
        .unwrap_or_default();
    if text.is_empty() {
        return Err(external("response carried no text".to_string()));
    }
    Ok(text.to_string())
}

fn external(message: String) -> DockboardError {
    DockboardError::ExternalService { message }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::time::Duration;

    use super::*;

    /// Answers exactly one HTTP request with `status` and `body`, and hands
    /// back the raw request it received.
    fn serve_once(status: &'static str, body: &'static str) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/v1/messages", listener.local_addr().unwrap());
        let (tx, rx) = mpsc::channel();
        let _server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            stream.set_read_timeout(Some(Duration::from_millis(500))).unwrap();
            let mut request = Vec::new();
            let mut buf = [0_u8; 4096];
            while let Ok(n) = stream.read(&mut buf) {
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if String::from_utf8_lossy(&request).contains("\"messages\"") {
                    break;
                }
            }
            let reply = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(reply.as_bytes()).unwrap();
            let _ = tx.send(String::from_utf8_lossy(&request).into_owned());
        });
        (url, rx)
    }

    fn generator(endpoint: String) -> AnthropicGenerator {
        let mut config = GenerationConfig::new("sk-test");
        config.endpoint = endpoint;
        config.timeout = Duration::from_secs(5);
        AnthropicGenerator::new(config).unwrap()
    }

    #[test]
    fn sends_key_version_and_prompt() {
        let (url, request) = serve_once(
            "200 OK",
            r#"{"content":[{"type":"text","text":"  Serves the landing page.  "}]}"#,
        );
        let text = generator(url).generate("Container name: web").unwrap();
        assert_eq!(text, "Serves the landing page.");

        let raw = request.recv_timeout(Duration::from_secs(5)).unwrap().to_ascii_lowercase();
        assert!(raw.starts_with("post /v1/messages"));
        assert!(raw.contains("x-api-key: sk-test"));
        assert!(raw.contains("anthropic-version: 2023-06-01"));
        assert!(raw.contains("\"max_tokens\":100"));
        assert!(raw.contains("container name: web"));
    }

    #[test]
    fn error_status_is_external_service() {
        let (url, _request) = serve_once("529 Overloaded", r#"{"type":"error"}"#);
        let err = generator(url).generate("p").unwrap_err();
        assert!(matches!(err, DockboardError::ExternalService { .. }));
        assert!(err.to_string().contains("529"));
    }

    #[test]
    fn unreachable_endpoint_is_external_service() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/v1/messages", listener.local_addr().unwrap());
        drop(listener);
        assert!(matches!(
            generator(url).generate("p"),
            Err(DockboardError::ExternalService { .. })
        ));
    }

    #[test]
    fn response_without_text_is_rejected() {
        let parsed: MessagesResponse =
            serde_json::from_str(r#"{"content":[{"type":"tool_use","id":"x"}]}"#).unwrap();
        assert!(first_text(&parsed).is_err());
        let empty: MessagesResponse = serde_json::from_str(r#"{"content":[]}"#).unwrap();
        assert!(first_text(&empty).is_err());
    }
}

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::orchestrator::traits::CompletionClient;

use super::error::RemoteError;

/// 文本补全端点的客户端。请求体为 `{prompt, max_length}`，
/// 响应体为 `{text}`。
pub struct HttpCompletionClient {
    agent: ureq::Agent,
    url: String,
    max_reply_length: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    text: String,
}

impl HttpCompletionClient {
    pub fn new(url: impl Into<String>, max_reply_length: u32, timeout: Duration) -> Self {
        Self {
            agent: super::build_agent(timeout),
            url: url.into(),
            max_reply_length,
        }
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(&self, prompt: &str) -> Result<String, RemoteError> {
        let agent = self.agent.clone();
        let url = self.url.clone();
        let body = serde_json::json!({
            "prompt": prompt,
            "max_length": self.max_reply_length,
        });

        tokio::task::spawn_blocking(move || {
            let response = agent.post(&url).send_json(body).map_err(|err| match err {
                ureq::Error::Status(status, response) => {
                    RemoteError::server(status, response.status_text().to_string())
                }
                ureq::Error::Transport(transport) => RemoteError::network(transport.to_string()),
            })?;

            let status = response.status();
            let parsed: CompletionResponse = response.into_json().map_err(|err| {
                RemoteError::server(status, format!("invalid completion body: {err}"))
            })?;
            debug!(
                target: "remote_completion",
                chars = parsed.text.chars().count(),
                "completion resolved"
            );
            Ok(parsed.text)
        })
        .await
        .map_err(|err| RemoteError::network(format!("completion task failed: {err}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::testing::{body_of, json_response, serve_once, serve_stalled};

    #[tokio::test]
    async fn resolves_reply_text() {
        let (url, server) = serve_once(json_response(
            200,
            "OK",
            "{\"text\":\"こんにちは、今日はどうしましたか？\"}",
        ));
        let client = HttpCompletionClient::new(url, 1000, Duration::from_secs(5));

        let reply = client
            .complete("こんにちは")
            .await
            .expect("completion should resolve");
        assert_eq!(reply, "こんにちは、今日はどうしましたか？");

        let request = server.join().expect("server thread joined");
        let body = body_of(&request);
        assert!(body.contains("\"prompt\":\"こんにちは\""));
        assert!(body.contains("\"max_length\":1000"));
    }

    #[tokio::test]
    async fn maps_status_to_server_error() {
        let (url, server) = serve_once(json_response(500, "Internal Server Error", "{}"));
        let client = HttpCompletionClient::new(url, 1000, Duration::from_secs(5));

        let err = client
            .complete("prompt")
            .await
            .expect_err("500 must surface as error");
        assert_eq!(err.status(), Some(500));
        assert!(err.to_string().contains("500"));

        server.join().expect("server thread joined");
    }

    #[tokio::test]
    async fn stalled_server_surfaces_network_error() {
        let (url, server) = serve_stalled(Duration::from_millis(900));
        let client = HttpCompletionClient::new(url, 1000, Duration::from_millis(150));

        let err = client
            .complete("prompt")
            .await
            .expect_err("stalled server must time out");
        assert!(matches!(err, RemoteError::Network { .. }));

        server.join().expect("server thread joined");
    }
}

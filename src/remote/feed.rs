use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::orchestrator::traits::FeedClient;
use crate::orchestrator::types::FeedPost;

use super::error::RemoteError;

/// 公开信息流端点的客户端。发布与拉取共用同一资源地址，
/// 发布成功与否只看 HTTP 状态。
pub struct HttpFeedClient {
    agent: ureq::Agent,
    url: String,
}

impl HttpFeedClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            agent: super::build_agent(timeout),
            url: url.into(),
        }
    }
}

#[async_trait]
impl FeedClient for HttpFeedClient {
    async fn publish(&self, content: &str) -> Result<(), RemoteError> {
        let agent = self.agent.clone();
        let url = self.url.clone();
        let body = serde_json::json!({ "content": content });

        tokio::task::spawn_blocking(move || {
            let response = agent.post(&url).send_json(body).map_err(|err| match err {
                ureq::Error::Status(status, response) => {
                    RemoteError::server(status, response.status_text().to_string())
                }
                ureq::Error::Transport(transport) => RemoteError::network(transport.to_string()),
            })?;

            if let Ok(ack) = response.into_string() {
                debug!(target: "remote_feed", bytes = ack.len(), "feed post stored");
            }
            Ok(())
        })
        .await
        .map_err(|err| RemoteError::network(format!("feed task failed: {err}")))?
    }

    async fn list(&self) -> Result<Vec<FeedPost>, RemoteError> {
        let agent = self.agent.clone();
        let url = self.url.clone();

        tokio::task::spawn_blocking(move || {
            let response = agent.get(&url).call().map_err(|err| match err {
                ureq::Error::Status(status, response) => {
                    RemoteError::server(status, response.status_text().to_string())
                }
                ureq::Error::Transport(transport) => RemoteError::network(transport.to_string()),
            })?;

            let status = response.status();
            let posts: Vec<FeedPost> = response
                .into_json()
                .map_err(|err| RemoteError::server(status, format!("invalid feed body: {err}")))?;
            Ok(posts)
        })
        .await
        .map_err(|err| RemoteError::network(format!("feed task failed: {err}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::testing::{body_of, json_response, serve_once};

    #[tokio::test]
    async fn publish_requires_confirmed_status() {
        let (url, server) = serve_once(json_response(500, "Internal Server Error", "{}"));
        let client = HttpFeedClient::new(url, Duration::from_secs(5));

        let err = client
            .publish("応答テキスト")
            .await
            .expect_err("500 must fail the publish");
        assert_eq!(err.status(), Some(500));

        server.join().expect("server thread joined");
    }

    #[tokio::test]
    async fn publish_sends_content_body() {
        let (url, server) = serve_once(json_response(201, "Created", "{\"id\":1}"));
        let client = HttpFeedClient::new(url, Duration::from_secs(5));

        client
            .publish("応答テキスト")
            .await
            .expect("publish should resolve");

        let request = server.join().expect("server thread joined");
        assert!(body_of(&request).contains("\"content\":\"応答テキスト\""));
    }

    #[tokio::test]
    async fn list_preserves_served_order() {
        let (url, server) = serve_once(json_response(
            200,
            "OK",
            "[{\"content\":\"古い投稿\",\"date\":\"2026-08-24\"},{\"content\":\"新しい投稿\",\"date\":\"2026-08-25\"}]",
        ));
        let client = HttpFeedClient::new(url, Duration::from_secs(5));

        let posts = client.list().await.expect("list should resolve");
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].content, "古い投稿");
        assert_eq!(posts[1].content, "新しい投稿");

        server.join().expect("server thread joined");
    }
}

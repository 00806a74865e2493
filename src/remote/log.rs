use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::conversation::Turn;
use crate::orchestrator::traits::LogClient;

use super::error::RemoteError;

/// 会话日志端点的客户端。整份历史随 `{history, target_email}`
/// 一次提交，换回 `{message}` 确认语。
pub struct HttpLogClient {
    agent: ureq::Agent,
    url: String,
    target_email: String,
}

#[derive(Debug, Deserialize)]
struct LogAck {
    message: String,
}

#[derive(Debug, Deserialize)]
struct LogErrorBody {
    detail: Option<String>,
}

impl HttpLogClient {
    pub fn new(
        url: impl Into<String>,
        target_email: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            agent: super::build_agent(timeout),
            url: url.into(),
            target_email: target_email.into(),
        }
    }
}

#[async_trait]
impl LogClient for HttpLogClient {
    async fn append(&self, history: &[Turn]) -> Result<String, RemoteError> {
        let agent = self.agent.clone();
        let url = self.url.clone();
        let body = serde_json::json!({
            "history": history,
            "target_email": self.target_email,
        });

        tokio::task::spawn_blocking(move || {
            let response = agent.post(&url).send_json(body).map_err(|err| match err {
                ureq::Error::Status(status, response) => {
                    RemoteError::server(status, error_detail(response))
                }
                ureq::Error::Transport(transport) => RemoteError::network(transport.to_string()),
            })?;

            let status = response.status();
            let ack: LogAck = response
                .into_json()
                .map_err(|err| RemoteError::server(status, format!("invalid log ack: {err}")))?;
            debug!(target: "remote_log", ack = %ack.message, "history logged");
            Ok(ack.message)
        })
        .await
        .map_err(|err| RemoteError::network(format!("log task failed: {err}")))?
    }
}

/// 错误细节优先取响应体 JSON 的 `detail` 字段，其次整个 JSON
/// 文本，最后退回 HTTP 状态短语。
fn error_detail(response: ureq::Response) -> String {
    let status_text = response.status_text().to_string();
    match response.into_string() {
        Ok(body) => match serde_json::from_str::<LogErrorBody>(&body) {
            Ok(LogErrorBody {
                detail: Some(detail),
            }) => detail,
            Ok(_) => body,
            Err(_) => status_text,
        },
        Err(_) => status_text,
    }
}

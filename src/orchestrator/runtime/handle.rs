use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::orchestrator::types::SessionCommand;

pub struct TurnSessionHandle {
    command_tx: mpsc::Sender<SessionCommand>,
    worker: Option<JoinHandle<()>>,
}

impl TurnSessionHandle {
    pub(super) fn new(command_tx: mpsc::Sender<SessionCommand>, worker: JoinHandle<()>) -> Self {
        Self {
            command_tx,
            worker: Some(worker),
        }
    }

    /// 请求开始（或重启）一次语音采集。
    pub async fn activate(&self) -> Result<(), mpsc::error::SendError<SessionCommand>> {
        self.command_tx.send(SessionCommand::Activate).await
    }

    /// 以键入文本开启一个回合。空白内容在这里直接丢弃。
    pub async fn submit_text(
        &self,
        text: impl Into<String>,
    ) -> Result<(), mpsc::error::SendError<SessionCommand>> {
        let text = text.into();
        if text.trim().is_empty() {
            warn!(target: "turn_orchestrator", "ignoring empty text submission");
            return Ok(());
        }
        self.command_tx.send(SessionCommand::SubmitText(text)).await
    }

    /// 手动把当前历史送往日志通道。
    pub async fn flush_log(&self) -> Result<(), mpsc::error::SendError<SessionCommand>> {
        self.command_tx.send(SessionCommand::FlushLog).await
    }

    pub fn commands(&self) -> mpsc::Sender<SessionCommand> {
        self.command_tx.clone()
    }
}

impl Drop for TurnSessionHandle {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.abort();
        }
    }
}

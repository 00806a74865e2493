//! 会话装配层：把回合编排接到界面与广播总线上。

pub mod frontend;
pub mod timeline;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::orchestrator::config::{EndpointConfig, TurnSessionConfig};
use crate::orchestrator::types::SessionUpdate;
use crate::orchestrator::{TurnOrchestrator, TurnSessionHandle};
use crate::session::frontend::Frontend;
use crate::session::timeline::TimelineView;
use crate::speech::{RecognitionEngine, SynthesisEngine};

pub struct SessionManager {
    orchestrator: TurnOrchestrator,
    update_tx: broadcast::Sender<SessionUpdate>,
}

impl SessionManager {
    pub fn new(
        endpoints: &EndpointConfig,
        defaults: &TurnSessionConfig,
        recognition: Arc<dyn RecognitionEngine>,
        synthesis: Arc<dyn SynthesisEngine>,
    ) -> Self {
        Self::from_parts(TurnOrchestrator::new(
            endpoints,
            defaults,
            recognition,
            synthesis,
        ))
    }

    pub fn with_orchestrator(orchestrator: TurnOrchestrator) -> Self {
        Self::from_parts(orchestrator)
    }

    fn from_parts(orchestrator: TurnOrchestrator) -> Self {
        let (update_tx, _) = broadcast::channel(64);
        Self {
            orchestrator,
            update_tx,
        }
    }

    pub async fn run(&self) -> Result<()> {
        info!(target: "session_manager", "running bootstrap tasks");
        self.orchestrator.warmup().await?;
        Ok(())
    }

    pub fn subscribe_updates(&self) -> broadcast::Receiver<SessionUpdate> {
        self.update_tx.subscribe()
    }

    /// 启动一次会话，返回控制句柄与该会话的更新流。
    /// 更新同时镜像到广播总线，供额外的观察者订阅。
    pub fn start_conversation(
        &self,
        config: TurnSessionConfig,
    ) -> (TurnSessionHandle, mpsc::Receiver<SessionUpdate>) {
        let buffer_capacity = config.buffer_capacity;
        let (handle, mut rx) = self.orchestrator.start_session(config);
        let updates_bus = self.update_tx.clone();
        let (client_tx, client_rx) = mpsc::channel(buffer_capacity);

        tokio::spawn(async move {
            while let Some(update) = rx.recv().await {
                let guarantee_delivery = matches!(update, SessionUpdate::Transient(_));

                if updates_bus.receiver_count() > 0 {
                    if let Err(err) = updates_bus.send(update.clone()) {
                        warn!(
                            target: "session_manager",
                            %err,
                            "failed to broadcast session update"
                        );
                    }
                }

                match client_tx.try_send(update) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(update)) => {
                        if guarantee_delivery {
                            if client_tx.send(update).await.is_err() {
                                break;
                            }
                        } else {
                            warn!(
                                target: "session_manager",
                                "dropping session update due to slow consumer"
                            );
                        }
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => break,
                }
            }
        });

        (handle, client_rx)
    }

    /// 把更新流翻译成界面回调，直到会话结束。
    pub fn spawn_frontend_pump(
        frontend: Arc<dyn Frontend>,
        mut updates: mpsc::Receiver<SessionUpdate>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(update) = updates.recv().await {
                match update {
                    SessionUpdate::Status(status) => {
                        frontend.set_status(status.label, status.listening);
                    }
                    SessionUpdate::TurnRecorded(entry) => {
                        frontend.append_turn(entry.role, &entry.text);
                    }
                    SessionUpdate::InputCleared => frontend.clear_input(),
                    SessionUpdate::Transient(message) => frontend.show_transient(&message),
                    SessionUpdate::Timeline(posts) => {
                        frontend.render_timeline(&TimelineView::from_feed(posts));
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{Turn, TurnRole};
    use crate::orchestrator::traits::{CompletionClient, FeedClient, LogClient};
    use crate::orchestrator::types::{ActivityState, FeedPost, StatusUpdate, TurnEntry};
    use crate::remote::RemoteError;
    use crate::speech::{SilentSynthesis, UnavailableRecognition};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::time::{timeout, Duration};

    struct FixedCompletion {
        reply: String,
    }

    #[async_trait]
    impl CompletionClient for FixedCompletion {
        async fn complete(&self, _prompt: &str) -> Result<String, RemoteError> {
            Ok(self.reply.clone())
        }
    }

    struct NullLog;

    #[async_trait]
    impl LogClient for NullLog {
        async fn append(&self, _history: &[Turn]) -> Result<String, RemoteError> {
            Ok("logged".to_string())
        }
    }

    struct StaticFeed {
        posts: Vec<FeedPost>,
    }

    #[async_trait]
    impl FeedClient for StaticFeed {
        async fn publish(&self, _content: &str) -> Result<(), RemoteError> {
            Ok(())
        }

        async fn list(&self) -> Result<Vec<FeedPost>, RemoteError> {
            Ok(self.posts.clone())
        }
    }

    #[derive(Default)]
    struct RecordingFrontend {
        calls: Mutex<Vec<String>>,
    }

    impl RecordingFrontend {
        fn record(&self, call: String) {
            self.calls.lock().expect("calls lock").push(call);
        }
    }

    impl Frontend for RecordingFrontend {
        fn set_status(&self, label: &str, listening: bool) {
            self.record(format!("status:{label}:{listening}"));
        }

        fn append_turn(&self, role: TurnRole, text: &str) {
            self.record(format!("turn:{}:{text}", role.as_str()));
        }

        fn clear_input(&self) {
            self.record("clear".to_string());
        }

        fn show_transient(&self, message: &str) {
            self.record(format!("notice:{message}"));
        }

        fn render_timeline(&self, timeline: &TimelineView) {
            let contents: Vec<&str> = timeline
                .posts()
                .iter()
                .map(|post| post.content.as_str())
                .collect();
            self.record(format!("timeline:{}", contents.join("|")));
        }
    }

    fn manager_with_reply(reply: &str) -> SessionManager {
        let orchestrator = TurnOrchestrator::with_components(
            Arc::new(FixedCompletion {
                reply: reply.to_string(),
            }),
            Arc::new(NullLog),
            Arc::new(StaticFeed { posts: Vec::new() }),
            Arc::new(UnavailableRecognition),
            Arc::new(SilentSynthesis),
        );
        SessionManager::with_orchestrator(orchestrator)
    }

    async fn next_update(rx: &mut mpsc::Receiver<SessionUpdate>) -> SessionUpdate {
        timeout(Duration::from_millis(600), rx.recv())
            .await
            .expect("timed out waiting for session update")
            .expect("update channel closed")
    }

    async fn wait_for<F>(rx: &mut mpsc::Receiver<SessionUpdate>, mut matches: F) -> SessionUpdate
    where
        F: FnMut(&SessionUpdate) -> bool,
    {
        loop {
            let update = next_update(rx).await;
            if matches(&update) {
                return update;
            }
        }
    }

    fn is_assistant_turn(update: &SessionUpdate) -> bool {
        matches!(
            update,
            SessionUpdate::TurnRecorded(TurnEntry {
                role: TurnRole::Assistant,
                ..
            })
        )
    }

    #[tokio::test]
    async fn client_and_broadcast_observers_see_the_same_turns() {
        let manager = manager_with_reply("はい、こんにちは。");
        manager.run().await.expect("bootstrap should succeed");

        let mut broadcast_rx = manager.subscribe_updates();
        let (handle, mut client_rx) = manager.start_conversation(TurnSessionConfig::default());

        handle
            .submit_text("こんにちは")
            .await
            .expect("submit text command");

        let client_turn = wait_for(&mut client_rx, is_assistant_turn).await;
        match client_turn {
            SessionUpdate::TurnRecorded(entry) => assert_eq!(entry.text, "はい、こんにちは。"),
            other => panic!("unexpected update: {other:?}"),
        }

        loop {
            let update = timeout(Duration::from_millis(600), broadcast_rx.recv())
                .await
                .expect("timed out waiting for broadcast update")
                .expect("broadcast channel closed");
            if is_assistant_turn(&update) {
                break;
            }
        }
    }

    #[tokio::test]
    async fn frontend_pump_translates_updates_in_order() {
        let frontend = Arc::new(RecordingFrontend::default());
        let (tx, rx) = mpsc::channel(8);
        let pump = SessionManager::spawn_frontend_pump(frontend.clone(), rx);

        tx.send(SessionUpdate::Status(StatusUpdate::for_state(
            ActivityState::Listening,
        )))
        .await
        .expect("send status");
        tx.send(SessionUpdate::TurnRecorded(TurnEntry {
            role: TurnRole::User,
            text: "こんにちは".to_string(),
        }))
        .await
        .expect("send turn");
        tx.send(SessionUpdate::InputCleared)
            .await
            .expect("send clear");
        tx.send(SessionUpdate::Transient("通知".to_string()))
            .await
            .expect("send transient");
        tx.send(SessionUpdate::Timeline(vec![
            FeedPost {
                content: "古い投稿".to_string(),
                date: String::new(),
            },
            FeedPost {
                content: "新しい投稿".to_string(),
                date: String::new(),
            },
        ]))
        .await
        .expect("send timeline");
        drop(tx);

        timeout(Duration::from_millis(600), pump)
            .await
            .expect("pump should stop once the channel closes")
            .expect("pump task");

        let calls = frontend.calls.lock().expect("calls lock");
        assert_eq!(
            *calls,
            vec![
                "status:リスニング中:true".to_string(),
                "turn:user:こんにちは".to_string(),
                "clear".to_string(),
                "notice:通知".to_string(),
                "timeline:新しい投稿|古い投稿".to_string(),
            ]
        );
    }
}

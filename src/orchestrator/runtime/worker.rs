use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, warn};

use crate::conversation::{ConversationHistory, TurnRole};
use crate::orchestrator::config::TurnSessionConfig;
use crate::orchestrator::constants::{
    COMPLETION_ERROR_PREFIX, EMPTY_HISTORY_MESSAGE, FALLBACK_APOLOGY, LOG_FLUSH_ACK_PREFIX,
    LOG_FLUSH_ERROR_PREFIX, UNSUPPORTED_CAPTURE_MESSAGE,
};
use crate::orchestrator::traits::{CompletionClient, FeedClient, LogClient};
use crate::orchestrator::types::{
    ActivityState, SessionCommand, SessionUpdate, StatusUpdate, TurnEntry,
};
use crate::remote::RemoteError;
use crate::speech::{
    CaptureControl, CaptureOutcome, SpeechError, SpeechInput, SpeechOutput, SpokenOutcome,
};
use crate::telemetry::events::{record_side_channel, record_turn_completed};

use super::state::{ActivationDisposition, TurnFlow};

pub(crate) enum FlowEvent {
    CaptureSettled {
        generation: u64,
        outcome: CaptureOutcome,
    },
    CompletionSettled {
        generation: u64,
        latency: Duration,
        result: Result<String, RemoteError>,
    },
    UtteranceSettled {
        generation: u64,
    },
    StandbyElapsed {
        epoch: u64,
    },
}

pub(crate) struct TurnWorker {
    config: TurnSessionConfig,
    command_rx: mpsc::Receiver<SessionCommand>,
    event_rx: mpsc::Receiver<FlowEvent>,
    event_tx: mpsc::Sender<FlowEvent>,
    updates_tx: mpsc::Sender<SessionUpdate>,
    completion: Arc<dyn CompletionClient>,
    log: Arc<dyn LogClient>,
    feed: Arc<dyn FeedClient>,
    speech_input: SpeechInput,
    speech_output: Arc<SpeechOutput>,
    flow: TurnFlow,
    history: ConversationHistory,
    active_capture: Option<Box<dyn CaptureControl>>,
    turn_index: u64,
}

impl TurnWorker {
    pub(crate) fn new(
        config: TurnSessionConfig,
        command_rx: mpsc::Receiver<SessionCommand>,
        event_rx: mpsc::Receiver<FlowEvent>,
        event_tx: mpsc::Sender<FlowEvent>,
        updates_tx: mpsc::Sender<SessionUpdate>,
        completion: Arc<dyn CompletionClient>,
        log: Arc<dyn LogClient>,
        feed: Arc<dyn FeedClient>,
        speech_input: SpeechInput,
        speech_output: Arc<SpeechOutput>,
    ) -> Self {
        Self {
            config,
            command_rx,
            event_rx,
            event_tx,
            updates_tx,
            completion,
            log,
            feed,
            speech_input,
            speech_output,
            flow: TurnFlow::new(),
            history: ConversationHistory::new(),
            active_capture: None,
            turn_index: 0,
        }
    }

    pub(crate) fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        self.bootstrap().await;

        loop {
            tokio::select! {
                biased;
                command = self.command_rx.recv() => {
                    match command {
                        Some(command) => self.handle_command(command).await,
                        None => break,
                    }
                }
                event = self.event_rx.recv() => {
                    match event {
                        Some(event) => self.handle_event(event).await,
                        None => break,
                    }
                }
            }
        }
    }

    /// 启动时安排待机标签并预取一次信息流时间线。
    async fn bootstrap(&mut self) {
        self.settle_idle().await;

        let feed = Arc::clone(&self.feed);
        let updates = self.updates_tx.clone();
        tokio::spawn(async move {
            match feed.list().await {
                Ok(posts) => {
                    let _ = updates.send(SessionUpdate::Timeline(posts)).await;
                }
                Err(err) => {
                    warn!(
                        target: "turn_orchestrator",
                        %err,
                        "startup timeline fetch failed"
                    );
                }
            }
        });
    }

    async fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Activate => self.handle_activation().await,
            SessionCommand::SubmitText(text) => self.handle_submission(text).await,
            SessionCommand::FlushLog => self.flush_log().await,
        }
    }

    async fn handle_event(&mut self, event: FlowEvent) {
        match event {
            FlowEvent::CaptureSettled {
                generation,
                outcome,
            } => self.on_capture_settled(generation, outcome).await,
            FlowEvent::CompletionSettled {
                generation,
                latency,
                result,
            } => self.on_completion_settled(generation, latency, result).await,
            FlowEvent::UtteranceSettled { generation } => {
                self.on_utterance_settled(generation).await
            }
            FlowEvent::StandbyElapsed { epoch } => self.on_standby_elapsed(epoch).await,
        }
    }

    async fn handle_activation(&mut self) {
        match self.flow.classify_activation() {
            ActivationDisposition::Ignore => {
                debug!(
                    target: "turn_orchestrator",
                    state = self.flow.activity().as_str(),
                    "activation ignored"
                );
            }
            ActivationDisposition::Restart => {
                debug!(target: "turn_orchestrator", "restarting speech capture");
                if let Some(mut control) = self.active_capture.take() {
                    control.stop();
                }
                self.start_capture(true).await;
            }
            ActivationDisposition::Begin => self.start_capture(false).await,
        }
    }

    async fn start_capture(&mut self, restarted: bool) {
        match self.speech_input.activate() {
            Ok(session) => {
                let generation = self.flow.begin_capture();
                self.active_capture = Some(session.control);
                self.emit_status().await;

                let events = self.event_tx.clone();
                let settled = session.settled;
                tokio::spawn(async move {
                    let outcome = match settled.await {
                        Ok(outcome) => outcome,
                        Err(_) => CaptureOutcome::Failed("capture task dropped".to_string()),
                    };
                    let _ = events
                        .send(FlowEvent::CaptureSettled {
                            generation,
                            outcome,
                        })
                        .await;
                });
            }
            Err(SpeechError::Unsupported) => {
                warn!(
                    target: "turn_orchestrator",
                    "speech capture unavailable on this host"
                );
                self.send_update(SessionUpdate::Transient(
                    UNSUPPORTED_CAPTURE_MESSAGE.to_string(),
                ))
                .await;
                if restarted {
                    self.settle_idle().await;
                }
            }
            Err(err) => {
                error!(
                    target: "turn_orchestrator",
                    %err,
                    "speech capture failed to start"
                );
                self.send_update(SessionUpdate::Transient(
                    UNSUPPORTED_CAPTURE_MESSAGE.to_string(),
                ))
                .await;
                if restarted {
                    self.settle_idle().await;
                }
            }
        }
    }

    async fn handle_submission(&mut self, text: String) {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            debug!(target: "turn_orchestrator", "ignoring empty submission");
            return;
        }
        if !self.flow.accepts_text_submission() {
            debug!(
                target: "turn_orchestrator",
                state = self.flow.activity().as_str(),
                "text submission ignored while busy"
            );
            return;
        }
        self.start_turn(trimmed.to_string()).await;
    }

    /// 一个回合的入口：记录用户发言、清空输入缓冲，然后在后台
    /// 任务里解析补全请求。
    async fn start_turn(&mut self, prompt: String) {
        self.turn_index += 1;
        self.history.record(TurnRole::User, prompt.clone());
        self.send_update(SessionUpdate::TurnRecorded(TurnEntry {
            role: TurnRole::User,
            text: prompt.clone(),
        }))
        .await;
        self.send_update(SessionUpdate::InputCleared).await;

        let generation = self.flow.begin_request();
        self.emit_status().await;

        let completion = Arc::clone(&self.completion);
        let events = self.event_tx.clone();
        tokio::spawn(async move {
            let started = Instant::now();
            let result = completion.complete(&prompt).await;
            let latency = started.elapsed();
            let _ = events
                .send(FlowEvent::CompletionSettled {
                    generation,
                    latency,
                    result,
                })
                .await;
        });
    }

    async fn on_capture_settled(&mut self, generation: u64, outcome: CaptureOutcome) {
        if self.flow.activity() != ActivityState::Listening
            || !self.flow.is_current_capture(generation)
        {
            debug!(
                target: "turn_orchestrator",
                generation,
                "dropping stale capture result"
            );
            return;
        }
        self.active_capture = None;

        match outcome {
            CaptureOutcome::Transcript(text) if !text.trim().is_empty() => {
                debug!(
                    target: "turn_orchestrator",
                    chars = text.chars().count(),
                    "capture produced transcript"
                );
                self.start_turn(text.trim().to_string()).await;
            }
            CaptureOutcome::Transcript(_) | CaptureOutcome::NoSpeech => {
                debug!(
                    target: "turn_orchestrator",
                    "capture ended without usable speech"
                );
                self.settle_idle().await;
            }
            CaptureOutcome::Failed(message) => {
                warn!(target: "turn_orchestrator", %message, "capture failed");
                self.settle_idle().await;
            }
        }
    }

    async fn on_completion_settled(
        &mut self,
        generation: u64,
        latency: Duration,
        result: Result<String, RemoteError>,
    ) {
        if self.flow.activity() != ActivityState::AwaitingResponse
            || !self.flow.is_current_request(generation)
        {
            debug!(
                target: "turn_orchestrator",
                generation,
                "dropping stale completion result"
            );
            return;
        }

        match result {
            Ok(reply) => {
                self.history.record(TurnRole::Assistant, reply.clone());
                self.send_update(SessionUpdate::TurnRecorded(TurnEntry {
                    role: TurnRole::Assistant,
                    text: reply.clone(),
                }))
                .await;
                record_turn_completed(self.turn_index, latency, true);
                self.begin_utterance(reply.clone()).await;
                self.dispatch_side_channels(Some(reply));
            }
            Err(err) => {
                error!(target: "turn_orchestrator", %err, "completion request failed");
                let notice = format!("{COMPLETION_ERROR_PREFIX}{err}");
                self.history.record(TurnRole::Assistant, notice.clone());
                self.send_update(SessionUpdate::TurnRecorded(TurnEntry {
                    role: TurnRole::Assistant,
                    text: notice,
                }))
                .await;
                record_turn_completed(self.turn_index, latency, false);
                self.begin_utterance(FALLBACK_APOLOGY.to_string()).await;
                self.dispatch_side_channels(None);
            }
        }
    }

    async fn begin_utterance(&mut self, text: String) {
        let generation = self.flow.begin_utterance();
        self.emit_status().await;

        let output = Arc::clone(&self.speech_output);
        let events = self.event_tx.clone();
        tokio::spawn(async move {
            let outcome = output.speak(&text).await;
            if let SpokenOutcome::Failed(message) = &outcome {
                debug!(
                    target: "turn_orchestrator",
                    %message,
                    "utterance ended with error"
                );
            }
            let _ = events
                .send(FlowEvent::UtteranceSettled { generation })
                .await;
        });
    }

    async fn on_utterance_settled(&mut self, generation: u64) {
        if self.flow.activity() != ActivityState::Speaking
            || !self.flow.is_current_utterance(generation)
        {
            debug!(
                target: "turn_orchestrator",
                generation,
                "dropping stale utterance end"
            );
            return;
        }
        self.settle_idle().await;
    }

    /// 状态即刻回到待机，标签走防抖：纪元对得上且仍在待机时
    /// 才会真正发出。
    async fn settle_idle(&mut self) {
        let epoch = self.flow.settle_idle();
        let debounce = self.config.standby_debounce;
        let events = self.event_tx.clone();
        tokio::spawn(async move {
            sleep(debounce).await;
            let _ = events.send(FlowEvent::StandbyElapsed { epoch }).await;
        });
    }

    async fn on_standby_elapsed(&mut self, epoch: u64) {
        if !self.flow.standby_due(epoch) {
            return;
        }
        self.send_update(SessionUpdate::Status(StatusUpdate::for_state(
            ActivityState::Idle,
        )))
        .await;
    }

    /// 旁路派发：信息流只在补全成功时投稿，时间线要等投稿确认
    /// 成功才刷新；日志每回合都带全量历史快照。失败只记录，
    /// 不打扰会话。
    fn dispatch_side_channels(&self, feed_content: Option<String>) {
        let snapshot = self.history.snapshot();
        let turn_count = snapshot.len();

        if let Some(content) = feed_content {
            let feed = Arc::clone(&self.feed);
            let updates = self.updates_tx.clone();
            tokio::spawn(async move {
                match feed.publish(&content).await {
                    Ok(()) => {
                        record_side_channel("feed", turn_count, true, None);
                        match feed.list().await {
                            Ok(posts) => {
                                let _ = updates.send(SessionUpdate::Timeline(posts)).await;
                            }
                            Err(err) => {
                                warn!(
                                    target: "turn_orchestrator",
                                    %err,
                                    "timeline refresh failed"
                                );
                            }
                        }
                    }
                    Err(err) => {
                        warn!(target: "turn_orchestrator", %err, "feed publish failed");
                        record_side_channel("feed", turn_count, false, Some(err.to_string()));
                    }
                }
            });
        }

        let log = Arc::clone(&self.log);
        tokio::spawn(async move {
            match log.append(&snapshot).await {
                Ok(ack) => {
                    debug!(target: "turn_orchestrator", %ack, "history logged");
                    record_side_channel("log", turn_count, true, None);
                }
                Err(err) => {
                    warn!(target: "turn_orchestrator", %err, "history log failed");
                    record_side_channel("log", turn_count, false, Some(err.to_string()));
                }
            }
        });
    }

    /// 手动触发的日志发送。结果以瞬时消息回给前端，活动状态
    /// 保持原样。
    async fn flush_log(&mut self) {
        if self.history.is_empty() {
            self.send_update(SessionUpdate::Transient(EMPTY_HISTORY_MESSAGE.to_string()))
                .await;
            return;
        }

        let snapshot = self.history.snapshot();
        let turn_count = snapshot.len();
        let log = Arc::clone(&self.log);
        let updates = self.updates_tx.clone();
        tokio::spawn(async move {
            let message = match log.append(&snapshot).await {
                Ok(ack) => {
                    record_side_channel("log", turn_count, true, None);
                    format!("{LOG_FLUSH_ACK_PREFIX}{ack}")
                }
                Err(err) => {
                    warn!(target: "turn_orchestrator", %err, "manual log flush failed");
                    record_side_channel("log", turn_count, false, Some(err.to_string()));
                    format!("{LOG_FLUSH_ERROR_PREFIX}{err}")
                }
            };
            let _ = updates.send(SessionUpdate::Transient(message)).await;
        });
    }

    async fn emit_status(&self) {
        let status = StatusUpdate::for_state(self.flow.activity());
        self.send_update(SessionUpdate::Status(status)).await;
    }

    async fn send_update(&self, update: SessionUpdate) {
        if let Err(err) = self.updates_tx.send(update).await {
            warn!(
                target: "turn_orchestrator",
                %err,
                "failed to deliver session update"
            );
        }
    }
}

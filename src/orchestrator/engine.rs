use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::info;

use crate::orchestrator::config::{EndpointConfig, TurnSessionConfig};
use crate::orchestrator::runtime::{self, TurnSessionHandle};
use crate::orchestrator::traits::{CompletionClient, FeedClient, LogClient};
use crate::orchestrator::types::SessionUpdate;
use crate::remote::{HttpCompletionClient, HttpFeedClient, HttpLogClient};
use crate::speech::{RecognitionEngine, SpeechInput, SpeechOutput, SynthesisEngine};

pub struct TurnOrchestrator {
    completion: Arc<dyn CompletionClient>,
    log: Arc<dyn LogClient>,
    feed: Arc<dyn FeedClient>,
    recognition: Arc<dyn RecognitionEngine>,
    synthesis: Arc<dyn SynthesisEngine>,
}

impl TurnOrchestrator {
    /// 按端点配置构建三个 HTTP 客户端，语音引擎由宿主注入。
    pub fn new(
        endpoints: &EndpointConfig,
        defaults: &TurnSessionConfig,
        recognition: Arc<dyn RecognitionEngine>,
        synthesis: Arc<dyn SynthesisEngine>,
    ) -> Self {
        let completion = Arc::new(HttpCompletionClient::new(
            endpoints.completion_url.clone(),
            defaults.max_reply_length,
            defaults.request_timeout,
        ));
        let log = Arc::new(HttpLogClient::new(
            endpoints.log_url.clone(),
            endpoints.target_email.clone(),
            defaults.request_timeout,
        ));
        let feed = Arc::new(HttpFeedClient::new(
            endpoints.feed_url.clone(),
            defaults.request_timeout,
        ));
        Self::with_components(completion, log, feed, recognition, synthesis)
    }

    pub fn with_components(
        completion: Arc<dyn CompletionClient>,
        log: Arc<dyn LogClient>,
        feed: Arc<dyn FeedClient>,
        recognition: Arc<dyn RecognitionEngine>,
        synthesis: Arc<dyn SynthesisEngine>,
    ) -> Self {
        Self {
            completion,
            log,
            feed,
            recognition,
            synthesis,
        }
    }

    pub async fn warmup(&self) -> Result<()> {
        info!(
            target: "turn_orchestrator",
            capture_supported = self.recognition.is_supported(),
            "warming up session capabilities"
        );
        Ok(())
    }

    pub fn start_session(
        &self,
        config: TurnSessionConfig,
    ) -> (TurnSessionHandle, mpsc::Receiver<SessionUpdate>) {
        let speech_input = SpeechInput::new(Arc::clone(&self.recognition));
        let speech_output = Arc::new(SpeechOutput::new(
            Arc::clone(&self.synthesis),
            config.locale.clone(),
            config.preferred_voice.clone(),
        ));

        runtime::spawn_session(
            config,
            Arc::clone(&self.completion),
            Arc::clone(&self.log),
            Arc::clone(&self.feed),
            speech_input,
            speech_output,
        )
    }
}

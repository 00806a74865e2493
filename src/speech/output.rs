use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

use super::SpeechError;

const SIGNAL_BUFFER: usize = 4;

/// 合成引擎提供的嗓音描述。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceProfile {
    pub name: String,
    pub locale: String,
    pub is_default: bool,
}

/// 交给引擎的一次朗读请求。`voice` 为空时由引擎自选。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtteranceRequest {
    pub text: String,
    pub locale: String,
    pub voice: Option<String>,
}

/// 引擎回报的朗读信号。结束与错误可能重复到达。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UtteranceSignal {
    Finished,
    Errored(String),
}

/// 一次 `speak` 调用的收束结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpokenOutcome {
    Completed,
    Failed(String),
}

/// 宿主合成引擎的注入点。
pub trait SynthesisEngine: Send + Sync {
    fn voices(&self) -> Vec<VoiceProfile>;

    fn speak(
        &self,
        request: UtteranceRequest,
        signals: mpsc::Sender<UtteranceSignal>,
    ) -> Result<Box<dyn UtteranceControl>, SpeechError>;
}

/// 进行中朗读的控制面。
pub trait UtteranceControl: Send {
    fn cancel(&mut self);
}

/// 合成引擎之上的朗读适配器：最新请求抢占进行中的朗读，
/// 每次调用恰好收束一次。
pub struct SpeechOutput {
    engine: Arc<dyn SynthesisEngine>,
    locale: String,
    preferred_voice: Option<String>,
    sequence: AtomicU64,
    current: Mutex<Option<ActiveUtterance>>,
}

struct ActiveUtterance {
    id: u64,
    control: Box<dyn UtteranceControl>,
}

impl SpeechOutput {
    pub fn new(
        engine: Arc<dyn SynthesisEngine>,
        locale: impl Into<String>,
        preferred_voice: Option<String>,
    ) -> Self {
        Self {
            engine,
            locale: locale.into(),
            preferred_voice,
            sequence: AtomicU64::new(0),
            current: Mutex::new(None),
        }
    }

    /// 朗读一段文本。进行中的朗读先被取消，被抢占的调用仍会
    /// 收束；正常结束与错误对调用方是同一种收束。
    pub async fn speak(&self, text: &str) -> SpokenOutcome {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let (signal_tx, mut signal_rx) = mpsc::channel(SIGNAL_BUFFER);
        let request = UtteranceRequest {
            text: text.to_string(),
            locale: self.locale.clone(),
            voice: self.select_voice(),
        };

        {
            let mut current = self.current.lock().await;
            if let Some(mut previous) = current.take() {
                debug!(
                    target: "speech_output",
                    superseded = previous.id,
                    "preempting in-flight utterance"
                );
                previous.control.cancel();
            }
            match self.engine.speak(request, signal_tx) {
                Ok(control) => {
                    *current = Some(ActiveUtterance { id, control });
                }
                Err(err) => {
                    warn!(
                        target: "speech_output",
                        %err,
                        "synthesis engine rejected utterance"
                    );
                    return SpokenOutcome::Failed(err.to_string());
                }
            }
        }

        let outcome = match signal_rx.recv().await {
            Some(UtteranceSignal::Finished) => SpokenOutcome::Completed,
            Some(UtteranceSignal::Errored(message)) => SpokenOutcome::Failed(message),
            None => SpokenOutcome::Failed("synthesis channel closed".to_string()),
        };

        let mut current = self.current.lock().await;
        if current.as_ref().map(|active| active.id) == Some(id) {
            *current = None;
        }
        outcome
    }

    fn select_voice(&self) -> Option<String> {
        choose_voice(
            &self.engine.voices(),
            &self.locale,
            self.preferred_voice.as_deref(),
        )
    }
}

/// 嗓音挑选：同地区内指定名称精确命中优先，其次该地区的默认
/// 嗓音，再次任一同地区嗓音，否则交还引擎默认。
pub fn choose_voice(
    voices: &[VoiceProfile],
    locale: &str,
    preferred: Option<&str>,
) -> Option<String> {
    if let Some(name) = preferred {
        if let Some(voice) = voices
            .iter()
            .find(|voice| voice.locale == locale && voice.name == name)
        {
            return Some(voice.name.clone());
        }
    }
    if let Some(voice) = voices
        .iter()
        .find(|voice| voice.locale == locale && voice.is_default)
    {
        return Some(voice.name.clone());
    }
    voices
        .iter()
        .find(|voice| voice.locale == locale)
        .map(|voice| voice.name.clone())
}

/// 不出声的占位合成：收到请求立即回报完成。
pub struct SilentSynthesis;

struct NoopUtterance;

impl UtteranceControl for NoopUtterance {
    fn cancel(&mut self) {}
}

impl SynthesisEngine for SilentSynthesis {
    fn voices(&self) -> Vec<VoiceProfile> {
        Vec::new()
    }

    fn speak(
        &self,
        _request: UtteranceRequest,
        signals: mpsc::Sender<UtteranceSignal>,
    ) -> Result<Box<dyn UtteranceControl>, SpeechError> {
        let _ = signals.try_send(UtteranceSignal::Finished);
        Ok(Box::new(NoopUtterance))
    }
}

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use super::SpeechError;

const SIGNAL_BUFFER: usize = 8;

/// 识别引擎回报的原始信号。终结信号可能重复到达。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureSignal {
    Transcript(String),
    Error(String),
    Ended,
}

/// 一次激活的最终结局，恰好产生一次。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    Transcript(String),
    NoSpeech,
    Failed(String),
}

/// 宿主识别引擎的注入点。中间结果不上报，只回终结信号。
pub trait RecognitionEngine: Send + Sync {
    fn is_supported(&self) -> bool;

    /// 启动一次采集，信号经 `signals` 回报。
    fn start(
        &self,
        signals: mpsc::Sender<CaptureSignal>,
    ) -> Result<Box<dyn CaptureControl>, SpeechError>;
}

/// 采集过程的控制面。`stop` 之后结局仍走正常通道收束。
pub trait CaptureControl: Send + Sync {
    fn stop(&mut self);
}

/// 一次采集会话：控制面加恰好一次的结局通道。
pub struct CaptureSession {
    pub control: Box<dyn CaptureControl>,
    pub settled: oneshot::Receiver<CaptureOutcome>,
}

/// 识别引擎之上的采集适配器。
pub struct SpeechInput {
    engine: Arc<dyn RecognitionEngine>,
}

impl SpeechInput {
    pub fn new(engine: Arc<dyn RecognitionEngine>) -> Self {
        Self { engine }
    }

    pub fn is_supported(&self) -> bool {
        self.engine.is_supported()
    }

    /// 激活一次采集。第一个终结信号决定结局，后续重复信号
    /// 丢弃；信号通道无声关闭按无语音收束。
    pub fn activate(&self) -> Result<CaptureSession, SpeechError> {
        if !self.engine.is_supported() {
            return Err(SpeechError::Unsupported);
        }

        let (signal_tx, mut signal_rx) = mpsc::channel(SIGNAL_BUFFER);
        let control = self.engine.start(signal_tx)?;
        let (outcome_tx, settled) = oneshot::channel();

        tokio::spawn(async move {
            let mut outcome_tx = Some(outcome_tx);
            while let Some(signal) = signal_rx.recv().await {
                let outcome = match signal {
                    CaptureSignal::Transcript(text) => CaptureOutcome::Transcript(text),
                    CaptureSignal::Error(message) => CaptureOutcome::Failed(message),
                    CaptureSignal::Ended => CaptureOutcome::NoSpeech,
                };
                match outcome_tx.take() {
                    Some(tx) => {
                        let _ = tx.send(outcome);
                    }
                    None => {
                        debug!(
                            target: "speech_input",
                            "dropping duplicate capture termination"
                        );
                    }
                }
            }
            if let Some(tx) = outcome_tx.take() {
                let _ = tx.send(CaptureOutcome::NoSpeech);
            }
        });

        Ok(CaptureSession { control, settled })
    }
}

/// 无语音栈宿主的占位引擎：激活总是快速失败。
// TODO: 接入平台原生识别（macOS Speech / Windows SAPI）后替换。
pub struct UnavailableRecognition;

impl RecognitionEngine for UnavailableRecognition {
    fn is_supported(&self) -> bool {
        false
    }

    fn start(
        &self,
        _signals: mpsc::Sender<CaptureSignal>,
    ) -> Result<Box<dyn CaptureControl>, SpeechError> {
        Err(SpeechError::Unsupported)
    }
}

//! 注入式语音能力适配层。
//!
//! 宿主的识别 / 合成引擎以 trait 注入；适配器负责把引擎的
//! 原始信号整理成编排器依赖的恰好一次语义。

mod input;
mod output;

pub use input::{
    CaptureControl, CaptureOutcome, CaptureSession, CaptureSignal, RecognitionEngine, SpeechInput,
    UnavailableRecognition,
};
pub use output::{
    choose_voice, SilentSynthesis, SpeechOutput, SpokenOutcome, SynthesisEngine, UtteranceControl,
    UtteranceRequest, UtteranceSignal, VoiceProfile,
};

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SpeechError {
    #[error("speech capability unavailable on this host")]
    Unsupported,
    #[error("speech engine failure: {message}")]
    Engine { message: String },
}

impl SpeechError {
    pub fn engine(message: impl Into<String>) -> Self {
        SpeechError::Engine {
            message: message.into(),
        }
    }
}

use serde::{Deserialize, Serialize};

use crate::conversation::TurnRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityState {
    Idle,
    Listening,
    AwaitingResponse,
    Speaking,
}

impl ActivityState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityState::Idle => "idle",
            ActivityState::Listening => "listening",
            ActivityState::AwaitingResponse => "awaiting_response",
            ActivityState::Speaking => "speaking",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ActivityState::Idle => "スタンバイ中",
            ActivityState::Listening => "リスニング中",
            ActivityState::AwaitingResponse => "応答を生成中",
            ActivityState::Speaking => "発話中",
        }
    }

    pub fn is_listening(&self) -> bool {
        matches!(self, ActivityState::Listening)
    }
}

#[derive(Debug, Clone)]
pub enum SessionCommand {
    Activate,
    SubmitText(String),
    FlushLog,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub state: ActivityState,
    pub label: &'static str,
    pub listening: bool,
}

impl StatusUpdate {
    pub(crate) fn for_state(state: ActivityState) -> Self {
        Self {
            state,
            label: state.label(),
            listening: state.is_listening(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnEntry {
    pub role: TurnRole,
    pub text: String,
}

/// 信息流里的一条投稿，按服务端返回的原始顺序承载。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedPost {
    pub content: String,
    #[serde(default)]
    pub date: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    Status(StatusUpdate),
    TurnRecorded(TurnEntry),
    InputCleared,
    Transient(String),
    Timeline(Vec<FeedPost>),
}

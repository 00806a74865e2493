//! 会话历史数据模型。

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// 回合的发言方。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
        }
    }
}

/// 单个会话回合。时间戳为 Unix 秒，保留小数部分。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    #[serde(rename = "content")]
    pub text: String,
    pub timestamp: f64,
}

/// 仅追加的会话历史。由编排器独占持有，不做本地持久化。
#[derive(Debug, Default)]
pub struct ConversationHistory {
    turns: Vec<Turn>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self { turns: Vec::new() }
    }

    /// 追加一个回合并返回其引用。时间戳不会早于上一条记录。
    pub fn record(&mut self, role: TurnRole, text: impl Into<String>) -> &Turn {
        let mut timestamp = unix_timestamp();
        if let Some(last) = self.turns.last() {
            if timestamp < last.timestamp {
                timestamp = last.timestamp;
            }
        }
        let index = self.turns.len();
        self.turns.push(Turn {
            role,
            text: text.into(),
            timestamp,
        });
        &self.turns[index]
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// 为旁路通道准备的全量拷贝。
    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.clone()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

fn unix_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs_f64())
        .unwrap_or(0.0)
}

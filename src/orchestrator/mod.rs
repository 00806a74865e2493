//! 会话回合编排服务脚手架。

mod constants;
mod engine;
mod runtime;

pub mod config;
pub mod traits;
pub mod types;

pub use config::{EndpointConfig, TurnSessionConfig};
pub use engine::TurnOrchestrator;
pub use runtime::TurnSessionHandle;
pub use traits::{CompletionClient, FeedClient, LogClient};
pub use types::{
    ActivityState, FeedPost, SessionCommand, SessionUpdate, StatusUpdate, TurnEntry,
};

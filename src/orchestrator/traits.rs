use async_trait::async_trait;

use crate::conversation::Turn;
use crate::orchestrator::types::FeedPost;
use crate::remote::RemoteError;

#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, RemoteError>;
}

#[async_trait]
pub trait LogClient: Send + Sync {
    async fn append(&self, history: &[Turn]) -> Result<String, RemoteError>;
}

#[async_trait]
pub trait FeedClient: Send + Sync {
    async fn publish(&self, content: &str) -> Result<(), RemoteError>;

    async fn list(&self) -> Result<Vec<FeedPost>, RemoteError>;
}

use crate::config::RouterConfig;
use crate::error::Result;
use crate::types::Topic;
use async_trait::async_trait;

/// Ordered byte stream of one topic.
#[async_trait]
pub trait TopicStream: Send {
    /// Wait for the next raw message.
    ///
    /// Returns `Ok(None)` once the stream has ended and will yield nothing
    /// more.
    async fn next_message(&mut self) -> Result<Option<Vec<u8>>>;

    /// Release the stream's resources.
    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Supplier of per-topic streams.
#[async_trait]
pub trait StreamSource: Send + Sync {
    /// Open the stream for `topic`, honoring the configured prefix and start
    /// position.
    async fn open(&self, topic: Topic, config: &RouterConfig) -> Result<Box<dyn TopicStream>>;
}

use async_trait::async_trait;
use parking_lot::Mutex;
use procmon_core::{
    ProcmonError, Result, RouterConfig, StartPosition, StreamSource, Topic, TopicStream,
};
use std::collections::HashMap;
use tokio::sync::mpsc;

struct Channel {
    /// The source never keeps a strong sender, so dropping the producers'
    /// senders ends the stream.
    weak_tx: mpsc::WeakSender<Vec<u8>>,
    rx: Option<mpsc::Receiver<Vec<u8>>>,
}

/// In-process stream source backed by capacity-1 channels.
///
/// Producers obtain a sender per topic with [`sender`](Self::sender) before
/// the router opens the topic. A slow worker stalls only its own producers.
///
/// With [`StartPosition::Latest`], opening discards what is buffered in the
/// channel at that moment. A producer already suspended in `send` on the full
/// channel completes afterwards, and its message is delivered as new.
///
/// # Example
///
/// ```
/// use procmon::stream::ChannelSource;
/// use procmon_core::Topic;
///
/// let source = ChannelSource::new();
/// let jobs = source.sender(Topic::Job).unwrap();
/// assert!(!jobs.is_closed());
/// ```
#[derive(Default)]
pub struct ChannelSource {
    channels: Mutex<HashMap<Topic, Channel>>,
}

impl ChannelSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Producer half of the topic's channel, created on first use.
    ///
    /// Fails once every earlier sender of the topic was dropped, since the
    /// stream has ended by then.
    pub fn sender(&self, topic: Topic) -> Result<mpsc::Sender<Vec<u8>>> {
        let mut channels = self.channels.lock();

        if let Some(channel) = channels.get(&topic) {
            return channel.weak_tx.upgrade().ok_or_else(|| {
                ProcmonError::Stream(format!("channel for topic '{}' is closed", topic))
            });
        }

        let (tx, rx) = mpsc::channel(1);
        channels.insert(
            topic,
            Channel {
                weak_tx: tx.downgrade(),
                rx: Some(rx),
            },
        );
        Ok(tx)
    }
}

#[async_trait]
impl StreamSource for ChannelSource {
    async fn open(&self, topic: Topic, config: &RouterConfig) -> Result<Box<dyn TopicStream>> {
        let mut rx = self
            .channels
            .lock()
            .get_mut(&topic)
            .and_then(|channel| channel.rx.take())
            .ok_or_else(|| {
                ProcmonError::Stream(format!(
                    "no unopened channel for topic '{}'; create a sender first",
                    topic
                ))
            })?;

        if config.start_position == StartPosition::Latest {
            let mut skipped = 0usize;
            while rx.try_recv().is_ok() {
                skipped += 1;
            }
            if skipped > 0 {
                tracing::debug!(topic = topic.name(), skipped, "Skipped buffered messages");
            }
        }

        Ok(Box::new(ChannelStream { rx }))
    }
}

struct ChannelStream {
    rx: mpsc::Receiver<Vec<u8>>,
}

#[async_trait]
impl TopicStream for ChannelStream {
    async fn next_message(&mut self) -> Result<Option<Vec<u8>>> {
        Ok(self.rx.recv().await)
    }

    async fn close(&mut self) -> Result<()> {
        self.rx.close();
        Ok(())
    }
}

use crate::types::Topic;
use serde::{Deserialize, Serialize};

/// Where a topic stream starts reading when the router starts.
///
/// No consumer offsets are persisted, so a restart never resumes from the
/// last processed message. `Latest` skips whatever the stream already holds
/// and projects only messages that arrive afterwards; `Earliest` re-reads the
/// stream from its beginning.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StartPosition {
    Earliest,
    #[default]
    Latest,
}

impl std::str::FromStr for StartPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "earliest" => Ok(StartPosition::Earliest),
            "latest" => Ok(StartPosition::Latest),
            other => Err(format!(
                "unknown start position '{}', expected 'earliest' or 'latest'",
                other
            )),
        }
    }
}

/// Configuration for the topic router
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Topics to subscribe to, one worker each
    /// Default: all six projected topics
    #[serde(default = "default_topics")]
    pub topics: Vec<Topic>,

    /// Prefix prepended to every topic name when opening streams
    /// Default: "" (none)
    #[serde(default)]
    pub topic_prefix: String,

    /// Start position for every stream
    #[serde(default)]
    pub start_position: StartPosition,

    /// Poll interval for sources that tail (milliseconds)
    /// Default: 100ms
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_topics() -> Vec<Topic> {
    Topic::ALL.to_vec()
}

fn default_poll_interval_ms() -> u64 {
    100
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            topics: default_topics(),
            topic_prefix: String::new(),
            start_position: StartPosition::default(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl RouterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_topics(mut self, topics: impl IntoIterator<Item = Topic>) -> Self {
        self.topics = topics.into_iter().collect();
        self
    }

    pub fn with_topic_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.topic_prefix = prefix.into();
        self
    }

    pub fn with_start_position(mut self, position: StartPosition) -> Self {
        self.start_position = position;
        self
    }

    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Stream name for a topic, including the configured prefix.
    pub fn stream_name(&self, topic: Topic) -> String {
        format!("{}{}", self.topic_prefix, topic.name())
    }
}

//! Stream sources shipped with procmon.
//!
//! - [`ChannelSource`]: in-process channels, for embedding and tests
//! - [`FileSource`]: one NDJSON file per topic, tailed as it grows

pub mod channel;
pub mod file;

pub use channel::ChannelSource;
pub use file::FileSource;

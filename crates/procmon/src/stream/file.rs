use async_trait::async_trait;
use procmon_core::{Result, RouterConfig, StartPosition, StreamSource, Topic, TopicStream};
use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncSeekExt, BufReader};

/// Stream source reading one NDJSON file per topic.
///
/// The file of a topic is `<dir>/<prefix><topic>.ndjson`, one envelope per
/// line. Files are tailed: at end of file the stream waits
/// `poll_interval_ms` and reads again, so the stream only ends when closed.
/// A missing file is waited for the same way.
#[derive(Debug, Clone)]
pub struct FileSource {
    dir: PathBuf,
}

impl FileSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn topic_path(&self, topic: Topic, config: &RouterConfig) -> PathBuf {
        self.dir.join(format!("{}.ndjson", config.stream_name(topic)))
    }
}

#[async_trait]
impl StreamSource for FileSource {
    async fn open(&self, topic: Topic, config: &RouterConfig) -> Result<Box<dyn TopicStream>> {
        let path = self.topic_path(topic, config);
        let mut stream = FileStream {
            path,
            reader: None,
            line: Vec::new(),
            discard_first_line: false,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        };

        // Content written after this point is new; a file created later is
        // read from its start.
        match File::open(&stream.path).await {
            Ok(file) => stream.attach(file, config.start_position).await?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %stream.path.display(), "Topic file not found yet, waiting");
            }
            Err(e) => return Err(e.into()),
        }

        tracing::debug!(
            topic = topic.name(),
            path = %stream.path.display(),
            start_position = ?config.start_position,
            "Opened topic file"
        );
        Ok(Box::new(stream))
    }
}

struct FileStream {
    path: PathBuf,
    reader: Option<BufReader<File>>,
    /// Bytes of the line being read; kept across calls until its newline
    /// arrives.
    line: Vec<u8>,
    /// Set when a `Latest` start lands in the middle of a line.
    discard_first_line: bool,
    poll_interval: Duration,
}

impl FileStream {
    async fn attach(&mut self, mut file: File, start: StartPosition) -> Result<()> {
        if start == StartPosition::Latest {
            let len = file.seek(SeekFrom::End(0)).await?;
            if len > 0 {
                file.seek(SeekFrom::Start(len - 1)).await?;
                let mut last = [0u8; 1];
                file.read_exact(&mut last).await?;
                self.discard_first_line = last[0] != b'\n';
            }
        }
        self.reader = Some(BufReader::new(file));
        Ok(())
    }
}

#[async_trait]
impl TopicStream for FileStream {
    async fn next_message(&mut self) -> Result<Option<Vec<u8>>> {
        loop {
            let Some(reader) = self.reader.as_mut() else {
                match File::open(&self.path).await {
                    Ok(file) => {
                        self.reader = Some(BufReader::new(file));
                        continue;
                    }
                    Err(e) if e.kind() == ErrorKind::NotFound => {
                        tokio::time::sleep(self.poll_interval).await;
                        continue;
                    }
                    Err(e) => return Err(e.into()),
                }
            };

            // Partial reads stay in `self.line`, so an interrupted call
            // resumes where it left off.
            reader.read_until(b'\n', &mut self.line).await?;
            if self.line.last() != Some(&b'\n') {
                tokio::time::sleep(self.poll_interval).await;
                continue;
            }

            let mut line = std::mem::take(&mut self.line);
            if self.discard_first_line {
                self.discard_first_line = false;
                continue;
            }

            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            return Ok(Some(line));
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.reader = None;
        self.line.clear();
        Ok(())
    }
}

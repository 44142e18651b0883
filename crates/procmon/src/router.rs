//! Topic router: one worker task per subscribed topic
//!
//! Each worker reads its topic stream in order, decodes every message into a
//! [`Record`] and hands it to the [`Dispatcher`]. Records within a topic are
//! applied strictly one after another; topics run independently of each
//! other. Decode and dispatch failures are logged and counted, never fatal.

use procmon_core::{
    observe, ProcmonError, Record, Result, RouterConfig, StreamSource, Topic, TopicStream,
};
use procmon_projector::Dispatcher;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Counters of one topic worker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// Raw messages read from the stream
    pub received: u64,
    /// Messages dropped because the envelope did not decode
    pub decode_failures: u64,
    /// Records the dispatcher accepted (including skipped ones)
    pub applied: u64,
    /// Records whose dispatch returned an error
    pub dispatch_failures: u64,
}

impl WorkerStats {
    fn merge(&mut self, other: &WorkerStats) {
        self.received += other.received;
        self.decode_failures += other.decode_failures;
        self.applied += other.applied;
        self.dispatch_failures += other.dispatch_failures;
    }
}

/// Final statistics of a router run, per topic.
#[derive(Debug, Clone, Default)]
pub struct RouterStats {
    pub topics: HashMap<Topic, WorkerStats>,
}

impl RouterStats {
    pub fn get(&self, topic: Topic) -> WorkerStats {
        self.topics.get(&topic).copied().unwrap_or_default()
    }

    pub fn total(&self) -> WorkerStats {
        let mut total = WorkerStats::default();
        for stats in self.topics.values() {
            total.merge(stats);
        }
        total
    }
}

/// Handle for shutting down a running router
#[derive(Clone)]
pub struct ShutdownHandle {
    shutdown_tx: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    /// Signal every worker to stop at its next loop iteration
    pub fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
    }

    pub fn is_shutdown(&self) -> bool {
        *self.shutdown_tx.borrow()
    }
}

/// A running set of topic workers.
///
/// Dropping the router without calling [`join`](Self::join) also stops the
/// workers, since the shutdown channel closes with it.
pub struct TopicRouter {
    shutdown_tx: Arc<watch::Sender<bool>>,
    workers: Vec<(Topic, JoinHandle<WorkerStats>)>,
}

impl TopicRouter {
    /// Open one stream per configured topic and spawn its worker.
    ///
    /// Every stream is opened before this returns, so the start position of
    /// each topic is fixed at call time. If any stream fails to open, the
    /// workers already spawned are stopped and the error is returned.
    pub async fn start(
        source: Arc<dyn StreamSource>,
        dispatcher: Arc<Dispatcher>,
        config: &RouterConfig,
    ) -> Result<Self> {
        if config.topics.is_empty() {
            return Err(ProcmonError::Config("no topics to subscribe to".into()));
        }

        let (shutdown_tx, _) = watch::channel(false);
        let mut router = Self {
            shutdown_tx: Arc::new(shutdown_tx),
            workers: Vec::with_capacity(config.topics.len()),
        };

        for &topic in &config.topics {
            if router.workers.iter().any(|(t, _)| *t == topic) {
                tracing::warn!(topic = topic.name(), "Topic listed twice, ignoring duplicate");
                continue;
            }

            let stream = match source.open(topic, config).await {
                Ok(stream) => stream,
                Err(e) => {
                    tracing::error!(
                        topic = topic.name(),
                        stream = %config.stream_name(topic),
                        error = %e,
                        "Failed to open topic stream"
                    );
                    router.shutdown();
                    return Err(e);
                }
            };

            let handle = tokio::spawn(run_worker(
                topic,
                stream,
                dispatcher.clone(),
                router.shutdown_tx.subscribe(),
            ));
            router.workers.push((topic, handle));
        }

        tracing::info!(
            topics = router.workers.len(),
            start_position = ?config.start_position,
            "Topic router started"
        );
        Ok(router)
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            shutdown_tx: self.shutdown_tx.clone(),
        }
    }

    /// Signal every worker to stop. Buffered messages are not drained.
    pub fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
    }

    pub fn topics(&self) -> Vec<Topic> {
        self.workers.iter().map(|(t, _)| *t).collect()
    }

    /// Wait until every worker has exited.
    ///
    /// Workers exit on shutdown or when their stream ends. A worker that
    /// panicked is reported as an error after all others were joined.
    pub async fn join(self) -> Result<RouterStats> {
        let mut stats = RouterStats::default();
        let mut errors = Vec::new();

        for (topic, handle) in self.workers {
            match handle.await {
                Ok(worker_stats) => {
                    stats.topics.insert(topic, worker_stats);
                }
                Err(e) => {
                    tracing::error!(topic = topic.name(), error = %e, "Topic worker failed");
                    errors.push(ProcmonError::Other(anyhow::anyhow!(
                        "worker for topic '{}' failed: {}",
                        topic,
                        e
                    )));
                }
            }
        }

        ProcmonError::aggregate(errors)?;
        Ok(stats)
    }

    /// Signal shutdown, then wait for every worker.
    pub async fn shutdown_and_join(self) -> Result<RouterStats> {
        self.shutdown();
        self.join().await
    }
}

async fn run_worker(
    topic: Topic,
    mut stream: Box<dyn TopicStream>,
    dispatcher: Arc<Dispatcher>,
    mut shutdown: watch::Receiver<bool>,
) -> WorkerStats {
    let name = topic.name();
    let mut stats = WorkerStats::default();

    tracing::info!(topic = name, "Topic worker started");

    loop {
        if *shutdown.borrow_and_update() {
            break;
        }

        let next = tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            next = stream.next_message() => next,
        };

        let bytes = match next {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                tracing::info!(topic = name, "Topic stream ended");
                break;
            }
            Err(e) => {
                tracing::error!(topic = name, error = %e, "Topic stream failed");
                break;
            }
        };

        stats.received += 1;
        observe::record_received(name);

        let record = match Record::decode(&bytes) {
            Ok(record) => record,
            Err(e) => {
                stats.decode_failures += 1;
                observe::record_decode_failure(name);
                tracing::warn!(topic = name, error = %e, "Dropping undecodable message");
                continue;
            }
        };

        let intent = record.intent.clone();
        let (key, position) = (record.key, record.position);
        let started = Instant::now();

        // The store is synchronous; awaiting here keeps the topic in order.
        let worker_dispatcher = dispatcher.clone();
        let result =
            match tokio::task::spawn_blocking(move || worker_dispatcher.dispatch(name, &record))
                .await
            {
                Ok(result) => result,
                Err(e) => Err(ProcmonError::Other(anyhow::anyhow!(
                    "dispatch task failed: {}",
                    e
                ))),
            };

        observe::record_dispatch(name, started.elapsed(), result.is_ok());

        match result {
            Ok(()) => stats.applied += 1,
            Err(e) => {
                stats.dispatch_failures += 1;
                tracing::error!(
                    topic = name,
                    intent = %intent,
                    key,
                    position,
                    error = %e,
                    "Failed to apply record"
                );
            }
        }
    }

    if let Err(e) = stream.close().await {
        tracing::warn!(topic = name, error = %e, "Failed to close topic stream");
    }

    tracing::info!(
        topic = name,
        received = stats.received,
        applied = stats.applied,
        decode_failures = stats.decode_failures,
        dispatch_failures = stats.dispatch_failures,
        "Topic worker stopped"
    );
    stats
}

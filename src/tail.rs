//! Live message tail for one topic's detail view. Samples a handful of
//! partitions at random, runs one forwarder task per partition and merges
//! everything into a single bounded event stream. Failing to open the tail
//! at all is the one error a view surfaces to the operator; a single
//! partition that cannot attach becomes an error event in the stream
//! while the other partitions keep flowing.

use std::sync::Arc;
use std::time::Duration;

use rand::seq::SliceRandom;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};

use crate::config::TailConfig;
use crate::error::{ProviderError, Result};
use crate::monitor::sample::with_deadline;
use crate::provider::{MetadataProvider, PartitionId, TailRecord};

/// One entry in the merged tail stream.
#[derive(Debug, Clone)]
pub enum TailEvent {
    Record(TailRecord),
    /// A partition the tail could not attach to. The rest of the stream
    /// is unaffected.
    PartitionError {
        partition: PartitionId,
        error: ProviderError,
    },
}

pub struct MessageTail {
    topic: String,
    partitions: Vec<PartitionId>,
    cancel: CancellationToken,
    tracker: TaskTracker,
}

impl MessageTail {
    /// Opens a tail on up to `max_partitions` randomly chosen partitions
    /// of `topic`. Fails outright when the partition listing itself cannot
    /// be fetched, since there is nothing to show the operator then.
    pub async fn open(
        provider: Arc<dyn MetadataProvider>,
        topic: impl Into<String>,
        config: &TailConfig,
    ) -> Result<(Self, mpsc::Receiver<TailEvent>)> {
        let topic = topic.into();
        let open_timeout = Duration::from_millis(config.open_timeout_ms);
        let mut partitions = with_deadline(open_timeout, provider.list_partitions(&topic)).await?;
        let total = partitions.len();
        partitions.shuffle(&mut rand::thread_rng());
        partitions.truncate(config.max_partitions);
        // Stable order for display once the random pick is made.
        partitions.sort_unstable();

        let (events, receiver) = mpsc::channel(config.channel_capacity);
        let cancel = CancellationToken::new();
        let tracker = TaskTracker::new();
        for &partition in &partitions {
            // Attach before returning, so records published after open()
            // are guaranteed to reach the stream.
            match with_deadline(open_timeout, provider.stream_partition(&topic, partition)).await {
                Ok(feed) => {
                    tracker.spawn(forward(feed, events.clone(), cancel.clone()));
                }
                Err(error) => {
                    warn!("[MessageTail] {topic}/{partition}: cannot attach: {error}");
                    // open() still holds the receiver, so a full buffer must
                    // drop the event rather than block on it.
                    let _ = events.try_send(TailEvent::PartitionError { partition, error });
                }
            }
        }
        tracker.close();
        info!(
            "[MessageTail] tailing '{topic}' on {} of {total} partitions",
            partitions.len()
        );

        let tail = Self {
            topic,
            partitions,
            cancel,
            tracker,
        };
        Ok((tail, receiver))
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// The randomly sampled partitions this tail covers.
    pub fn partitions(&self) -> &[PartitionId] {
        &self.partitions
    }

    /// Cancels every forwarder and waits for all of them to finish, so no
    /// subscription outlives the view.
    pub async fn stop(self) {
        self.cancel.cancel();
        self.tracker.wait().await;
        info!("[MessageTail] stopped tailing '{}'", self.topic);
    }
}

async fn forward(
    mut feed: mpsc::Receiver<TailRecord>,
    events: mpsc::Sender<TailEvent>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            // A dropped receiver must wind the tail down even when no
            // traffic flows, so the drop is watched for, not inferred
            // from a failed send.
            _ = events.closed() => break,
            record = feed.recv() => {
                let Some(record) = record else {
                    // Provider closed the feed.
                    break;
                };
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    sent = events.send(TailEvent::Record(record)) => {
                        if sent.is_err() {
                            // Receiver gone: the view closed without stop().
                            break;
                        }
                    }
                }
            }
        }
    }
}

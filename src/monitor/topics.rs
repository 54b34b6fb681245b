//! Topic view refresh loop: lists topics, fetches the visible and the
//! never-fetched ones, derives metrics and publishes ordered snapshots.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::MonitorConfig;
use crate::models::TopicState;
use crate::monitor::metrics;
use crate::monitor::policy::should_fetch;
use crate::monitor::sample::{self, with_deadline};
use crate::monitor::{MonitorHandle, SharedView};
use crate::provider::MetadataProvider;

pub struct TopicMonitor;

impl TopicMonitor {
    /// Spawns the refresh loop for the topics view. Returns the steering
    /// handle and the single-slot snapshot channel; the loop suspends on
    /// publish until the consumer has taken the previous snapshot.
    pub fn spawn(
        provider: Arc<dyn MetadataProvider>,
        config: MonitorConfig,
    ) -> (MonitorHandle<TopicState>, mpsc::Receiver<Vec<TopicState>>) {
        let shared = Arc::new(SharedView::new());
        let cancel = CancellationToken::new();
        let (updates, snapshots) = mpsc::channel(1);
        let task = tokio::spawn(run(
            provider,
            config,
            Arc::clone(&shared),
            updates,
            cancel.clone(),
        ));
        let handle = MonitorHandle {
            label: "TopicMonitor",
            shared,
            cancel,
            task,
        };
        (handle, snapshots)
    }
}

async fn run(
    provider: Arc<dyn MetadataProvider>,
    config: MonitorConfig,
    shared: Arc<SharedView<TopicState>>,
    updates: mpsc::Sender<Vec<TopicState>>,
    cancel: CancellationToken,
) {
    let tick = Duration::from_millis(config.topic_tick_ms);
    let fetch_timeout = Duration::from_millis(config.fetch_timeout_ms);
    // First tick fires one full period after start, like the rest.
    let mut timer = time::interval_at(time::Instant::now() + tick, tick);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!("[TopicMonitor] started, polling every {tick:?}");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = timer.tick() => {}
        }

        let mut listing = match with_deadline(fetch_timeout, provider.list_topic_names()).await {
            Ok(names) => names,
            Err(err) => {
                warn!("[TopicMonitor] topic listing failed, keeping last snapshot: {err}");
                continue;
            }
        };
        listing.sort();

        // Plan the cycle under a short lock: which rows get a full fetch,
        // and the counter baseline for each.
        let (filter, targets) = {
            let controls = shared.controls.lock().clone();
            let mut state = shared.state.lock();
            let mut targets = Vec::new();
            for (row, name) in listing.iter().enumerate() {
                let fetched_before = state
                    .cache
                    .get(name)
                    .map(|topic| topic.last_refresh.is_some())
                    .unwrap_or(false);
                if state.cache.get(name).is_none() {
                    // Surface the name right away; details land this cycle.
                    state.cache.upsert(TopicState::unfetched(name.clone()));
                }
                if should_fetch(row, controls.viewport, fetched_before) {
                    targets.push((name.clone(), state.cache.previous_counter(name)));
                }
            }
            (controls.filter, targets)
        };

        // Sampling happens with no lock held.
        let mut fetched = Vec::with_capacity(targets.len());
        for (name, previous) in targets {
            match sample::sample_topic(provider.as_ref(), &name, fetch_timeout).await {
                Ok(topic) => fetched.push((name, previous, topic)),
                Err(err) => {
                    debug!("[TopicMonitor] {name}: fetch failed, carrying forward: {err}")
                }
            }
        }
        debug!(
            "[TopicMonitor] cycle done: {} listed, {} freshly fetched",
            listing.len(),
            fetched.len()
        );

        let snapshot = {
            let mut state = shared.state.lock();
            let now = Utc::now();
            for (name, previous, topic) in fetched {
                let throughput = metrics::throughput(previous, topic.total_messages, tick);
                state.cache.set_previous_counter(&name, topic.total_messages);
                state.cache.upsert(TopicState {
                    name,
                    partitions: topic.partitions,
                    replicas: topic.replicas,
                    total_messages: topic.total_messages,
                    health: topic.health,
                    throughput,
                    last_refresh: Some(now),
                });
            }
            state.surfaced = listing;
            state.snapshot(&filter)
        };

        tokio::select! {
            _ = cancel.cancelled() => break,
            sent = updates.send(snapshot) => {
                if sent.is_err() {
                    info!("[TopicMonitor] snapshot consumer dropped, stopping");
                    break;
                }
            }
        }
    }
    info!("[TopicMonitor] stopped");
}

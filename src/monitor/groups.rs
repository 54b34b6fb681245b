//! Consumer group refresh loop for one topic's detail view. Same cycle
//! shape as the topics loop, but a group is only surfaced while at least
//! one of its members subscribes to the viewed topic.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::MonitorConfig;
use crate::models::ConsumerGroupState;
use crate::monitor::policy::should_fetch;
use crate::monitor::sample::{self, with_deadline, GroupSample};
use crate::monitor::{MonitorHandle, SharedView};
use crate::provider::MetadataProvider;

pub struct GroupMonitor;

impl GroupMonitor {
    /// Spawns the refresh loop watching consumer groups of `topic`. The
    /// first cycle runs immediately so the detail view fills on open.
    pub fn spawn(
        provider: Arc<dyn MetadataProvider>,
        topic: impl Into<String>,
        config: MonitorConfig,
    ) -> (
        MonitorHandle<ConsumerGroupState>,
        mpsc::Receiver<Vec<ConsumerGroupState>>,
    ) {
        let shared = Arc::new(SharedView::new());
        let cancel = CancellationToken::new();
        let (updates, snapshots) = mpsc::channel(1);
        let task = tokio::spawn(run(
            provider,
            topic.into(),
            config,
            Arc::clone(&shared),
            updates,
            cancel.clone(),
        ));
        let handle = MonitorHandle {
            label: "GroupMonitor",
            shared,
            cancel,
            task,
        };
        (handle, snapshots)
    }
}

async fn run(
    provider: Arc<dyn MetadataProvider>,
    topic: String,
    config: MonitorConfig,
    shared: Arc<SharedView<ConsumerGroupState>>,
    updates: mpsc::Sender<Vec<ConsumerGroupState>>,
    cancel: CancellationToken,
) {
    let tick = Duration::from_millis(config.group_tick_ms);
    let fetch_timeout = Duration::from_millis(config.fetch_timeout_ms);
    let mut timer = time::interval(tick);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!("[GroupMonitor] started for '{topic}', polling every {tick:?}");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = timer.tick() => {}
        }

        let mut listing =
            match with_deadline(fetch_timeout, provider.list_consumer_group_ids()).await {
                Ok(ids) => ids,
                Err(err) => {
                    warn!("[GroupMonitor] group listing failed, keeping last snapshot: {err}");
                    continue;
                }
            };
        listing.sort();

        let (filter, targets) = {
            let controls = shared.controls.lock().clone();
            let state = shared.state.lock();
            let targets: Vec<String> = listing
                .iter()
                .enumerate()
                .filter(|(row, id)| {
                    let fetched_before = state
                        .cache
                        .get(id)
                        .map(|group| group.last_refresh.is_some())
                        .unwrap_or(false);
                    should_fetch(*row, controls.viewport, fetched_before)
                })
                .map(|(_, id)| id.clone())
                .collect();
            (controls.filter, targets)
        };

        // Successful describes only; a failed fetch falls back to
        // carry-forward exactly like a policy skip.
        let mut outcomes: HashMap<String, Option<GroupSample>> = HashMap::new();
        for id in targets {
            match sample::sample_group(
                provider.as_ref(),
                &id,
                &topic,
                fetch_timeout,
                config.lag_alert_threshold,
            )
            .await
            {
                Ok(outcome) => {
                    outcomes.insert(id, outcome);
                }
                Err(err) => debug!("[GroupMonitor] {id}: fetch failed, carrying forward: {err}"),
            }
        }
        debug!(
            "[GroupMonitor] cycle done: {} listed, {} freshly described",
            listing.len(),
            outcomes.len()
        );

        let snapshot = {
            let mut state = shared.state.lock();
            let now = Utc::now();
            let prior: HashSet<String> = state.surfaced.iter().cloned().collect();
            let mut surfaced = Vec::new();
            for id in &listing {
                match outcomes.get(id) {
                    Some(Some(group)) => {
                        state.cache.upsert(ConsumerGroupState {
                            id: id.clone(),
                            members: group.members,
                            lag: group.lag,
                            status: group.status,
                            last_refresh: Some(now),
                        });
                        surfaced.push(id.clone());
                    }
                    // Described, but nobody subscribes to this topic.
                    Some(None) => {}
                    // Not fetched this cycle: stays exactly as surfaced before.
                    None => {
                        if prior.contains(id) {
                            surfaced.push(id.clone());
                        }
                    }
                }
            }
            state.surfaced = surfaced;
            state.snapshot(&filter)
        };

        tokio::select! {
            _ = cancel.cancelled() => break,
            sent = updates.send(snapshot) => {
                if sent.is_err() {
                    info!("[GroupMonitor] snapshot consumer dropped, stopping");
                    break;
                }
            }
        }
    }
    info!("[GroupMonitor] stopped");
}

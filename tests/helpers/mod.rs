use std::time::Duration;

use kafscope::config::{MonitorConfig, TailConfig};
use tokio::sync::mpsc;

/// Monitor settings tuned for tests: fast ticks, short call deadlines.
pub fn monitor_config(tick_ms: u64) -> MonitorConfig {
    MonitorConfig {
        topic_tick_ms: tick_ms,
        group_tick_ms: tick_ms,
        fetch_timeout_ms: 1000,
        lag_alert_threshold: 1000,
    }
}

pub fn tail_config(max_partitions: usize) -> TailConfig {
    TailConfig {
        max_partitions,
        channel_capacity: 64,
        open_timeout_ms: 1000,
    }
}

/// Next published snapshot, failing the test if none arrives in time.
pub async fn recv_snapshot<T>(snapshots: &mut mpsc::Receiver<Vec<T>>) -> Vec<T> {
    tokio::time::timeout(Duration::from_secs(5), snapshots.recv())
        .await
        .expect("timed out waiting for a snapshot")
        .expect("snapshot channel closed")
}

//! Pure metric derivation. Everything here is arithmetic over values the
//! sampling code already fetched, so it stays trivially unit-testable.

use std::time::Duration;

use crate::models::{GroupStatus, TopicHealth};
use crate::provider::GroupState;

/// Per-partition facts that feed the topic health classification.
#[derive(Debug, Clone, Copy)]
pub struct PartitionHealth {
    pub has_leader: bool,
    pub in_sync_replicas: usize,
}

/// Worst case across partitions wins: any partition without a leader makes
/// the topic Error, any partition with an empty in-sync set makes it
/// Warning, otherwise Ready. A topic with zero partitions is Ready.
pub fn classify_topic(partitions: &[PartitionHealth]) -> TopicHealth {
    let mut health = TopicHealth::Ready;
    for part in partitions {
        if !part.has_leader {
            return TopicHealth::Error;
        }
        if part.in_sync_replicas == 0 {
            health = TopicHealth::Warning;
        }
    }
    health
}

/// Messages per second derived by differencing a cumulative counter across
/// cycles. Undefined without a baseline, and a counter that went backwards
/// (topic recreated, retention rewind) resets the measurement instead of
/// reporting a negative rate.
pub fn throughput(previous: Option<i64>, current: i64, interval: Duration) -> Option<f64> {
    let previous = previous?;
    if current < previous || interval.is_zero() {
        return None;
    }
    Some((current - previous) as f64 / interval.as_secs_f64())
}

/// Lag one partition contributes: newest minus committed, or nothing when
/// the group never committed there.
pub fn lag_contribution(newest: i64, committed: Option<i64>) -> i64 {
    match committed {
        Some(offset) => newest - offset,
        None => 0,
    }
}

pub fn classify_group(state: GroupState, lag: i64, lag_alert_threshold: i64) -> GroupStatus {
    if state == GroupState::Dead {
        GroupStatus::Dead
    } else if lag > lag_alert_threshold {
        GroupStatus::Lagging
    } else {
        GroupStatus::Active
    }
}

//! Topic row state as surfaced to the display layer.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::cache::Entity;

/// Aggregate health of a topic, derived from per-partition leadership and
/// replica sync, worst case wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TopicHealth {
    Ready,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicState {
    pub name: String,
    pub partitions: u32,
    pub replicas: u32,
    pub total_messages: i64,
    pub health: TopicHealth,
    /// Messages per second since the previous cycle. `None` until two
    /// cycles have observed this topic, or after a counter regression.
    pub throughput: Option<f64>,
    /// When this topic's metadata was last fetched. `None` means it has
    /// never been fetched and only its name is known.
    pub last_refresh: Option<DateTime<Utc>>,
}

impl TopicState {
    /// Placeholder row for a topic that appeared in a listing but has not
    /// been fetched yet.
    pub fn unfetched(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            partitions: 0,
            replicas: 0,
            total_messages: 0,
            health: TopicHealth::Ready,
            throughput: None,
            last_refresh: None,
        }
    }
}

impl Entity for TopicState {
    fn name(&self) -> &str {
        &self.name
    }
}

//! Consumer group row state for a single topic's viewer.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::cache::Entity;

/// Activity classification for a group consuming the viewed topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupStatus {
    Active,
    Lagging,
    Dead,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumerGroupState {
    pub id: String,
    pub members: u32,
    /// Sum over partitions of newest offset minus committed offset.
    /// Partitions the group never committed to contribute nothing.
    pub lag: i64,
    pub status: GroupStatus,
    pub last_refresh: Option<DateTime<Utc>>,
}

impl Entity for ConsumerGroupState {
    fn name(&self) -> &str {
        &self.id
    }
}

//! Cluster metadata access behind a trait so the refresh engine stays
//! independent of any particular client library. The simulated in-process
//! cluster in [`sim`] is the only implementation shipped here; a real
//! broker client plugs in by implementing [`MetadataProvider`].

pub mod sim;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use crate::error::Result;

pub use sim::SimCluster;

pub type PartitionId = u32;
pub type BrokerId = u32;

/// Which end of a partition's log to resolve an offset for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetAt {
    Oldest,
    Newest,
}

/// Coordinator-reported lifecycle state of a consumer group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupState {
    Empty,
    PreparingRebalance,
    CompletingRebalance,
    Stable,
    Dead,
}

#[derive(Debug, Clone)]
pub struct MemberDescription {
    pub client_id: String,
    pub subscribed_topics: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct GroupDescription {
    pub id: String,
    pub state: GroupState,
    pub members: Vec<MemberDescription>,
}

/// One record delivered by a partition tail.
#[derive(Debug, Clone)]
pub struct TailRecord {
    pub partition: PartitionId,
    pub offset: i64,
    pub payload: Bytes,
    pub at: DateTime<Utc>,
}

/// Read-only view of a cluster, sufficient to drive every monitor.
///
/// Every call is fallible and may block on the network, so callers wrap
/// them in their own deadline. Implementations must be cheap to share:
/// the engine holds one `Arc<dyn MetadataProvider>` per monitor.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Names of every topic the cluster knows, unordered.
    async fn list_topic_names(&self) -> Result<Vec<String>>;

    async fn list_partitions(&self, topic: &str) -> Result<Vec<PartitionId>>;

    async fn get_offset(
        &self,
        topic: &str,
        partition: PartitionId,
        at: OffsetAt,
    ) -> Result<i64>;

    async fn get_replicas(&self, topic: &str, partition: PartitionId) -> Result<Vec<BrokerId>>;

    /// Broker currently leading the partition. Fails with
    /// [`ProviderError::NoLeader`](crate::error::ProviderError::NoLeader)
    /// while an election is pending.
    async fn get_leader(&self, topic: &str, partition: PartitionId) -> Result<BrokerId>;

    /// Ids of replicas fully caught up with the leader.
    async fn get_in_sync_replicas(
        &self,
        topic: &str,
        partition: PartitionId,
    ) -> Result<Vec<BrokerId>>;

    async fn list_consumer_group_ids(&self) -> Result<Vec<String>>;

    async fn describe_group(&self, id: &str) -> Result<GroupDescription>;

    /// Offset the group last committed for the partition, or `None` when it
    /// has never committed there.
    async fn fetch_committed_offset(
        &self,
        group: &str,
        topic: &str,
        partition: PartitionId,
    ) -> Result<Option<i64>>;

    /// Opens a live feed of new records on one partition, starting at the
    /// current newest offset. The feed ends when the receiver is dropped.
    async fn stream_partition(
        &self,
        topic: &str,
        partition: PartitionId,
    ) -> Result<mpsc::Receiver<TailRecord>>;
}

//! Simulated in-process cluster: a [`MetadataProvider`] backed by DashMaps
//! instead of sockets. Drives the demo binary and the integration tests.
//! Mutation hooks let a scenario script partition growth, leader loss,
//! replica drift, group churn and full outages between polling cycles.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::mpsc;

use crate::error::{ProviderError, Result};
use crate::provider::{
    BrokerId, GroupDescription, GroupState, MemberDescription, MetadataProvider, OffsetAt,
    PartitionId, TailRecord,
};

/// Buffered records per open partition tail before publishes start dropping.
const TAIL_BUFFER: usize = 64;

// ========================================
// SIMULATED STATE
// ========================================

struct SimPartition {
    oldest: i64,
    /// Log end offset: the offset the next published record will take.
    newest: i64,
    leader: Option<BrokerId>,
    replicas: Vec<BrokerId>,
    in_sync: Vec<BrokerId>,
    /// Live tail feeds attached to this partition.
    tails: Vec<mpsc::Sender<TailRecord>>,
    /// When set, opening a tail on this partition fails.
    broken_tail: bool,
}

struct SimTopic {
    partitions: Vec<SimPartition>,
}

struct SimGroup {
    state: GroupState,
    members: Vec<MemberDescription>,
    /// Committed offset per (topic, partition).
    committed: DashMap<(String, PartitionId), i64>,
}

// ========================================
// SIM CLUSTER
// ========================================

pub struct SimCluster {
    topics: DashMap<String, SimTopic>,
    groups: DashMap<String, SimGroup>,
    offline: AtomicBool,
    latency_ms: AtomicU64,
}

impl SimCluster {
    pub fn new() -> Self {
        Self {
            topics: DashMap::new(),
            groups: DashMap::new(),
            offline: AtomicBool::new(false),
            latency_ms: AtomicU64::new(0),
        }
    }

    /// Models one broker round trip: injected latency first, then failure
    /// if the cluster has been switched offline.
    async fn roundtrip(&self) -> Result<()> {
        let latency = self.latency_ms.load(Ordering::Relaxed);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        if self.offline.load(Ordering::Relaxed) {
            return Err(ProviderError::Connectivity(
                "simulated outage: brokers unreachable".to_string(),
            ));
        }
        Ok(())
    }

    fn with_partition<R>(
        &self,
        topic: &str,
        partition: PartitionId,
        f: impl FnOnce(&SimPartition) -> R,
    ) -> Result<R> {
        let entry = self
            .topics
            .get(topic)
            .ok_or_else(|| ProviderError::not_found("topic", topic))?;
        let part = entry
            .partitions
            .get(partition as usize)
            .ok_or_else(|| ProviderError::not_found("partition", format!("{topic}/{partition}")))?;
        Ok(f(part))
    }

    // ========================================
    // SCENARIO HOOKS - topics
    // ========================================

    /// Creates a topic with `partitions` empty partitions, each led by
    /// broker 0 and fully replicated across `replicas` in-sync brokers.
    pub fn add_topic(&self, name: &str, partitions: u32, replicas: u32) {
        let brokers: Vec<BrokerId> = (0..replicas).collect();
        let parts = (0..partitions)
            .map(|_| SimPartition {
                oldest: 0,
                newest: 0,
                leader: brokers.first().copied(),
                replicas: brokers.clone(),
                in_sync: brokers.clone(),
                tails: Vec::new(),
                broken_tail: false,
            })
            .collect();
        self.topics.insert(name.to_string(), SimTopic { partitions: parts });
    }

    pub fn remove_topic(&self, name: &str) {
        self.topics.remove(name);
    }

    /// Appends one record and wakes every open tail. Returns the offset the
    /// record was assigned, or `None` if the target does not exist.
    pub fn publish(&self, topic: &str, partition: PartitionId, payload: Bytes) -> Option<i64> {
        let mut entry = self.topics.get_mut(topic)?;
        let part = entry.partitions.get_mut(partition as usize)?;
        let offset = part.newest;
        part.newest += 1;

        let record = TailRecord {
            partition,
            offset,
            payload,
            at: Utc::now(),
        };
        part.tails.retain(|tail| !tail.is_closed());
        for tail in &part.tails {
            // A full buffer drops the record, like a consumer too slow to keep up.
            let _ = tail.try_send(record.clone());
        }
        Some(offset)
    }

    /// Bumps the log end offset without materializing records. Cheap way to
    /// script message volume for throughput scenarios.
    pub fn advance(&self, topic: &str, partition: PartitionId, count: i64) {
        if let Some(mut entry) = self.topics.get_mut(topic) {
            if let Some(part) = entry.partitions.get_mut(partition as usize) {
                part.newest += count;
            }
        }
    }

    /// Overwrites both ends of a partition's log, e.g. to model retention
    /// kicking in or a recreated topic whose counters went backwards.
    pub fn set_offsets(&self, topic: &str, partition: PartitionId, oldest: i64, newest: i64) {
        if let Some(mut entry) = self.topics.get_mut(topic) {
            if let Some(part) = entry.partitions.get_mut(partition as usize) {
                part.oldest = oldest;
                part.newest = newest;
            }
        }
    }

    pub fn set_leader(&self, topic: &str, partition: PartitionId, broker: BrokerId) {
        if let Some(mut entry) = self.topics.get_mut(topic) {
            if let Some(part) = entry.partitions.get_mut(partition as usize) {
                part.leader = Some(broker);
            }
        }
    }

    /// Drops the partition leader, as during an unfinished election.
    pub fn set_leaderless(&self, topic: &str, partition: PartitionId) {
        if let Some(mut entry) = self.topics.get_mut(topic) {
            if let Some(part) = entry.partitions.get_mut(partition as usize) {
                part.leader = None;
            }
        }
    }

    pub fn set_replicas(&self, topic: &str, partition: PartitionId, brokers: Vec<BrokerId>) {
        if let Some(mut entry) = self.topics.get_mut(topic) {
            if let Some(part) = entry.partitions.get_mut(partition as usize) {
                part.replicas = brokers;
            }
        }
    }

    pub fn set_in_sync(&self, topic: &str, partition: PartitionId, brokers: Vec<BrokerId>) {
        if let Some(mut entry) = self.topics.get_mut(topic) {
            if let Some(part) = entry.partitions.get_mut(partition as usize) {
                part.in_sync = brokers;
            }
        }
    }

    /// Makes future tail opens on this partition fail while leaving
    /// metadata calls intact.
    pub fn break_tail(&self, topic: &str, partition: PartitionId) {
        if let Some(mut entry) = self.topics.get_mut(topic) {
            if let Some(part) = entry.partitions.get_mut(partition as usize) {
                part.broken_tail = true;
            }
        }
    }

    /// Feeds still attached across the topic's partitions, counting only
    /// senders whose consumer side is alive. Lets a scenario observe
    /// subscriptions winding down.
    pub fn open_tails(&self, topic: &str) -> usize {
        self.topics
            .get(topic)
            .map(|entry| {
                entry
                    .partitions
                    .iter()
                    .map(|part| part.tails.iter().filter(|tail| !tail.is_closed()).count())
                    .sum()
            })
            .unwrap_or(0)
    }

    // ========================================
    // SCENARIO HOOKS - groups
    // ========================================

    pub fn add_group(&self, id: &str, state: GroupState) {
        self.groups.insert(
            id.to_string(),
            SimGroup {
                state,
                members: Vec::new(),
                committed: DashMap::new(),
            },
        );
    }

    pub fn remove_group(&self, id: &str) {
        self.groups.remove(id);
    }

    pub fn add_member(&self, group: &str, client_id: &str, subscribed_topics: &[&str]) {
        if let Some(mut entry) = self.groups.get_mut(group) {
            entry.members.push(MemberDescription {
                client_id: client_id.to_string(),
                subscribed_topics: subscribed_topics.iter().map(|t| t.to_string()).collect(),
            });
        }
    }

    pub fn set_group_state(&self, id: &str, state: GroupState) {
        if let Some(mut entry) = self.groups.get_mut(id) {
            entry.state = state;
        }
    }

    pub fn set_committed(&self, group: &str, topic: &str, partition: PartitionId, offset: i64) {
        if let Some(entry) = self.groups.get(group) {
            entry
                .committed
                .insert((topic.to_string(), partition), offset);
        }
    }

    // ========================================
    // SCENARIO HOOKS - cluster wide
    // ========================================

    /// Switches every provider call to fail with a connectivity error.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Relaxed);
    }

    /// Adds a fixed delay to every provider call, for deadline scenarios.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::Relaxed);
    }
}

impl Default for SimCluster {
    fn default() -> Self {
        Self::new()
    }
}

// ========================================
// PROVIDER IMPLEMENTATION
// ========================================

#[async_trait]
impl MetadataProvider for SimCluster {
    async fn list_topic_names(&self) -> Result<Vec<String>> {
        self.roundtrip().await?;
        Ok(self.topics.iter().map(|e| e.key().clone()).collect())
    }

    async fn list_partitions(&self, topic: &str) -> Result<Vec<PartitionId>> {
        self.roundtrip().await?;
        let entry = self
            .topics
            .get(topic)
            .ok_or_else(|| ProviderError::not_found("topic", topic))?;
        Ok((0..entry.partitions.len() as PartitionId).collect())
    }

    async fn get_offset(
        &self,
        topic: &str,
        partition: PartitionId,
        at: OffsetAt,
    ) -> Result<i64> {
        self.roundtrip().await?;
        self.with_partition(topic, partition, |part| match at {
            OffsetAt::Oldest => part.oldest,
            OffsetAt::Newest => part.newest,
        })
    }

    async fn get_replicas(&self, topic: &str, partition: PartitionId) -> Result<Vec<BrokerId>> {
        self.roundtrip().await?;
        self.with_partition(topic, partition, |part| part.replicas.clone())
    }

    async fn get_leader(&self, topic: &str, partition: PartitionId) -> Result<BrokerId> {
        self.roundtrip().await?;
        self.with_partition(topic, partition, |part| part.leader)?
            .ok_or(ProviderError::NoLeader {
                topic: topic.to_string(),
                partition,
            })
    }

    async fn get_in_sync_replicas(
        &self,
        topic: &str,
        partition: PartitionId,
    ) -> Result<Vec<BrokerId>> {
        self.roundtrip().await?;
        self.with_partition(topic, partition, |part| part.in_sync.clone())
    }

    async fn list_consumer_group_ids(&self) -> Result<Vec<String>> {
        self.roundtrip().await?;
        Ok(self.groups.iter().map(|e| e.key().clone()).collect())
    }

    async fn describe_group(&self, id: &str) -> Result<GroupDescription> {
        self.roundtrip().await?;
        let entry = self
            .groups
            .get(id)
            .ok_or_else(|| ProviderError::not_found("consumer group", id))?;
        Ok(GroupDescription {
            id: id.to_string(),
            state: entry.state,
            members: entry.members.clone(),
        })
    }

    async fn fetch_committed_offset(
        &self,
        group: &str,
        topic: &str,
        partition: PartitionId,
    ) -> Result<Option<i64>> {
        self.roundtrip().await?;
        let entry = self
            .groups
            .get(group)
            .ok_or_else(|| ProviderError::not_found("consumer group", group))?;
        Ok(entry
            .committed
            .get(&(topic.to_string(), partition))
            .map(|v| *v))
    }

    async fn stream_partition(
        &self,
        topic: &str,
        partition: PartitionId,
    ) -> Result<mpsc::Receiver<TailRecord>> {
        self.roundtrip().await?;
        let mut entry = self
            .topics
            .get_mut(topic)
            .ok_or_else(|| ProviderError::not_found("topic", topic))?;
        let part = entry
            .partitions
            .get_mut(partition as usize)
            .ok_or_else(|| ProviderError::not_found("partition", format!("{topic}/{partition}")))?;
        if part.broken_tail {
            return Err(ProviderError::Connectivity(format!(
                "cannot attach consumer to {topic}/{partition}"
            )));
        }
        let (tx, rx) = mpsc::channel(TAIL_BUFFER);
        part.tails.push(tx);
        Ok(rx)
    }
}

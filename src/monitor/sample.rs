//! One-entity sampling: the remote call sequences that turn provider
//! lookups into a [`TopicSample`] or [`GroupSample`] for a single cycle.
//! A hard failure here means the caller carries the entity forward; soft
//! per-partition failures are absorbed and logged at debug level.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::error::{ProviderError, Result};
use crate::models::{GroupStatus, TopicHealth};
use crate::monitor::metrics::{self, PartitionHealth};
use crate::provider::{MetadataProvider, OffsetAt};

/// Bounds one remote call. Expiry is reported as a regular provider error
/// so the caller's failure path stays uniform.
pub(crate) async fn with_deadline<T>(
    limit: Duration,
    call: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout(limit)),
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct TopicSample {
    pub partitions: u32,
    pub replicas: u32,
    pub total_messages: i64,
    pub health: TopicHealth,
}

/// Fetches everything a topic row displays. The partition listing must
/// succeed; after that, partitions whose offsets cannot be resolved simply
/// do not contribute to the message count.
pub(crate) async fn sample_topic(
    provider: &dyn MetadataProvider,
    topic: &str,
    timeout: Duration,
) -> Result<TopicSample> {
    let partitions = with_deadline(timeout, provider.list_partitions(topic)).await?;

    let replicas = match partitions.first() {
        Some(&first) => match with_deadline(timeout, provider.get_replicas(topic, first)).await {
            Ok(set) => set.len() as u32,
            Err(err) => {
                debug!("[TopicMonitor] {topic}: replica set unavailable: {err}");
                0
            }
        },
        None => 0,
    };

    let mut total_messages = 0i64;
    let mut health_inputs = Vec::with_capacity(partitions.len());
    for &partition in &partitions {
        let has_leader = with_deadline(timeout, provider.get_leader(topic, partition))
            .await
            .is_ok();
        let in_sync_replicas =
            match with_deadline(timeout, provider.get_in_sync_replicas(topic, partition)).await {
                Ok(set) => set.len(),
                Err(err) => {
                    debug!("[TopicMonitor] {topic}/{partition}: isr unavailable: {err}");
                    0
                }
            };
        health_inputs.push(PartitionHealth {
            has_leader,
            in_sync_replicas,
        });

        let oldest = with_deadline(timeout, provider.get_offset(topic, partition, OffsetAt::Oldest)).await;
        let newest = with_deadline(timeout, provider.get_offset(topic, partition, OffsetAt::Newest)).await;
        match (oldest, newest) {
            (Ok(oldest), Ok(newest)) => total_messages += newest - oldest,
            (Err(err), _) | (_, Err(err)) => {
                debug!("[TopicMonitor] {topic}/{partition}: offsets unavailable, skipping: {err}");
            }
        }
    }

    Ok(TopicSample {
        partitions: partitions.len() as u32,
        replicas,
        total_messages,
        health: metrics::classify_topic(&health_inputs),
    })
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct GroupSample {
    pub members: u32,
    pub lag: i64,
    pub status: GroupStatus,
}

/// Describes one consumer group against one topic. Returns `None` when no
/// member subscribes to the topic, meaning the group is not surfaced in
/// that topic's view at all.
pub(crate) async fn sample_group(
    provider: &dyn MetadataProvider,
    group_id: &str,
    topic: &str,
    timeout: Duration,
    lag_alert_threshold: i64,
) -> Result<Option<GroupSample>> {
    let description = with_deadline(timeout, provider.describe_group(group_id)).await?;

    let members = description
        .members
        .iter()
        .filter(|member| member.subscribed_topics.iter().any(|t| t == topic))
        .count() as u32;
    if members == 0 {
        return Ok(None);
    }

    let partitions = with_deadline(timeout, provider.list_partitions(topic)).await?;
    let mut lag = 0i64;
    for &partition in &partitions {
        let committed = match with_deadline(
            timeout,
            provider.fetch_committed_offset(group_id, topic, partition),
        )
        .await
        {
            Ok(Some(offset)) => offset,
            // Never committed here: contributes nothing.
            Ok(None) => continue,
            Err(err) => {
                debug!("[GroupMonitor] {group_id}@{topic}/{partition}: committed offset unavailable: {err}");
                continue;
            }
        };
        let newest =
            match with_deadline(timeout, provider.get_offset(topic, partition, OffsetAt::Newest))
                .await
            {
                Ok(offset) => offset,
                Err(err) => {
                    debug!("[GroupMonitor] {group_id}@{topic}/{partition}: newest offset unavailable: {err}");
                    continue;
                }
            };
        lag += metrics::lag_contribution(newest, Some(committed));
    }

    Ok(Some(GroupSample {
        members,
        lag,
        status: metrics::classify_group(description.state, lag, lag_alert_threshold),
    }))
}

//! Error types for the refresh engine.
//!
//! Failures split into two levels: cycle-level (the whole polling pass is
//! skipped and retried on the next tick) and entity-level (one topic or
//! group misses this cycle's fresh data while the rest proceed). The
//! variants here carry enough context to log either case.

use std::time::Duration;

use thiserror::Error;

/// Standard result type for provider and engine operations.
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Failures reported by a [`MetadataProvider`](crate::provider::MetadataProvider)
/// or by the engine's own call deadline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Cluster or coordinator unreachable. Cycle-level: the current polling
    /// pass is abandoned and retried on the next tick.
    #[error("cannot reach cluster: {0}")]
    Connectivity(String),

    /// A named entity disappeared between listing and detail fetch.
    /// Entity-level: it is skipped this cycle, never purged from cache.
    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },

    /// No elected leader for a partition.
    #[error("no leader elected for {topic}/{partition}")]
    NoLeader { topic: String, partition: u32 },

    /// A remote call exceeded the configured deadline. Treated the same as
    /// a fetch failure for the entity (or cycle) being sampled.
    #[error("remote call exceeded deadline of {0:?}")]
    Timeout(Duration),
}

impl ProviderError {
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        ProviderError::NotFound {
            kind,
            name: name.into(),
        }
    }
}

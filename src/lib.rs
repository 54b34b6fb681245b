//! Kafscope: the headless core of a cluster dashboard. Background refresh
//! loops poll topic and consumer-group metadata through a pluggable
//! provider, derive display metrics, and publish ordered snapshots over
//! single-slot channels for a presentation layer to render.

pub mod config;
pub mod error;
pub mod models;
pub mod monitor;
pub mod provider;
pub mod tail;

pub use error::{ProviderError, Result};
pub use models::{ConsumerGroupState, GroupStatus, TopicHealth, TopicState};
pub use monitor::{GroupMonitor, MonitorHandle, TopicMonitor, Viewport};
pub use provider::{MetadataProvider, SimCluster};
pub use tail::{MessageTail, TailEvent};

pub mod cache;
pub mod consumer_group;
pub mod topic;

pub use cache::{Entity, EntityCache};
pub use consumer_group::{ConsumerGroupState, GroupStatus};
pub use topic::{TopicHealth, TopicState};

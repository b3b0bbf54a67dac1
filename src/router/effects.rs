//! Router side-effect surface
//!
//! The router never touches UI widgets or the query cache directly; it emits
//! effects through this sink so the view layer stays swappable and the router
//! stays testable.

use std::fmt;

use tracing::info;

/// Cache partitions the client invalidates after processing an event.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CachePartition {
    /// The notification list itself
    Notifications,
    /// The unread badge count
    UnreadCount,
    /// Conversation list
    Conversations,
    /// Messages of one conversation
    Messages(String),
    /// Post list
    Posts,
    /// One post
    Post(String),
    /// Comment lists
    Comments,
    /// User profiles
    Users,
    /// Follower lists
    Followers,
    /// Following lists
    Following,
}

impl fmt::Display for CachePartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CachePartition::Notifications => write!(f, "notifications"),
            CachePartition::UnreadCount => write!(f, "unread_count"),
            CachePartition::Conversations => write!(f, "conversations"),
            CachePartition::Messages(id) => write!(f, "messages:{}", id),
            CachePartition::Posts => write!(f, "posts"),
            CachePartition::Post(id) => write!(f, "post:{}", id),
            CachePartition::Comments => write!(f, "comments"),
            CachePartition::Users => write!(f, "users"),
            CachePartition::Followers => write!(f, "followers"),
            CachePartition::Following => write!(f, "following"),
        }
    }
}

/// Side effects the router may request from the hosting client.
pub trait EffectSink: Send + Sync {
    /// Show a transient message.
    fn toast(&self, message: &str);

    /// Replace the unread badge with an authoritative count.
    fn set_badge(&self, count: u64);

    /// Optimistically bump the unread badge by one.
    fn increment_badge(&self);

    /// Drop one cache partition so the next render re-fetches it.
    fn invalidate(&self, partition: CachePartition);
}

/// Default sink: logs every effect. Used by the demo binary; a real UI host
/// supplies its own implementation.
pub struct LoggingEffects;

impl EffectSink for LoggingEffects {
    fn toast(&self, message: &str) {
        info!(message, "toast");
    }

    fn set_badge(&self, count: u64) {
        info!(count, "badge set");
    }

    fn increment_badge(&self) {
        info!("badge incremented");
    }

    fn invalidate(&self, partition: CachePartition) {
        info!(partition = %partition, "cache partition invalidated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_cache_keys() {
        assert_eq!(CachePartition::Notifications.to_string(), "notifications");
        assert_eq!(CachePartition::UnreadCount.to_string(), "unread_count");
        assert_eq!(
            CachePartition::Messages("c1".into()).to_string(),
            "messages:c1"
        );
        assert_eq!(CachePartition::Post("p1".into()).to_string(), "post:p1");
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Notification type enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    /// User commented on a post
    Comment,
    /// User replied to a comment
    Reply,
    /// User liked a post
    Like,
    /// System/conversation message
    System,
    /// User started following
    NewFollower,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::Comment => "comment",
            NotificationType::Reply => "reply",
            NotificationType::Like => "like",
            NotificationType::System => "system",
            NotificationType::NewFollower => "new_follower",
        }
    }

    /// Whether notifications of this type merge into display groups when
    /// they share a related target. Follower events never merge.
    pub fn merges(&self) -> bool {
        matches!(
            self,
            NotificationType::Comment
                | NotificationType::Reply
                | NotificationType::Like
                | NotificationType::System
        )
    }
}

/// Transient notification record arriving over the live stream.
///
/// Consumed by the router immediately; never persisted client-side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationEvent {
    pub id: String,

    /// Notification type
    #[serde(rename = "type")]
    pub kind: NotificationType,

    /// Sender user ID (absent for machine-generated notifications)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<String>,

    /// Related object ID (post, conversation, etc.)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_id: Option<String>,

    /// Notification title
    pub title: String,

    /// Notification body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Durable notification record as held by the external store.
///
/// The client only reads these and requests mutations (mark-read, delete);
/// the store owns the lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredNotification {
    pub id: String,

    #[serde(rename = "type")]
    pub kind: NotificationType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<String>,

    /// Sender display name, when the store resolved one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_id: Option<String>,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    pub is_read: bool,

    pub created_at: DateTime<Utc>,
}

/// Ambient view state supplied by the view layer.
///
/// Read (never written) by the router at event-processing time. Must be
/// snapshotted fresh per event: the user may navigate between event arrival
/// and processing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewContext {
    pub current_user_id: String,
    pub active_conversation_id: Option<String>,
    pub active_post_id: Option<String>,
}

/// Unread-count payload carried by stream and store responses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct UnreadCount {
    pub unread_count: u64,
}

/// Query parameters for paging stored notifications.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NotificationQuery {
    pub page: u32,
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_read: Option<bool>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<NotificationType>,
}

impl Default for NotificationQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 20,
            is_read: None,
            kind: None,
        }
    }
}

/// One page of stored notifications.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationPage {
    pub items: Vec<StoredNotification>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

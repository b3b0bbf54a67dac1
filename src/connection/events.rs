//! Typed stream events
//!
//! Wire frames arrive as JSON `{"event": "...", "data": {...}}`. Each frame is
//! decoded into a `StreamEvent` and then dispatched as a `SyncEvent` variant on
//! the manager's single event channel. All possible events are explicitly
//! listed; there are no per-event subscriber lists.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{NotificationEvent, UnreadCount};

/// Inbound wire events from the notification stream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data")]
pub enum StreamEvent {
    /// A new notification was generated for this user
    #[serde(rename = "notification:new")]
    NotificationNew(NotificationEvent),

    /// Server pushed the current unread count
    #[serde(rename = "notification:unread_count")]
    UnreadCount(UnreadCount),

    /// Unread count changed after a server-side mutation
    #[serde(rename = "notification:unread_count_updated")]
    UnreadCountUpdated(UnreadCount),
}

/// Events delivered to the single consumer channel: lifecycle transitions plus
/// decoded stream events.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// Handshake succeeded
    Connected,
    /// Transport dropped, reconnect scheduled
    Disconnected,
    /// One dial attempt failed
    ConnectError { attempt: u32, message: String },
    /// Attempt ceiling reached; terminal until the next explicit connect
    ReconnectFailed,
    /// A notification arrived
    Notification(NotificationEvent),
    /// The server reported an unread count
    UnreadCount(u64),
}

impl From<StreamEvent> for SyncEvent {
    fn from(event: StreamEvent) -> Self {
        match event {
            StreamEvent::NotificationNew(n) => SyncEvent::Notification(n),
            StreamEvent::UnreadCount(c) | StreamEvent::UnreadCountUpdated(c) => {
                SyncEvent::UnreadCount(c.unread_count)
            }
        }
    }
}

/// Decode one raw frame. Malformed frames are reported to the caller, which
/// drops them with a warning rather than letting them past the router boundary.
pub fn decode_frame(raw: &str) -> Result<StreamEvent> {
    Ok(serde_json::from_str(raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NotificationType;

    #[test]
    fn test_decode_notification_new() {
        let raw = r#"{
            "event": "notification:new",
            "data": {
                "id": "n1",
                "type": "like",
                "sender_id": "u2",
                "related_id": "p1",
                "title": "New like",
                "created_at": "2026-03-01T10:00:00Z"
            }
        }"#;

        let event = decode_frame(raw).unwrap();
        match event {
            StreamEvent::NotificationNew(n) => {
                assert_eq!(n.kind, NotificationType::Like);
                assert_eq!(n.related_id.as_deref(), Some("p1"));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_decode_unread_count_variants_converge() {
        let pushed = r#"{"event": "notification:unread_count", "data": {"unread_count": 4}}"#;
        let updated =
            r#"{"event": "notification:unread_count_updated", "data": {"unread_count": 4}}"#;

        let a: SyncEvent = decode_frame(pushed).unwrap().into();
        let b: SyncEvent = decode_frame(updated).unwrap().into();
        assert_eq!(a, SyncEvent::UnreadCount(4));
        assert_eq!(a, b);
    }

    #[test]
    fn test_malformed_frame_is_rejected() {
        // missing required title
        let raw = r#"{
            "event": "notification:new",
            "data": {"id": "n1", "type": "like", "created_at": "2026-03-01T10:00:00Z"}
        }"#;
        assert!(decode_frame(raw).is_err());

        assert!(decode_frame("not json at all").is_err());
        assert!(decode_frame(r#"{"event": "unknown:event", "data": {}}"#).is_err());
    }
}

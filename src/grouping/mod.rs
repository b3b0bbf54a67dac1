//! Notification Grouping Engine
//!
//! A pure presentation transform: raw stored notifications in, merged
//! display-ready groups out. Called on demand by the render pass; nothing here
//! touches the network, the view context, or any mutable state, which is what
//! keeps the transform idempotent.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{NotificationType, StoredNotification};

/// Placeholder shown when the store resolved no display name for a sender.
pub const UNKNOWN_SENDER: &str = "未知用户";

/// A display-level merge of raw notifications sharing type and related target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationGroup {
    pub group_key: String,
    pub kind: NotificationType,
    pub related_id: Option<String>,
    pub title: String,
    /// Composed summary for merged groups; the stored content verbatim for
    /// singleton groups.
    pub composed_content: Option<String>,
    /// Newest member timestamp; represents the group in ordering.
    pub latest_created_at: DateTime<Utc>,
    pub is_read: bool,
    pub unread_count: usize,
    pub total_count: usize,
    /// Sender display names, deduplicated in first-seen order.
    pub sender_names: Vec<String>,
    pub members: Vec<StoredNotification>,
}

/// Merge raw notifications into display groups.
///
/// Mergeable types sharing a related id collapse into one group keyed
/// `"{type}_{related_id}"`; everything else (follower events, events without
/// a related id) stays a singleton and is never combined. Output is sorted by
/// newest member, descending.
pub fn group_notifications(notifications: &[StoredNotification]) -> Vec<NotificationGroup> {
    let mut order: Vec<String> = Vec::new();
    let mut buckets: HashMap<String, Vec<StoredNotification>> = HashMap::new();

    for n in notifications {
        let key = group_key(n);
        if !buckets.contains_key(&key) {
            order.push(key.clone());
        }
        buckets.entry(key).or_default().push(n.clone());
    }

    let mut groups: Vec<NotificationGroup> = order
        .into_iter()
        .filter_map(|key| buckets.remove(&key).map(|members| build_group(key, members)))
        .collect();

    groups.sort_by(|a, b| {
        b.latest_created_at
            .cmp(&a.latest_created_at)
            .then_with(|| a.group_key.cmp(&b.group_key))
    });
    groups
}

/// Flatten groups back into their raw members, in display order.
pub fn flatten(groups: Vec<NotificationGroup>) -> Vec<StoredNotification> {
    groups.into_iter().flat_map(|g| g.members).collect()
}

fn group_key(n: &StoredNotification) -> String {
    match n.related_id.as_deref() {
        Some(related) if n.kind.merges() => format!("{}_{}", n.kind.as_str(), related),
        _ => format!("single_{}", n.id),
    }
}

fn build_group(key: String, members: Vec<StoredNotification>) -> NotificationGroup {
    // Buckets are built from at least one notification.
    let first = &members[0];

    let total_count = members.len();
    let unread_count = members.iter().filter(|m| !m.is_read).count();

    let mut latest_created_at = first.created_at;
    for m in &members[1..] {
        if m.created_at > latest_created_at {
            latest_created_at = m.created_at;
        }
    }

    let mut sender_names: Vec<String> = Vec::new();
    for m in &members {
        let name = m
            .sender_name
            .clone()
            .unwrap_or_else(|| UNKNOWN_SENDER.to_string());
        if !sender_names.contains(&name) {
            sender_names.push(name);
        }
    }

    let composed_content = if total_count > 1 {
        Some(compose_content(&sender_names, action_phrase(first.kind)))
    } else {
        first.content.clone()
    };

    NotificationGroup {
        group_key: key,
        kind: first.kind,
        related_id: first.related_id.clone(),
        title: first.title.clone(),
        composed_content,
        latest_created_at,
        is_read: unread_count == 0,
        unread_count,
        total_count,
        sender_names,
        members,
    }
}

fn action_phrase(kind: NotificationType) -> &'static str {
    match kind {
        NotificationType::Like => "liked your post",
        NotificationType::Comment => "commented on your post",
        NotificationType::Reply => "replied to your comment",
        NotificationType::System => "sent you a message",
        NotificationType::NewFollower => "started following you",
    }
}

fn compose_content(sender_names: &[String], phrase: &str) -> String {
    match sender_names {
        [one] => format!("{} {}", one, phrase),
        [a, b] => format!("{}、{} {}", a, b, phrase),
        [first_sender, ..] => {
            format!("{} 等 {} 人 {}", first_sender, sender_names.len(), phrase)
        }
        [] => phrase.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn stored(
        id: &str,
        kind: NotificationType,
        sender_name: Option<&str>,
        related_id: Option<&str>,
        is_read: bool,
        minute: u32,
    ) -> StoredNotification {
        StoredNotification {
            id: id.to_string(),
            kind,
            sender_id: sender_name.map(|s| format!("uid-{}", s)),
            sender_name: sender_name.map(str::to_string),
            related_id: related_id.map(str::to_string),
            title: "Notification".to_string(),
            content: Some(format!("content of {}", id)),
            is_read,
            created_at: Utc.with_ymd_and_hms(2026, 3, 1, 10, minute, 0).unwrap(),
        }
    }

    #[test]
    fn test_three_likes_merge_with_composed_content() {
        let input = vec![
            stored("n1", NotificationType::Like, Some("Ann"), Some("p1"), false, 1),
            stored("n2", NotificationType::Like, Some("Bob"), Some("p1"), false, 2),
            stored("n3", NotificationType::Like, Some("Cara"), Some("p1"), false, 3),
        ];

        let groups = group_notifications(&input);
        assert_eq!(groups.len(), 1);

        let group = &groups[0];
        assert_eq!(group.group_key, "like_p1");
        assert_eq!(group.total_count, 3);
        assert_eq!(group.unread_count, 3);
        assert!(!group.is_read);
        assert_eq!(group.sender_names, vec!["Ann", "Bob", "Cara"]);
        assert_eq!(
            group.composed_content.as_deref(),
            Some("Ann 等 3 人 liked your post")
        );
        // Newest member represents the group.
        assert_eq!(group.latest_created_at, input[2].created_at);
    }

    #[test]
    fn test_two_senders_use_list_format() {
        let input = vec![
            stored("n1", NotificationType::Comment, Some("Ann"), Some("p1"), true, 1),
            stored("n2", NotificationType::Comment, Some("Bob"), Some("p1"), false, 2),
        ];

        let groups = group_notifications(&input);
        assert_eq!(
            groups[0].composed_content.as_deref(),
            Some("Ann、Bob commented on your post")
        );
        assert_eq!(groups[0].unread_count, 1);
        assert!(!groups[0].is_read);
    }

    #[test]
    fn test_repeat_sender_composes_as_one() {
        let input = vec![
            stored("n1", NotificationType::Reply, Some("Ann"), Some("p1"), false, 1),
            stored("n2", NotificationType::Reply, Some("Ann"), Some("p1"), false, 2),
        ];

        let groups = group_notifications(&input);
        assert_eq!(groups[0].sender_names, vec!["Ann"]);
        assert_eq!(
            groups[0].composed_content.as_deref(),
            Some("Ann replied to your comment")
        );
    }

    #[test]
    fn test_singleton_keeps_content_verbatim() {
        let input = vec![stored(
            "n1",
            NotificationType::Like,
            Some("Ann"),
            Some("p1"),
            false,
            1,
        )];

        let groups = group_notifications(&input);
        assert_eq!(groups[0].composed_content.as_deref(), Some("content of n1"));
    }

    #[test]
    fn test_followers_never_merge() {
        let input = vec![
            stored("n1", NotificationType::NewFollower, Some("Ann"), None, false, 1),
            stored("n2", NotificationType::NewFollower, Some("Bob"), None, false, 2),
        ];

        let groups = group_notifications(&input);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].group_key, "single_n2");
        assert_eq!(groups[1].group_key, "single_n1");
    }

    #[test]
    fn test_missing_related_id_never_merges() {
        let input = vec![
            stored("n1", NotificationType::Like, Some("Ann"), None, false, 1),
            stored("n2", NotificationType::Like, Some("Bob"), None, false, 2),
        ];

        assert_eq!(group_notifications(&input).len(), 2);
    }

    #[test]
    fn test_missing_sender_name_uses_placeholder() {
        let input = vec![
            stored("n1", NotificationType::Like, None, Some("p1"), false, 1),
            stored("n2", NotificationType::Like, Some("Bob"), Some("p1"), false, 2),
        ];

        let groups = group_notifications(&input);
        assert_eq!(groups[0].sender_names, vec![UNKNOWN_SENDER, "Bob"]);
    }

    #[test]
    fn test_groups_sorted_by_newest_descending() {
        let input = vec![
            stored("n1", NotificationType::Like, Some("Ann"), Some("p1"), false, 1),
            stored("n2", NotificationType::Comment, Some("Bob"), Some("p2"), false, 5),
            stored("n3", NotificationType::Like, Some("Cara"), Some("p1"), false, 3),
        ];

        let groups = group_notifications(&input);
        assert_eq!(groups.len(), 2);
        // Comment at minute 5 beats the like group whose newest is minute 3.
        assert_eq!(groups[0].group_key, "comment_p2");
        assert_eq!(groups[1].group_key, "like_p1");
    }

    #[test]
    fn test_unread_never_exceeds_total() {
        let input = vec![
            stored("n1", NotificationType::Like, Some("Ann"), Some("p1"), true, 1),
            stored("n2", NotificationType::Like, Some("Bob"), Some("p1"), true, 2),
            stored("n3", NotificationType::System, Some("Ops"), Some("c1"), false, 3),
        ];

        for group in group_notifications(&input) {
            assert!(group.unread_count <= group.total_count);
            assert_eq!(group.total_count, group.members.len());
        }
    }

    #[test]
    fn test_grouping_is_idempotent() {
        let input = vec![
            stored("n1", NotificationType::Like, Some("Ann"), Some("p1"), false, 1),
            stored("n2", NotificationType::Like, Some("Bob"), Some("p1"), true, 2),
            stored("n3", NotificationType::Reply, None, Some("p2"), false, 3),
            stored("n4", NotificationType::NewFollower, Some("Cara"), None, false, 4),
            stored("n5", NotificationType::System, Some("Ops"), Some("c1"), false, 5),
            stored("n6", NotificationType::System, Some("Ops"), Some("c1"), true, 6),
        ];

        let first = group_notifications(&input);
        let second = group_notifications(&flatten(first.clone()));
        assert_eq!(first, second);
    }
}

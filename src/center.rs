//! Notification center
//!
//! Glue between the list screen and the store: pages stored notifications,
//! applies the grouping engine for display, and forwards mutation requests.

use std::sync::Arc;

use tracing::debug;

use crate::api::NotificationApi;
use crate::error::Result;
use crate::grouping::{group_notifications, NotificationGroup};
use crate::models::NotificationQuery;

pub struct NotificationCenter {
    api: Arc<dyn NotificationApi>,
}

impl NotificationCenter {
    pub fn new(api: Arc<dyn NotificationApi>) -> Self {
        Self { api }
    }

    /// Fetch one page from the store and merge it for display.
    pub async fn load_page(&self, query: NotificationQuery) -> Result<Vec<NotificationGroup>> {
        let page = self.api.get_notifications(query).await?;
        debug!(
            fetched = page.items.len(),
            total = page.total,
            "loaded notification page"
        );
        Ok(group_notifications(&page.items))
    }

    /// Mark everything in a display group as read. Merged groups share a
    /// related target and can be cleared in one request; singleton groups
    /// without one are marked member by member.
    pub async fn mark_group_read(&self, group: &NotificationGroup) -> Result<()> {
        match group.related_id.as_deref() {
            Some(related) if group.kind.merges() => {
                self.api.mark_by_related(related, group.kind).await
            }
            _ => {
                for member in &group.members {
                    self.api.mark_as_read(&member.id).await?;
                }
                Ok(())
            }
        }
    }

    /// Mark every notification as read, returning the affected count.
    pub async fn mark_all_read(&self) -> Result<u64> {
        self.api.mark_all_as_read().await
    }

    /// Delete one notification.
    pub async fn remove(&self, notification_id: &str) -> Result<()> {
        self.api.delete_notification(notification_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::{NotificationPage, NotificationType, StoredNotification};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;

    struct PageApi {
        items: Vec<StoredNotification>,
        journal: Mutex<Vec<String>>,
    }

    impl PageApi {
        fn new(items: Vec<StoredNotification>) -> Arc<Self> {
            Arc::new(Self {
                items,
                journal: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<String> {
            self.journal.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl NotificationApi for PageApi {
        async fn get_unread_count(&self) -> Result<u64> {
            Ok(0)
        }

        async fn mark_by_related(&self, related_id: &str, kind: NotificationType) -> Result<()> {
            self.journal
                .lock()
                .unwrap()
                .push(format!("mark_by_related:{}:{}", related_id, kind.as_str()));
            Ok(())
        }

        async fn mark_as_read(&self, notification_id: &str) -> Result<StoredNotification> {
            self.journal
                .lock()
                .unwrap()
                .push(format!("mark_as_read:{}", notification_id));
            self.items
                .iter()
                .find(|n| n.id == notification_id)
                .cloned()
                .ok_or(AppError::Api("not found".into()))
        }

        async fn mark_all_as_read(&self) -> Result<u64> {
            self.journal.lock().unwrap().push("mark_all_as_read".into());
            Ok(self.items.len() as u64)
        }

        async fn delete_notification(&self, notification_id: &str) -> Result<()> {
            self.journal
                .lock()
                .unwrap()
                .push(format!("delete:{}", notification_id));
            Ok(())
        }

        async fn get_notifications(&self, query: NotificationQuery) -> Result<NotificationPage> {
            Ok(NotificationPage {
                items: self.items.clone(),
                total: self.items.len() as u64,
                page: query.page,
                limit: query.limit,
            })
        }
    }

    fn stored(id: &str, kind: NotificationType, related: Option<&str>) -> StoredNotification {
        StoredNotification {
            id: id.to_string(),
            kind,
            sender_id: Some("u2".into()),
            sender_name: Some("Ann".into()),
            related_id: related.map(str::to_string),
            title: "Notification".into(),
            content: None,
            is_read: false,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_load_page_groups_results() {
        let api = PageApi::new(vec![
            stored("n1", NotificationType::Like, Some("p1")),
            stored("n2", NotificationType::Like, Some("p1")),
            stored("n3", NotificationType::NewFollower, None),
        ]);
        let center = NotificationCenter::new(api);

        let groups = center.load_page(NotificationQuery::default()).await.unwrap();
        assert_eq!(groups.len(), 2);
    }

    #[tokio::test]
    async fn test_mark_merged_group_uses_related_request() {
        let api = PageApi::new(vec![
            stored("n1", NotificationType::Like, Some("p1")),
            stored("n2", NotificationType::Like, Some("p1")),
        ]);
        let center = NotificationCenter::new(api.clone());

        let groups = center.load_page(NotificationQuery::default()).await.unwrap();
        center.mark_group_read(&groups[0]).await.unwrap();

        assert_eq!(api.calls(), vec!["mark_by_related:p1:like"]);
    }

    #[tokio::test]
    async fn test_mark_singleton_group_marks_members() {
        let api = PageApi::new(vec![stored("n3", NotificationType::NewFollower, None)]);
        let center = NotificationCenter::new(api.clone());

        let groups = center.load_page(NotificationQuery::default()).await.unwrap();
        center.mark_group_read(&groups[0]).await.unwrap();

        assert_eq!(api.calls(), vec!["mark_as_read:n3"]);
    }

    #[tokio::test]
    async fn test_mark_all_and_remove_forward() {
        let api = PageApi::new(vec![stored("n1", NotificationType::Like, Some("p1"))]);
        let center = NotificationCenter::new(api.clone());

        assert_eq!(center.mark_all_read().await.unwrap(), 1);
        center.remove("n1").await.unwrap();
        assert_eq!(api.calls(), vec!["mark_all_as_read", "delete:n1"]);
    }
}

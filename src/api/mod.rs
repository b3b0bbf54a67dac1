//! External notification store collaborator
//!
//! The forum backend owns stored notifications; the client only reads them and
//! requests mutations. The `NotificationApi` trait is the seam the router and
//! notification center depend on, so both are testable without a backend.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::{AppError, Result};
use crate::models::{NotificationPage, NotificationQuery, NotificationType, StoredNotification};

#[async_trait]
pub trait NotificationApi: Send + Sync {
    /// Authoritative unread count as reported by the store.
    async fn get_unread_count(&self) -> Result<u64>;

    /// Mark all notifications sharing a related target and type as read.
    async fn mark_by_related(&self, related_id: &str, kind: NotificationType) -> Result<()>;

    /// Mark one notification as read, returning the updated record.
    async fn mark_as_read(&self, notification_id: &str) -> Result<StoredNotification>;

    /// Mark every notification as read, returning the affected count.
    async fn mark_all_as_read(&self) -> Result<u64>;

    /// Delete one notification.
    async fn delete_notification(&self, notification_id: &str) -> Result<()>;

    /// Page through stored notifications.
    async fn get_notifications(&self, query: NotificationQuery) -> Result<NotificationPage>;
}

/// Standard response envelope used by the forum backend.
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T> ApiEnvelope<T> {
    fn into_data(self) -> Result<T> {
        if self.success {
            self.data
                .ok_or_else(|| AppError::Api("no data in response".to_string()))
        } else {
            Err(AppError::Api(
                self.error.unwrap_or_else(|| "unknown error".to_string()),
            ))
        }
    }
}

#[derive(Debug, Deserialize)]
struct CountData {
    count: u64,
}

/// HTTP implementation of the notification store collaborator.
pub struct HttpNotificationApi {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
}

impl HttpNotificationApi {
    pub fn new(base_url: &str, auth_token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token,
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.client.request(method, &url);
        match &self.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn parse<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Api(format!("status {}: {}", status, body)));
        }
        let envelope: ApiEnvelope<T> = response.json().await?;
        envelope.into_data()
    }

    /// For endpoints that return a success flag with no payload.
    async fn expect_ok(response: reqwest::Response) -> Result<()> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Api(format!("status {}: {}", status, body)));
        }
        let envelope: ApiEnvelope<serde_json::Value> = response.json().await?;
        if envelope.success {
            Ok(())
        } else {
            Err(AppError::Api(
                envelope.error.unwrap_or_else(|| "unknown error".to_string()),
            ))
        }
    }
}

#[async_trait]
impl NotificationApi for HttpNotificationApi {
    async fn get_unread_count(&self) -> Result<u64> {
        let response = self
            .request(reqwest::Method::GET, "/api/v1/notifications/unread-count")
            .send()
            .await?;
        let data: crate::models::UnreadCount = Self::parse(response).await?;
        debug!(unread_count = data.unread_count, "fetched unread count");
        Ok(data.unread_count)
    }

    async fn mark_by_related(&self, related_id: &str, kind: NotificationType) -> Result<()> {
        let response = self
            .request(reqwest::Method::PUT, "/api/v1/notifications/read-by-related")
            .json(&serde_json::json!({
                "related_id": related_id,
                "type": kind.as_str(),
            }))
            .send()
            .await?;
        Self::expect_ok(response).await
    }

    async fn mark_as_read(&self, notification_id: &str) -> Result<StoredNotification> {
        let response = self
            .request(
                reqwest::Method::PUT,
                &format!("/api/v1/notifications/{}/read", notification_id),
            )
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn mark_all_as_read(&self) -> Result<u64> {
        let response = self
            .request(reqwest::Method::PUT, "/api/v1/notifications/read-all")
            .send()
            .await?;
        let data: CountData = Self::parse(response).await?;
        Ok(data.count)
    }

    async fn delete_notification(&self, notification_id: &str) -> Result<()> {
        let response = self
            .request(
                reqwest::Method::DELETE,
                &format!("/api/v1/notifications/{}", notification_id),
            )
            .send()
            .await?;
        Self::expect_ok(response).await
    }

    async fn get_notifications(&self, query: NotificationQuery) -> Result<NotificationPage> {
        let mut request = self
            .request(reqwest::Method::GET, "/api/v1/notifications")
            .query(&[("page", query.page), ("limit", query.limit)]);
        if let Some(is_read) = query.is_read {
            request = request.query(&[("is_read", is_read)]);
        }
        if let Some(kind) = query.kind {
            request = request.query(&[("type", kind.as_str())]);
        }
        let response = request.send().await?;
        Self::parse(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_success_unwraps_data() {
        let envelope: ApiEnvelope<u64> =
            serde_json::from_str(r#"{"success": true, "data": 7, "error": null}"#).unwrap();
        assert_eq!(envelope.into_data().unwrap(), 7);
    }

    #[test]
    fn test_envelope_failure_surfaces_error() {
        let envelope: ApiEnvelope<u64> =
            serde_json::from_str(r#"{"success": false, "data": null, "error": "forbidden"}"#)
                .unwrap();
        let err = envelope.into_data().unwrap_err();
        assert!(err.to_string().contains("forbidden"));
    }

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let api = HttpNotificationApi::new("http://localhost:4000/", None);
        assert_eq!(api.base_url, "http://localhost:4000");
    }
}

//! Notification Event Router
//!
//! The central policy of the sync engine: given one notification event and the
//! current view context, pick exactly one of three mutually exclusive actions
//! and execute its side effects.
//!
//! 1. Self-suppression: the user triggered the event themselves; do nothing.
//! 2. Silent reconciliation: the user is already looking at the related
//!    content; mark it read, re-fetch the authoritative unread count, and
//!    invalidate only the content-specific partitions. No toast.
//! 3. Default surfacing: toast, optimistic badge increment, list/count
//!    invalidation plus the type-specific partition table.
//!
//! The silent path replaces the badge with the store's count while the default
//! path increments locally; that asymmetry is observed behavior and is kept.

pub mod effects;

pub use effects::{CachePartition, EffectSink, LoggingEffects};

use std::sync::Arc;

use tracing::{debug, warn};

use crate::api::NotificationApi;
use crate::models::{NotificationEvent, NotificationType, ViewContext};

/// Supplies the ambient view state. Implementations must return the state as
/// of the call, not a memoized copy: the user may navigate between event
/// arrival and processing.
pub trait ViewContextSource: Send + Sync {
    fn snapshot(&self) -> ViewContext;
}

/// Shared view context the view layer updates on navigation.
#[derive(Clone, Default)]
pub struct SharedViewContext {
    inner: Arc<std::sync::RwLock<ViewContext>>,
}

impl SharedViewContext {
    pub fn new(ctx: ViewContext) -> Self {
        Self {
            inner: Arc::new(std::sync::RwLock::new(ctx)),
        }
    }

    pub fn update(&self, f: impl FnOnce(&mut ViewContext)) {
        if let Ok(mut guard) = self.inner.write() {
            f(&mut guard);
        }
    }
}

impl ViewContextSource for SharedViewContext {
    fn snapshot(&self) -> ViewContext {
        self.inner
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

/// Which of the three actions the router took, for callers and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    SuppressedSelf,
    Reconciled,
    Surfaced,
}

pub struct NotificationRouter {
    api: Arc<dyn NotificationApi>,
    effects: Arc<dyn EffectSink>,
    view: Arc<dyn ViewContextSource>,
}

impl NotificationRouter {
    pub fn new(
        api: Arc<dyn NotificationApi>,
        effects: Arc<dyn EffectSink>,
        view: Arc<dyn ViewContextSource>,
    ) -> Self {
        Self { api, effects, view }
    }

    /// Process one event. Each event is fault-isolated: reconciliation
    /// failures are logged and swallowed, never rolling back the decision or
    /// blocking subsequent events.
    pub async fn route(&self, event: &NotificationEvent) -> RouteOutcome {
        let ctx = self.view.snapshot();

        if let Some(sender) = event.sender_id.as_deref() {
            if sender == ctx.current_user_id {
                debug!(event_id = %event.id, "suppressing self-generated event");
                return RouteOutcome::SuppressedSelf;
            }
        }

        if let Some(related) = event.related_id.as_deref() {
            if matches_active_view(event.kind, related, &ctx) {
                self.reconcile(event, related).await;
                return RouteOutcome::Reconciled;
            }
        }

        self.surface(event);
        RouteOutcome::Surfaced
    }

    /// The user is viewing the related content: mark read, replace the badge
    /// with the authoritative count, invalidate content-specific partitions.
    async fn reconcile(&self, event: &NotificationEvent, related: &str) {
        debug!(event_id = %event.id, related, "reconciling silently");

        if let Err(e) = self.api.mark_by_related(related, event.kind).await {
            warn!(error = %e, related, "mark-by-related failed during reconciliation");
        }

        match self.api.get_unread_count().await {
            Ok(count) => self.effects.set_badge(count),
            Err(e) => warn!(error = %e, "unread count re-fetch failed; badge left stale"),
        }

        for partition in content_partitions(event.kind, related) {
            self.effects.invalidate(partition);
        }
    }

    /// Event not currently being viewed: toast, optimistic badge increment,
    /// general plus type-specific invalidation.
    fn surface(&self, event: &NotificationEvent) {
        let message = match event.content.as_deref() {
            Some(content) if !content.is_empty() => format!("{}: {}", event.title, content),
            _ => event.title.clone(),
        };
        self.effects.toast(&message);
        self.effects.increment_badge();

        self.effects.invalidate(CachePartition::Notifications);
        self.effects.invalidate(CachePartition::UnreadCount);

        if let Some(related) = event.related_id.as_deref() {
            for partition in surface_partitions(event.kind, related) {
                self.effects.invalidate(partition);
            }
        }
    }
}

/// Whether the event targets what the user is looking at right now.
fn matches_active_view(kind: NotificationType, related: &str, ctx: &ViewContext) -> bool {
    match kind {
        NotificationType::System => ctx.active_conversation_id.as_deref() == Some(related),
        NotificationType::Like | NotificationType::Comment | NotificationType::Reply => {
            ctx.active_post_id.as_deref() == Some(related)
        }
        NotificationType::NewFollower => false,
    }
}

/// Content-specific partitions cleared on the silent path.
fn content_partitions(kind: NotificationType, related: &str) -> Vec<CachePartition> {
    match kind {
        NotificationType::System => vec![
            CachePartition::Conversations,
            CachePartition::Messages(related.to_string()),
        ],
        _ => vec![
            CachePartition::Post(related.to_string()),
            CachePartition::Comments,
        ],
    }
}

/// Type-specific partitions cleared on the surfacing path, applied only when
/// the event carries a related id.
fn surface_partitions(kind: NotificationType, related: &str) -> Vec<CachePartition> {
    match kind {
        NotificationType::System => vec![
            CachePartition::Conversations,
            CachePartition::Messages(related.to_string()),
        ],
        NotificationType::NewFollower => vec![
            CachePartition::Users,
            CachePartition::Followers,
            CachePartition::Following,
        ],
        NotificationType::Comment | NotificationType::Reply => vec![
            CachePartition::Posts,
            CachePartition::Post(related.to_string()),
            CachePartition::Comments,
        ],
        NotificationType::Like => vec![
            CachePartition::Posts,
            CachePartition::Post(related.to_string()),
        ],
    }
}

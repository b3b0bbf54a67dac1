//! Real-time notification synchronization engine for the campus forum client.
//!
//! Three parts, composed as a pipeline:
//! - [`connection::ConnectionManager`] keeps one live connection to the
//!   notification stream and delivers typed [`connection::SyncEvent`]s.
//! - [`router::NotificationRouter`] decides per event whether to suppress it,
//!   reconcile it silently, or surface it, and executes the side effects.
//! - [`grouping::group_notifications`] merges stored notifications into
//!   display groups whenever the list is rendered.

pub mod api;
pub mod center;
pub mod config;
pub mod connection;
pub mod error;
pub mod grouping;
pub mod models;
pub mod router;

pub use api::{HttpNotificationApi, NotificationApi};
pub use center::NotificationCenter;
pub use config::{Config, StreamConfig};
pub use connection::{
    ConnectionManager, ConnectionState, StreamConnection, StreamDialer, StreamEvent, SyncEvent,
    WsDialer,
};
pub use error::{AppError, Result};
pub use grouping::{flatten, group_notifications, NotificationGroup};
pub use models::{
    NotificationEvent, NotificationPage, NotificationQuery, NotificationType, StoredNotification,
    UnreadCount, ViewContext,
};
pub use router::{
    CachePartition, EffectSink, LoggingEffects, NotificationRouter, RouteOutcome,
    SharedViewContext, ViewContextSource,
};

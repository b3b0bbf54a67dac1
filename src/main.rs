use std::sync::Arc;

use notify_sync::{
    Config, ConnectionManager, EffectSink, HttpNotificationApi, LoggingEffects,
    NotificationRouter, SharedViewContext, SyncEvent, ViewContext, WsDialer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("starting notification sync client");

    let config = Config::from_env()?;
    let token = std::env::var("NOTIFY_AUTH_TOKEN").unwrap_or_default();
    let user_id = std::env::var("NOTIFY_USER_ID").unwrap_or_default();

    let api = Arc::new(HttpNotificationApi::new(
        &config.api.base_url,
        (!token.is_empty()).then(|| token.clone()),
    ));
    let effects = Arc::new(LoggingEffects);
    let view = SharedViewContext::new(ViewContext {
        current_user_id: user_id,
        ..Default::default()
    });
    let router = NotificationRouter::new(api, effects.clone(), Arc::new(view));

    let (manager, mut events) = ConnectionManager::new(config.stream, Arc::new(WsDialer));
    manager.connect(&token).await;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                manager.disconnect().await;
                break;
            }
            event = events.recv() => match event {
                Some(SyncEvent::Notification(notification)) => {
                    let outcome = router.route(&notification).await;
                    tracing::debug!(?outcome, notification_id = %notification.id, "routed notification");
                }
                Some(SyncEvent::UnreadCount(count)) => effects.set_badge(count),
                Some(SyncEvent::Connected) => tracing::info!("notification stream connected"),
                Some(SyncEvent::Disconnected) => tracing::warn!("notification stream disconnected"),
                Some(SyncEvent::ConnectError { attempt, message }) => {
                    tracing::warn!(attempt, %message, "stream connection error");
                }
                Some(SyncEvent::ReconnectFailed) => {
                    tracing::error!("stream reconnect gave up; exiting");
                    break;
                }
                None => break,
            },
        }
    }

    Ok(())
}

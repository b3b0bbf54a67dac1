//! Connection Manager
//!
//! Maintains one logical live connection to the notification stream and
//! dispatches every inbound event and lifecycle transition as a typed
//! `SyncEvent` on a single channel.
//!
//! State machine:
//! - `Idle -> Connecting` on `connect(token)` with a non-empty token
//! - `Connecting -> Connected` on handshake success (attempt reset to 0)
//! - `Connected -> Reconnecting` on a transport drop not initiated here
//! - `Connecting|Reconnecting -> Reconnecting` on dial error (attempt + 1)
//! - `Reconnecting -> Failed` once attempt reaches the ceiling; terminal
//!   until the caller issues a fresh `connect`
//! - any state `-> Idle` on `disconnect()`, which also cancels a pending
//!   reconnect timer so nothing fires after teardown

pub mod dialer;
pub mod events;

pub use dialer::{StreamConnection, StreamDialer, WsDialer};
pub use events::{StreamEvent, SyncEvent};

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::StreamConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Connected,
    Reconnecting,
    Failed,
}

pub struct ConnectionManager {
    config: StreamConfig,
    dialer: Arc<dyn StreamDialer>,
    state: Arc<RwLock<ConnectionState>>,
    attempt: Arc<AtomicU32>,
    events_tx: mpsc::UnboundedSender<SyncEvent>,
    outbound: Arc<RwLock<Option<mpsc::UnboundedSender<String>>>>,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl ConnectionManager {
    /// Create a manager plus the single event channel its consumer reads.
    pub fn new(
        config: StreamConfig,
        dialer: Arc<dyn StreamDialer>,
    ) -> (Self, mpsc::UnboundedReceiver<SyncEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let manager = Self {
            config,
            dialer,
            state: Arc::new(RwLock::new(ConnectionState::Idle)),
            attempt: Arc::new(AtomicU32::new(0)),
            events_tx,
            outbound: Arc::new(RwLock::new(None)),
            driver: Mutex::new(None),
        };
        (manager, events_rx)
    }

    /// Start connecting. A missing token leaves the manager idle; no
    /// connection is attempted.
    pub async fn connect(&self, token: &str) {
        if token.trim().is_empty() {
            warn!("connect called without an auth token; staying idle");
            return;
        }

        // Tear down any previous driver before starting over.
        self.disconnect().await;

        self.attempt.store(0, Ordering::SeqCst);
        *self.state.write().await = ConnectionState::Connecting;
        info!(url = %self.config.url, "connecting to notification stream");

        let handle = tokio::spawn(drive(
            self.config.clone(),
            Arc::clone(&self.dialer),
            Arc::clone(&self.state),
            Arc::clone(&self.attempt),
            Arc::clone(&self.outbound),
            self.events_tx.clone(),
            token.to_string(),
        ));
        *self.driver.lock().await = Some(handle);
    }

    /// Explicit teardown. Aborts the driver task, which cancels any pending
    /// reconnect timer; no transition fires afterwards.
    pub async fn disconnect(&self) {
        if let Some(handle) = self.driver.lock().await.take() {
            handle.abort();
        }
        *self.outbound.write().await = None;
        *self.state.write().await = ConnectionState::Idle;
        debug!("notification stream torn down");
    }

    /// Send an outbound frame. No-op with a warning unless connected.
    pub async fn emit(&self, event: &str, payload: serde_json::Value) {
        if *self.state.read().await != ConnectionState::Connected {
            warn!(event, "emit ignored; stream is not connected");
            return;
        }
        let frame = serde_json::json!({ "event": event, "data": payload }).to_string();
        match self.outbound.read().await.as_ref() {
            Some(tx) => {
                if tx.send(frame).is_err() {
                    warn!(event, "outbound channel closed; frame dropped");
                }
            }
            None => warn!(event, "emit ignored; stream is not connected"),
        }
    }

    pub async fn state(&self) -> ConnectionState {
        *self.state.read().await
    }

    pub fn attempt(&self) -> u32 {
        self.attempt.load(Ordering::SeqCst)
    }
}

/// Connection driver: dial, pump inbound frames, schedule reconnects.
/// Runs until the attempt ceiling is reached or the task is aborted.
#[allow(clippy::too_many_arguments)]
async fn drive(
    config: StreamConfig,
    dialer: Arc<dyn StreamDialer>,
    state: Arc<RwLock<ConnectionState>>,
    attempt: Arc<AtomicU32>,
    outbound: Arc<RwLock<Option<mpsc::UnboundedSender<String>>>>,
    events_tx: mpsc::UnboundedSender<SyncEvent>,
    token: String,
) {
    loop {
        match dialer.dial(&config.url, &token).await {
            Ok(conn) => {
                attempt.store(0, Ordering::SeqCst);
                *state.write().await = ConnectionState::Connected;
                *outbound.write().await = Some(conn.outbound);
                let _ = events_tx.send(SyncEvent::Connected);
                info!("notification stream connected");

                let mut inbound = conn.inbound;
                while let Some(raw) = inbound.recv().await {
                    match events::decode_frame(&raw) {
                        Ok(event) => {
                            let _ = events_tx.send(event.into());
                        }
                        Err(e) => warn!(error = %e, "dropping malformed stream frame"),
                    }
                }

                // Transport dropped out from under us.
                *outbound.write().await = None;
                *state.write().await = ConnectionState::Reconnecting;
                let _ = events_tx.send(SyncEvent::Disconnected);
                warn!("notification stream lost; scheduling reconnect");
            }
            Err(e) => {
                let attempts = attempt.fetch_add(1, Ordering::SeqCst) + 1;
                *state.write().await = ConnectionState::Reconnecting;
                let _ = events_tx.send(SyncEvent::ConnectError {
                    attempt: attempts,
                    message: e.to_string(),
                });
                warn!(attempt = attempts, error = %e, "stream connect failed");

                if attempts >= config.max_reconnect_attempts {
                    *state.write().await = ConnectionState::Failed;
                    let _ = events_tx.send(SyncEvent::ReconnectFailed);
                    error!(
                        attempts,
                        "reconnect ceiling reached; waiting for an explicit connect"
                    );
                    return;
                }
            }
        }

        // Pending reconnect timer; cancelled when disconnect() aborts us.
        sleep(Duration::from_millis(config.reconnect_interval_ms)).await;
    }
}

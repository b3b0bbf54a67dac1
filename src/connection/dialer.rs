//! Stream transport seam
//!
//! `StreamDialer` abstracts one dial attempt so the connection manager can be
//! exercised in tests with scripted outcomes. `WsDialer` is the production
//! implementation over tokio-tungstenite.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use tracing::{debug, warn};

use crate::error::Result;

/// An established stream connection.
///
/// `outbound` carries serialized frames to the server; `inbound` yields raw
/// text frames. The connection is considered dropped when `inbound` closes,
/// and dropping `outbound` tears the transport down.
pub struct StreamConnection {
    pub outbound: mpsc::UnboundedSender<String>,
    pub inbound: mpsc::UnboundedReceiver<String>,
}

#[async_trait]
pub trait StreamDialer: Send + Sync {
    async fn dial(&self, url: &str, token: &str) -> Result<StreamConnection>;
}

/// WebSocket dialer. Authenticates by passing the token as a query parameter,
/// answers transport pings in the pump task, and forwards text frames.
pub struct WsDialer;

#[async_trait]
impl StreamDialer for WsDialer {
    async fn dial(&self, url: &str, token: &str) -> Result<StreamConnection> {
        let separator = if url.contains('?') { '&' } else { '?' };
        let url = format!("{}{}token={}", url, separator, token);

        let (socket, _response) = connect_async(url).await?;
        debug!("websocket handshake complete");

        let (mut write, mut read) = socket.split();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<String>();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel::<String>();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    frame = read.next() => match frame {
                        Some(Ok(Message::Text(text))) => {
                            if inbound_tx.send(text.to_string()).is_err() {
                                break;
                            }
                        }
                        Some(Ok(Message::Ping(payload))) => {
                            let _ = write.send(Message::Pong(payload)).await;
                        }
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            warn!(error = %e, "websocket read error");
                            break;
                        }
                    },
                    payload = outbound_rx.recv() => match payload {
                        Some(payload) => {
                            if write.send(Message::Text(payload.into())).await.is_err() {
                                break;
                            }
                        }
                        // Manager dropped its sender: intentional teardown.
                        None => break,
                    },
                }
            }
            debug!("websocket pump stopped");
        });

        Ok(StreamConnection {
            outbound: outbound_tx,
            inbound: inbound_rx,
        })
    }
}

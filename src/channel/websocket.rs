//! Websocket push transport

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use super::transport::PushTransport;
use crate::error::ChannelError;

/// Push transport over a websocket connection to the relay
pub struct WebSocketTransport {
    tx: mpsc::UnboundedSender<String>,
}

impl WebSocketTransport {
    /// Connect to `url`, returning the transport and the inbound frame stream
    ///
    /// A writer task drains outbound frames and a reader task forwards text
    /// frames until the socket closes.
    pub async fn connect(url: &str) -> Result<(Self, mpsc::UnboundedReceiver<String>), ChannelError> {
        let (stream, _) = connect_async(url)
            .await
            .map_err(|e| ChannelError::Connect(e.to_string()))?;
        info!(url = %url, "push channel connected");

        let (mut sink, mut source) = stream.split();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
        let (in_tx, in_rx) = mpsc::unbounded_channel::<String>();

        tokio::spawn(async move {
            while let Some(frame) = out_rx.recv().await {
                if let Err(e) = sink.send(Message::Text(frame)).await {
                    warn!(error = %e, "push channel send failed");
                    break;
                }
            }
            let _ = sink.close().await;
        });

        tokio::spawn(async move {
            while let Some(message) = source.next().await {
                let frame = match message {
                    Ok(Message::Text(text)) => text,
                    Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                        Ok(text) => text,
                        Err(_) => {
                            warn!("dropping non-UTF-8 push frame");
                            continue;
                        }
                    },
                    Ok(Message::Close(_)) => break,
                    // ping/pong are answered by tungstenite
                    Ok(_) => continue,
                    Err(e) => {
                        warn!(error = %e, "push channel receive failed");
                        break;
                    }
                };
                if in_tx.send(frame).is_err() {
                    debug!("inbound consumer dropped");
                    break;
                }
            }
            info!("push channel closed");
        });

        Ok((Self { tx: out_tx }, in_rx))
    }
}

impl PushTransport for WebSocketTransport {
    fn send(&self, frame: String) -> Result<(), ChannelError> {
        self.tx.send(frame).map_err(|_| ChannelError::Closed)
    }
}

//! Push transports
//!
//! A transport only enqueues outbound frames; inbound frames are handed to
//! the session as a stream by whoever created the transport.

use tokio::sync::broadcast;
use tracing::debug;

use super::messages::OutboundMessage;
use crate::error::ChannelError;

/// Non-blocking sink for outbound push frames
pub trait PushTransport: Send + Sync {
    fn send(&self, frame: String) -> Result<(), ChannelError>;
}

/// Transport for sessions without a push channel; frames are dropped
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedTransport;

impl PushTransport for DetachedTransport {
    fn send(&self, frame: String) -> Result<(), ChannelError> {
        debug!(len = frame.len(), "no push channel, dropping frame");
        Ok(())
    }
}

/// In-process relay connecting several replicas
///
/// Behaves like the server relay: `git_hash_selected` reaches peers as
/// `other_hash_selected`, and `row_selected` goes to every member including
/// its sender.
#[derive(Clone)]
pub struct LoopbackHub {
    tx: broadcast::Sender<String>,
}

impl LoopbackHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Join the hub: a transport for sending and a receiver of relayed frames
    pub fn join(&self) -> (LoopbackTransport, broadcast::Receiver<String>) {
        (
            LoopbackTransport {
                tx: self.tx.clone(),
            },
            self.tx.subscribe(),
        )
    }

    /// Inject a server-originated frame, e.g. `graph_data`
    pub fn push(&self, frame: impl Into<String>) {
        let _ = self.tx.send(frame.into());
    }

    pub fn member_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for LoopbackHub {
    fn default() -> Self {
        Self::new(256)
    }
}

pub struct LoopbackTransport {
    tx: broadcast::Sender<String>,
}

impl PushTransport for LoopbackTransport {
    fn send(&self, frame: String) -> Result<(), ChannelError> {
        let message: OutboundMessage =
            serde_json::from_str(&frame).map_err(|e| ChannelError::Encode(e.to_string()))?;
        let relayed = serde_json::to_string(&message.relayed())
            .map_err(|e| ChannelError::Encode(e.to_string()))?;
        // No members is fine
        let _ = self.tx.send(relayed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::messages::InboundMessage;

    #[tokio::test]
    async fn test_hub_relays_to_every_member() {
        let hub = LoopbackHub::new(8);
        let (left, mut left_rx) = hub.join();
        let (_right, mut right_rx) = hub.join();
        assert_eq!(hub.member_count(), 2);

        let frame = r#"{"event":"git_hash_selected","payload":{"hash":"abc","selected":true}}"#;
        left.send(frame.to_string()).unwrap();

        for rx in [&mut left_rx, &mut right_rx] {
            let relayed: InboundMessage = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
            assert!(matches!(relayed, InboundMessage::OtherHashSelected { .. }));
        }
    }

    #[test]
    fn test_hub_rejects_unknown_outbound() {
        let hub = LoopbackHub::new(8);
        let (transport, _rx) = hub.join();
        let err = transport.send(r#"{"event":"graph_nodes"}"#.to_string()).unwrap_err();
        assert!(matches!(err, ChannelError::Encode(_)));
    }

    #[test]
    fn test_detached_accepts_everything() {
        assert!(DetachedTransport.send("anything".to_string()).is_ok());
    }
}

//! Remote event channel
//!
//! Emits local selection changes to peers and decodes what the relay pushes
//! back. Applying inbound messages is the session's job.

mod messages;
mod transport;
mod websocket;

use std::sync::Arc;

use tracing::debug;

use crate::error::{ChannelError, ProtocolError};
use crate::types::{GraphId, ReplicaId, SelectionEvent};

pub use messages::{InboundMessage, OutboundMessage, RowData, RowSelection};
pub use transport::{DetachedTransport, LoopbackHub, LoopbackTransport, PushTransport};
pub use websocket::WebSocketTransport;

/// Outbound half of the push channel, tagged with this replica's id
#[derive(Clone)]
pub struct RemoteEventChannel {
    transport: Arc<dyn PushTransport>,
    replica: ReplicaId,
}

impl RemoteEventChannel {
    pub fn new(transport: Arc<dyn PushTransport>, replica: ReplicaId) -> Self {
        Self { transport, replica }
    }

    /// Channel that talks to no one
    pub fn detached(replica: ReplicaId) -> Self {
        Self::new(Arc::new(DetachedTransport), replica)
    }

    pub fn replica(&self) -> &ReplicaId {
        &self.replica
    }

    /// Broadcast a local selection change as `row_selected`
    pub fn emit_selection(&self, event: &SelectionEvent, name: &str) -> Result<(), ChannelError> {
        self.emit(&OutboundMessage::RowSelected(RowSelection::from_event(event, name)))
    }

    /// Broadcast a graph file switch as `git_hash_selected`
    pub fn emit_graph_selected(&self, graph: &GraphId) -> Result<(), ChannelError> {
        self.emit(&OutboundMessage::GitHashSelected {
            hash: graph.clone(),
            selected: true,
            origin: Some(self.replica.clone()),
        })
    }

    fn emit(&self, message: &OutboundMessage) -> Result<(), ChannelError> {
        let frame = serde_json::to_string(message).map_err(|e| ChannelError::Encode(e.to_string()))?;
        debug!(frame = %frame, "emit");
        self.transport.send(frame)
    }

    /// Decode one inbound frame
    pub fn decode(frame: &str) -> Result<InboundMessage, ProtocolError> {
        serde_json::from_str(frame).map_err(|e| ProtocolError::Malformed(e.to_string()))
    }
}

//! Selection events exchanged between replicas

use serde::{Deserialize, Serialize};

use super::{NodeId, ReplicaId};

/// One node selection change, tagged with the replica that made it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionEvent {
    pub node_id: NodeId,
    pub selected: bool,
    pub origin: ReplicaId,
}

impl SelectionEvent {
    pub fn new(node_id: impl Into<NodeId>, selected: bool, origin: ReplicaId) -> Self {
        Self {
            node_id: node_id.into(),
            selected,
            origin,
        }
    }

    /// Whether this event was produced by `replica`
    pub fn is_from(&self, replica: &ReplicaId) -> bool {
        &self.origin == replica
    }
}

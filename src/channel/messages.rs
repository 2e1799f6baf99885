//! Push channel message types
//!
//! Every frame is a JSON object `{"event": <name>, "payload": {...}}`.

use serde::{Deserialize, Serialize};

use crate::types::{
    GraphAnalysis, GraphId, NodeDetail, NodeId, NodeList, Projection, ReplicaId, SelectionEvent,
};

/// Row payload of `row_selected`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowData {
    pub node: NodeId,
    #[serde(default)]
    pub name: String,
}

/// A node selection toggled in some replica's list view
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowSelection {
    pub data: RowData,
    #[serde(rename = "isSelected")]
    pub is_selected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<ReplicaId>,
}

impl RowSelection {
    pub fn from_event(event: &SelectionEvent, name: impl Into<String>) -> Self {
        Self {
            data: RowData {
                node: event.node_id.clone(),
                name: name.into(),
            },
            is_selected: event.selected,
            origin: Some(event.origin.clone()),
        }
    }

    /// Selection event carried by this row; a missing origin is foreign
    pub fn to_event(&self) -> SelectionEvent {
        SelectionEvent::new(
            self.data.node.clone(),
            self.is_selected,
            self.origin.clone().unwrap_or_default(),
        )
    }
}

/// Messages a replica sends to the relay
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// The active graph file was switched
    GitHashSelected {
        hash: GraphId,
        selected: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        origin: Option<ReplicaId>,
    },

    /// A node was selected or deselected
    RowSelected(RowSelection),
}

impl OutboundMessage {
    /// What peers receive once the relay forwards this message
    pub fn relayed(self) -> InboundMessage {
        match self {
            OutboundMessage::GitHashSelected {
                hash,
                selected,
                origin,
            } => InboundMessage::OtherHashSelected {
                hash,
                selected,
                origin,
            },
            OutboundMessage::RowSelected(row) => InboundMessage::RowSelected(row),
        }
    }
}

/// Messages a replica receives from the relay
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum InboundMessage {
    /// Another replica switched graph files
    OtherHashSelected {
        hash: GraphId,
        #[serde(default)]
        selected: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        origin: Option<ReplicaId>,
    },

    /// Node catalog of the active graph
    GraphNodes {
        #[serde(rename = "graphData")]
        graph_data: NodeList,
    },

    /// Projection and/or full selection pushed by the server
    GraphData {
        #[serde(rename = "graphData", default, skip_serializing_if = "Option::is_none")]
        graph_data: Option<Projection>,
        #[serde(rename = "selectedNodes", default, skip_serializing_if = "Option::is_none")]
        selected_nodes: Option<Vec<NodeId>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        origin: Option<ReplicaId>,
    },

    /// Whole-graph analysis counts
    GraphResults(GraphAnalysis),

    /// Details for the selected nodes
    NodeInfos {
        #[serde(rename = "nodeInfos", default)]
        node_infos: Vec<NodeDetail>,
    },

    /// Relayed selection change of some replica, possibly this one
    RowSelected(RowSelection),
}

impl InboundMessage {
    /// Message name for logs
    pub fn name(&self) -> &'static str {
        match self {
            InboundMessage::OtherHashSelected { .. } => "other_hash_selected",
            InboundMessage::GraphNodes { .. } => "graph_nodes",
            InboundMessage::GraphData { .. } => "graph_data",
            InboundMessage::GraphResults(_) => "graph_results",
            InboundMessage::NodeInfos { .. } => "node_infos",
            InboundMessage::RowSelected(_) => "row_selected",
        }
    }
}

//! Graph projection and graph file types

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::{Edge, GraphId, Node, NodeId};

/// Server-computed subgraph for one fingerprint
///
/// Replaced wholesale on every successful fetch; never patched in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projection {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(rename = "links", default)]
    pub edges: Vec<Edge>,
    #[serde(rename = "links_trans", default)]
    pub transitive_edges: Vec<Edge>,
}

impl Projection {
    /// Create a projection from nodes and edges
    pub fn with_data(nodes: Vec<Node>, edges: Vec<Edge>, transitive_edges: Vec<Edge>) -> Self {
        Self {
            nodes,
            edges,
            transitive_edges,
        }
    }

    /// Check if the projection is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    /// Edges to draw: direct ones, plus transitive ones when requested
    pub fn visible_edges(&self, transitive: bool) -> impl Iterator<Item = &Edge> {
        let extra: &[Edge] = if transitive { self.transitive_edges.as_slice() } else { &[] };
        self.edges.iter().chain(extra.iter())
    }

    /// Copies of the nodes with `selected` taken from the selection store
    ///
    /// The server's own flags are ignored so projection contents never
    /// override the authoritative selection.
    pub fn nodes_marked(&self, selected: &BTreeSet<NodeId>) -> Vec<Node> {
        self.nodes
            .iter()
            .map(|n| n.with_selected(selected.contains(&n.id)))
            .collect()
    }
}

/// Graph file offered by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphFile {
    pub id: u64,
    pub git: GraphId,
    #[serde(default)]
    pub selected: bool,
}

/// Whole-graph analysis counts (`graph_results`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphAnalysis {
    #[serde(flatten)]
    pub counts: BTreeMap<String, serde_json::Value>,
}

impl GraphAnalysis {
    /// Integer count for a metric, if present and numeric
    pub fn count(&self, metric: &str) -> Option<u64> {
        self.counts.get(metric).and_then(|v| v.as_u64())
    }
}

//! Read model assembled for view adapters

use std::sync::Arc;

use crate::path::PathState;
use crate::selection::SelectionSnapshot;
use crate::types::{Edge, Fingerprint, GraphAnalysis, GraphFile, Node, NodeDetail, NodeId, Projection};

/// Everything a view adapter renders, read at one instant
#[derive(Debug, Clone)]
pub struct ViewState {
    pub snapshot: Arc<SelectionSnapshot>,
    /// Last good projection, possibly older than the selection
    pub projection: Option<Arc<Projection>>,
    pub projection_fingerprint: Option<Fingerprint>,
    pub details: Option<Arc<Vec<NodeDetail>>>,
    pub path: PathState,
    pub graph_files: Vec<GraphFile>,
    pub analysis: Option<GraphAnalysis>,
}

impl ViewState {
    /// Whether the displayed projection matches the current selection
    pub fn is_settled(&self) -> bool {
        self.projection_fingerprint.is_some() && self.projection_fingerprint == self.snapshot.fingerprint()
    }

    /// Canvas nodes, with selection flags taken from the store
    pub fn canvas_nodes(&self) -> Vec<Node> {
        self.projection
            .as_ref()
            .map(|p| p.nodes_marked(self.snapshot.selected()))
            .unwrap_or_default()
    }

    /// Canvas edges, transitive ones only when the flag is on
    pub fn canvas_edges(&self) -> Vec<&Edge> {
        self.projection
            .as_ref()
            .map(|p| p.visible_edges(self.snapshot.transitive()).collect())
            .unwrap_or_default()
    }

    /// Rows of the node list view
    pub fn list_rows(&self) -> Vec<Node> {
        self.snapshot.nodes()
    }

    /// Highlighted path, if a path set is ready and one is chosen
    pub fn highlighted_path(&self) -> Option<&[NodeId]> {
        match &self.path {
            PathState::Ready(set) => set.selected_path(),
            _ => None,
        }
    }
}

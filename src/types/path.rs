//! Path discovery types

use serde::{Deserialize, Serialize};

use super::NodeId;

/// Server answer to a from/to path query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathResponse {
    #[serde(rename = "fromNode")]
    pub from_node: NodeId,
    #[serde(rename = "toNode")]
    pub to_node: NodeId,
    #[serde(default)]
    pub paths: Vec<Vec<NodeId>>,
    /// Path nodes the current selection does not already include
    #[serde(rename = "extraNodes", default)]
    pub extra_nodes: Vec<NodeId>,
}

/// Discovered paths between two nodes and the highlighted one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSet {
    pub from_node: NodeId,
    pub to_node: NodeId,
    pub paths: Vec<Vec<NodeId>>,
    /// Index into `paths`, or -1 when no path is highlighted
    pub selected_path_index: isize,
}

impl PathSet {
    /// Create a path set with nothing highlighted
    pub fn new(from_node: NodeId, to_node: NodeId, paths: Vec<Vec<NodeId>>) -> Self {
        Self {
            from_node,
            to_node,
            paths,
            selected_path_index: -1,
        }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// The highlighted path, if any
    pub fn selected_path(&self) -> Option<&[NodeId]> {
        usize::try_from(self.selected_path_index)
            .ok()
            .and_then(|i| self.paths.get(i))
            .map(Vec::as_slice)
    }

    /// Whether `index` lies in `[-1, len)`
    pub fn accepts_index(&self, index: isize) -> bool {
        index == -1 || usize::try_from(index).map_or(false, |i| i < self.paths.len())
    }
}

impl From<PathResponse> for PathSet {
    fn from(response: PathResponse) -> Self {
        PathSet::new(response.from_node, response.to_node, response.paths)
    }
}

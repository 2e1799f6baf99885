//! Node types for the dependency graph

use serde::{Deserialize, Serialize};

use super::NodeId;

/// Build artifact in a dependency graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(rename = "node", default)]
    pub external_key: String,
    #[serde(rename = "name", default)]
    pub display_name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub selected: bool,
}

impl Node {
    /// Create an unselected node whose external key equals its id
    pub fn new(id: impl Into<NodeId>, display_name: impl Into<String>, kind: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            external_key: id.to_string(),
            id,
            display_name: display_name.into(),
            kind: kind.into(),
            selected: false,
        }
    }

    /// Copy of this node with the selection flag replaced
    pub fn with_selected(&self, selected: bool) -> Self {
        Self {
            selected,
            ..self.clone()
        }
    }
}

/// Attribute row shown in the node inspector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAttribute {
    pub name: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

/// Neighbour of a node together with the symbols linking them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeLink {
    pub node: NodeId,
    #[serde(default)]
    pub symbols: Vec<String>,
}

/// Detailed information for one selected node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDetail {
    pub id: NodeId,
    #[serde(default)]
    pub node: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub attribs: Vec<NodeAttribute>,
    #[serde(default)]
    pub dependers: Vec<NodeLink>,
    #[serde(default)]
    pub dependencies: Vec<NodeLink>,
}

/// Node list payload of `graph_nodes` and `GET /nodes`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeList {
    #[serde(default)]
    pub nodes: Vec<Node>,
}

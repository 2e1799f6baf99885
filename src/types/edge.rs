//! Link dependency edges

use serde::{Deserialize, Serialize};

use super::NodeId;

/// Link visibility of a dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "VisibilityRepr")]
pub enum Visibility {
    Global,
    #[default]
    Public,
    Private,
    Interface,
}

/// Servers send visibility either as its numeric code or its name
#[derive(Deserialize)]
#[serde(untagged)]
enum VisibilityRepr {
    Code(u8),
    Name(String),
}

impl TryFrom<VisibilityRepr> for Visibility {
    type Error = String;

    fn try_from(repr: VisibilityRepr) -> Result<Self, Self::Error> {
        match repr {
            VisibilityRepr::Code(0) => Ok(Visibility::Global),
            VisibilityRepr::Code(1) => Ok(Visibility::Public),
            VisibilityRepr::Code(2) => Ok(Visibility::Private),
            VisibilityRepr::Code(3) => Ok(Visibility::Interface),
            VisibilityRepr::Code(other) => Err(format!("unknown visibility code {}", other)),
            VisibilityRepr::Name(name) => match name.to_ascii_lowercase().as_str() {
                "global" => Ok(Visibility::Global),
                "public" => Ok(Visibility::Public),
                "private" => Ok(Visibility::Private),
                "interface" => Ok(Visibility::Interface),
                _ => Err(format!("unknown visibility '{}'", name)),
            },
        }
    }
}

fn default_direct() -> bool {
    true
}

/// Dependency edge between two nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    #[serde(rename = "source")]
    pub source_id: NodeId,
    #[serde(rename = "target")]
    pub target_id: NodeId,
    #[serde(default = "default_direct")]
    pub direct: bool,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub symbols: Vec<String>,
}

impl Edge {
    /// Create a direct public edge without symbols
    pub fn direct(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            source_id: source.into(),
            target_id: target.into(),
            direct: true,
            visibility: Visibility::Public,
            symbols: Vec::new(),
        }
    }

    /// Create a transitive edge
    pub fn transitive(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            direct: false,
            ..Self::direct(source, target)
        }
    }
}

//! Data types for the dependency graph client
//!
//! This module contains the core data structures shared by the store,
//! the caches, the gateway and the push channel.

mod edge;
mod event;
mod fingerprint;
mod graph;
mod ids;
mod node;
mod path;

pub use edge::{Edge, Visibility};
pub use event::SelectionEvent;
pub use fingerprint::{DetailsKey, Fingerprint, ProjectionKey};
pub use graph::{GraphAnalysis, GraphFile, Projection};
pub use ids::{GraphId, NodeId, ReplicaId};
pub use node::{Node, NodeAttribute, NodeDetail, NodeLink, NodeList};
pub use path::{PathResponse, PathSet};

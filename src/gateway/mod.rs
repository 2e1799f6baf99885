//! Query gateway to the graph server
//!
//! Every call is a suspension point. The gateway has no retry policy of its
//! own; retries are always new, explicit requests from the caller.

mod http;
mod wire;

#[cfg(test)]
pub(crate) mod mock;

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::error::QueryError;
use crate::types::{
    GraphAnalysis, GraphFile, GraphId, Node, NodeDetail, NodeId, PathResponse, Projection,
    ProjectionKey,
};

pub use http::HttpGateway;
pub use wire::{
    AnalysisResponse, DetailsRequest, DetailsResponse, GraphFilesResponse, PathRequest,
    ProjectionRequest, ProjectionResponse,
};

/// Network operations the client core depends on
#[async_trait]
pub trait QueryGateway: Send + Sync {
    /// List the graph files the server can serve
    async fn list_graph_files(&self) -> Result<Vec<GraphFile>, QueryError>;

    /// Full node catalog of a graph
    async fn fetch_nodes(&self, graph: &GraphId) -> Result<Vec<Node>, QueryError>;

    /// Whole-graph analysis counts
    async fn fetch_analysis(&self, graph: &GraphId) -> Result<GraphAnalysis, QueryError>;

    /// Projection for a selection; idempotent and safe to re-issue
    async fn fetch_projection(&self, key: &ProjectionKey) -> Result<Projection, QueryError>;

    /// Details for the selected nodes
    async fn fetch_node_details(
        &self,
        graph: &GraphId,
        selected: &BTreeSet<NodeId>,
        transitive: bool,
    ) -> Result<Vec<NodeDetail>, QueryError>;

    /// Paths between two nodes plus the nodes needed to draw them
    async fn fetch_path(
        &self,
        graph: &GraphId,
        from: &NodeId,
        to: &NodeId,
    ) -> Result<PathResponse, QueryError>;
}

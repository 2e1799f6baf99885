//! HTTP implementation of the query gateway

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::wire::{
    AnalysisResponse, DetailsRequest, DetailsResponse, GraphFilesResponse, PathRequest,
    ProjectionRequest, ProjectionResponse,
};
use super::QueryGateway;
use crate::error::{Error, QueryError, Result};
use crate::types::{
    GraphAnalysis, GraphFile, GraphId, Node, NodeDetail, NodeId, NodeList, PathResponse,
    Projection, ProjectionKey,
};

/// Gateway talking to the graph server's REST API
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    /// Create a gateway for `base_url` with the transport timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(client, base_url))
    }

    /// Create a gateway sharing an existing client
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn graph_url(&self, graph: &GraphId, resource: &str) -> String {
        format!(
            "{}/api/graphs/{}/{}",
            self.base_url,
            urlencoding::encode(graph.as_str()),
            resource
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> std::result::Result<T, QueryError> {
        debug!(url = %url, "GET");
        let response = self.client.get(&url).send().await.map_err(network)?;
        decode(response).await
    }

    async fn post_json<B, T>(&self, url: String, body: &B) -> std::result::Result<T, QueryError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!(url = %url, "POST");
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(network)?;
        decode(response).await
    }
}

fn network(error: reqwest::Error) -> QueryError {
    QueryError::Network(error.to_string())
}

/// Map status and payload problems onto the error taxonomy
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> std::result::Result<T, QueryError> {
    let status = response.status();
    let body = response.bytes().await.map_err(network)?;

    if !status.is_success() {
        return Err(QueryError::Server {
            status: status.as_u16(),
            message: String::from_utf8_lossy(&body).trim().to_string(),
        });
    }

    serde_json::from_slice(&body).map_err(|e| QueryError::Malformed(e.to_string()))
}

#[async_trait]
impl QueryGateway for HttpGateway {
    async fn list_graph_files(&self) -> std::result::Result<Vec<GraphFile>, QueryError> {
        let url = format!("{}/graph_files", self.base_url);
        let response: GraphFilesResponse = self.get_json(url).await?;
        Ok(response.graph_files)
    }

    async fn fetch_nodes(&self, graph: &GraphId) -> std::result::Result<Vec<Node>, QueryError> {
        let response: NodeList = self.get_json(self.graph_url(graph, "nodes")).await?;
        Ok(response.nodes)
    }

    async fn fetch_analysis(&self, graph: &GraphId) -> std::result::Result<GraphAnalysis, QueryError> {
        let response: AnalysisResponse = self.get_json(self.graph_url(graph, "analysis")).await?;
        Ok(response.results)
    }

    async fn fetch_projection(&self, key: &ProjectionKey) -> std::result::Result<Projection, QueryError> {
        let body = ProjectionRequest::from(key);
        let response: ProjectionResponse = self.post_json(self.graph_url(&key.graph, "d3"), &body).await?;
        Ok(response.graph_data)
    }

    async fn fetch_node_details(
        &self,
        graph: &GraphId,
        selected: &BTreeSet<NodeId>,
        transitive: bool,
    ) -> std::result::Result<Vec<NodeDetail>, QueryError> {
        let body = DetailsRequest {
            selected_nodes: selected.iter().cloned().collect(),
            transitive_edges: transitive,
        };
        let response: DetailsResponse = self
            .post_json(self.graph_url(graph, "nodes/details"), &body)
            .await?;
        Ok(response.node_infos)
    }

    async fn fetch_path(
        &self,
        graph: &GraphId,
        from: &NodeId,
        to: &NodeId,
    ) -> std::result::Result<PathResponse, QueryError> {
        let body = PathRequest {
            from_node: from.clone(),
            to_node: to.clone(),
        };
        self.post_json(self.graph_url(graph, "paths"), &body).await
    }
}

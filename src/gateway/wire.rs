//! REST request and response bodies

use serde::{Deserialize, Serialize};

use crate::types::{GraphAnalysis, GraphFile, GraphId, NodeDetail, NodeId, Projection, ProjectionKey};

/// Body of `POST /api/graphs/{graphId}/d3`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionRequest {
    pub selected_nodes: Vec<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_nodes: Option<Vec<NodeId>>,
    pub transitive_edges: bool,
}

impl From<&ProjectionKey> for ProjectionRequest {
    fn from(key: &ProjectionKey) -> Self {
        Self {
            selected_nodes: key.selected.iter().cloned().collect(),
            extra_nodes: if key.extra.is_empty() {
                None
            } else {
                Some(key.extra.iter().cloned().collect())
            },
            transitive_edges: key.transitive,
        }
    }
}

/// Response of `POST /api/graphs/{graphId}/d3`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectionResponse {
    #[serde(rename = "graphData")]
    pub graph_data: Projection,
}

/// Body of `POST /api/graphs/{graphId}/nodes/details`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailsRequest {
    pub selected_nodes: Vec<NodeId>,
    pub transitive_edges: bool,
}

/// Response of `POST /api/graphs/{graphId}/nodes/details`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetailsResponse {
    #[serde(rename = "nodeInfos", default)]
    pub node_infos: Vec<NodeDetail>,
}

/// Body of `POST /api/graphs/{graphId}/paths`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathRequest {
    #[serde(rename = "fromNode")]
    pub from_node: NodeId,
    #[serde(rename = "toNode")]
    pub to_node: NodeId,
}

/// Response of `GET /graph_files`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphFilesResponse {
    #[serde(default)]
    pub graph_files: Vec<GraphFile>,
}

/// Response of `GET /api/graphs/{graphId}/analysis`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisResponse {
    #[serde(rename = "selectedGraph", default, skip_serializing_if = "Option::is_none")]
    pub selected_graph: Option<GraphId>,
    #[serde(default)]
    pub results: GraphAnalysis,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_projection_request_sorts_and_omits_empty_extra() {
        let selected: BTreeSet<NodeId> = ["b", "a"].into_iter().map(NodeId::from).collect();
        let key = ProjectionKey::new(GraphId::from("g"), selected, true);

        let body = serde_json::to_value(ProjectionRequest::from(&key)).unwrap();
        assert_eq!(body["selected_nodes"], serde_json::json!(["a", "b"]));
        assert_eq!(body["transitive_edges"], serde_json::json!(true));
        assert!(body.get("extra_nodes").is_none());
    }

    #[test]
    fn test_projection_request_carries_extra_nodes() {
        let key = ProjectionKey::new(GraphId::from("g"), BTreeSet::new(), false)
            .with_extra([NodeId::from("c")].into_iter().collect());

        let body = serde_json::to_value(ProjectionRequest::from(&key)).unwrap();
        assert_eq!(body["extra_nodes"], serde_json::json!(["c"]));
    }

    #[test]
    fn test_graph_files_response() {
        let json = r#"{"graph_files":[{"id":0,"git":"abc123","selected":true},{"id":1,"git":"def456","selected":false}]}"#;
        let response: GraphFilesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.graph_files.len(), 2);
        assert!(response.graph_files[0].selected);
    }
}

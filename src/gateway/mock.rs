//! Scriptable gateway for unit tests
//!
//! Records every call, synthesizes deterministic projections from the request
//! key, and can hold a response behind a gate or fail the next call.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use super::QueryGateway;
use crate::error::QueryError;
use crate::types::{
    DetailsKey, Edge, Fingerprint, GraphAnalysis, GraphFile, GraphId, Node, NodeDetail, NodeId,
    PathResponse, Projection, ProjectionKey,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum GatewayCall {
    GraphFiles,
    Nodes(GraphId),
    Analysis(GraphId),
    Projection(ProjectionKey),
    NodeDetails(DetailsKey),
    Path { from: NodeId, to: NodeId },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum GateKey {
    Projection(Fingerprint),
    Details(Fingerprint),
    Path(NodeId, NodeId),
}

/// Releases one held response
pub(crate) struct Gate(Arc<Notify>);

impl Gate {
    pub(crate) fn release(&self) {
        self.0.notify_one();
    }
}

#[derive(Default)]
struct MockState {
    calls: Vec<GatewayCall>,
    graph_files: Vec<GraphFile>,
    nodes: HashMap<GraphId, Vec<Node>>,
    paths: HashMap<(NodeId, NodeId), PathResponse>,
    projection_failures: VecDeque<QueryError>,
    details_failures: VecDeque<QueryError>,
    path_failures: VecDeque<QueryError>,
    gates: HashMap<GateKey, Arc<Notify>>,
}

#[derive(Default)]
pub(crate) struct MockGateway {
    state: Mutex<MockState>,
}

impl MockGateway {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_graph_files(&self, files: Vec<GraphFile>) {
        self.state.lock().graph_files = files;
    }

    pub(crate) fn set_nodes(&self, graph: GraphId, nodes: Vec<Node>) {
        self.state.lock().nodes.insert(graph, nodes);
    }

    pub(crate) fn set_path(&self, response: PathResponse) {
        let key = (response.from_node.clone(), response.to_node.clone());
        self.state.lock().paths.insert(key, response);
    }

    pub(crate) fn fail_next_projection(&self, error: QueryError) {
        self.state.lock().projection_failures.push_back(error);
    }

    pub(crate) fn fail_next_details(&self, error: QueryError) {
        self.state.lock().details_failures.push_back(error);
    }

    pub(crate) fn fail_next_path(&self, error: QueryError) {
        self.state.lock().path_failures.push_back(error);
    }

    /// Hold the next projection response for `key` until released
    pub(crate) fn hold_projection(&self, key: &ProjectionKey) -> Gate {
        self.gate(GateKey::Projection(key.fingerprint()))
    }

    /// Hold the next details response for `key` until released
    pub(crate) fn hold_details(&self, key: &DetailsKey) -> Gate {
        self.gate(GateKey::Details(key.fingerprint()))
    }

    /// Hold the next path response for `from`/`to` until released
    pub(crate) fn hold_path(&self, from: &NodeId, to: &NodeId) -> Gate {
        self.gate(GateKey::Path(from.clone(), to.clone()))
    }

    pub(crate) fn calls(&self) -> Vec<GatewayCall> {
        self.state.lock().calls.clone()
    }

    pub(crate) fn projection_calls(&self) -> Vec<ProjectionKey> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                GatewayCall::Projection(key) => Some(key),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn count(&self, matches: impl Fn(&GatewayCall) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|c| matches(c)).count()
    }

    fn gate(&self, key: GateKey) -> Gate {
        let notify = Arc::new(Notify::new());
        self.state.lock().gates.insert(key, Arc::clone(&notify));
        Gate(notify)
    }

    /// Record the call and take its gate, if one is set
    fn begin(&self, call: GatewayCall, gate: GateKey) -> Option<Arc<Notify>> {
        let mut state = self.state.lock();
        state.calls.push(call);
        state.gates.remove(&gate)
    }

    async fn wait(gate: Option<Arc<Notify>>) {
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }
}

/// Deterministic projection derived from the request key
pub(crate) fn synthesize(key: &ProjectionKey) -> Projection {
    let mut nodes: Vec<Node> = key
        .selected
        .iter()
        .map(|id| Node::new(id.clone(), id.as_str(), "SharedLibrary").with_selected(true))
        .collect();
    nodes.extend(
        key.extra
            .iter()
            .filter(|id| !key.selected.contains(*id))
            .map(|id| Node::new(id.clone(), id.as_str(), "SharedLibrary")),
    );

    let ids: Vec<&NodeId> = nodes.iter().map(|n| &n.id).collect();
    let edges = ids
        .windows(2)
        .map(|pair| Edge::direct(pair[0].clone(), pair[1].clone()))
        .collect();
    let transitive_edges = match (key.transitive, ids.first(), ids.last()) {
        (true, Some(first), Some(last)) if ids.len() > 2 => {
            vec![Edge::transitive((*first).clone(), (*last).clone())]
        }
        _ => Vec::new(),
    };

    Projection::with_data(nodes, edges, transitive_edges)
}

#[async_trait]
impl QueryGateway for MockGateway {
    async fn list_graph_files(&self) -> Result<Vec<GraphFile>, QueryError> {
        let mut state = self.state.lock();
        state.calls.push(GatewayCall::GraphFiles);
        Ok(state.graph_files.clone())
    }

    async fn fetch_nodes(&self, graph: &GraphId) -> Result<Vec<Node>, QueryError> {
        let mut state = self.state.lock();
        state.calls.push(GatewayCall::Nodes(graph.clone()));
        Ok(state.nodes.get(graph).cloned().unwrap_or_default())
    }

    async fn fetch_analysis(&self, graph: &GraphId) -> Result<GraphAnalysis, QueryError> {
        let mut state = self.state.lock();
        state.calls.push(GatewayCall::Analysis(graph.clone()));
        let node_count = state.nodes.get(graph).map_or(0, Vec::len);
        let mut analysis = GraphAnalysis::default();
        analysis
            .counts
            .insert("NODE".to_string(), serde_json::json!(node_count));
        Ok(analysis)
    }

    async fn fetch_projection(&self, key: &ProjectionKey) -> Result<Projection, QueryError> {
        let gate = self.begin(
            GatewayCall::Projection(key.clone()),
            GateKey::Projection(key.fingerprint()),
        );
        Self::wait(gate).await;

        match self.state.lock().projection_failures.pop_front() {
            Some(error) => Err(error),
            None => Ok(synthesize(key)),
        }
    }

    async fn fetch_node_details(
        &self,
        graph: &GraphId,
        selected: &BTreeSet<NodeId>,
        transitive: bool,
    ) -> Result<Vec<NodeDetail>, QueryError> {
        let key = DetailsKey {
            graph: graph.clone(),
            selected: selected.clone(),
            transitive,
        };
        let gate = self.begin(
            GatewayCall::NodeDetails(key.clone()),
            GateKey::Details(key.fingerprint()),
        );
        Self::wait(gate).await;

        if let Some(error) = self.state.lock().details_failures.pop_front() {
            return Err(error);
        }
        Ok(selected
            .iter()
            .map(|id| NodeDetail {
                id: id.clone(),
                node: id.to_string(),
                name: id.to_string(),
                attribs: Vec::new(),
                dependers: Vec::new(),
                dependencies: Vec::new(),
            })
            .collect())
    }

    async fn fetch_path(
        &self,
        _graph: &GraphId,
        from: &NodeId,
        to: &NodeId,
    ) -> Result<PathResponse, QueryError> {
        let gate = self.begin(
            GatewayCall::Path {
                from: from.clone(),
                to: to.clone(),
            },
            GateKey::Path(from.clone(), to.clone()),
        );
        Self::wait(gate).await;

        let mut state = self.state.lock();
        if let Some(error) = state.path_failures.pop_front() {
            return Err(error);
        }
        state
            .paths
            .get(&(from.clone(), to.clone()))
            .cloned()
            .ok_or_else(|| QueryError::Server {
                status: 404,
                message: format!("no path from {} to {}", from, to),
            })
    }
}

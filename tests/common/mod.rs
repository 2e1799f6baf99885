//! Fake graph server for integration tests
//!
//! Serves the REST routes the client uses and relays push frames on `/ws`
//! the way the real server does.

#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use depgraph_sync::channel::OutboundMessage;
use depgraph_sync::gateway::{DetailsRequest, PathRequest, ProjectionRequest};
use depgraph_sync::types::{Edge, Node, NodeDetail, NodeId, Projection};

pub const DEFAULT_GRAPH: &str = "abc123";
pub const OTHER_GRAPH: &str = "def456";

pub struct ServerState {
    graphs: HashMap<String, Vec<Node>>,
    relay: broadcast::Sender<String>,
    pub projection_requests: AtomicUsize,
    fail_next_projection: AtomicBool,
    malformed_next_projection: AtomicBool,
}

impl ServerState {
    fn new() -> Self {
        let mut graphs = HashMap::new();
        graphs.insert(
            DEFAULT_GRAPH.to_string(),
            vec![
                Node::new("A", "libA.so", "SharedLibrary"),
                Node::new("B", "libB.so", "SharedLibrary"),
                Node::new("C", "libC.so", "SharedLibrary"),
                Node::new("D", "prog", "Program"),
            ],
        );
        graphs.insert(
            OTHER_GRAPH.to_string(),
            vec![Node::new("X", "libX.so", "SharedLibrary")],
        );
        let (relay, _) = broadcast::channel(64);
        Self {
            graphs,
            relay,
            projection_requests: AtomicUsize::new(0),
            fail_next_projection: AtomicBool::new(false),
            malformed_next_projection: AtomicBool::new(false),
        }
    }
}

pub struct FakeServer {
    pub base_url: String,
    pub ws_url: String,
    pub state: Arc<ServerState>,
}

impl FakeServer {
    /// Start a server on an ephemeral local port
    pub async fn spawn() -> Self {
        let state = Arc::new(ServerState::new());
        let app = router(Arc::clone(&state));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            ws_url: format!("ws://{}/ws", addr),
            state,
        }
    }

    pub fn fail_next_projection(&self) {
        self.state.fail_next_projection.store(true, Ordering::SeqCst);
    }

    pub fn malformed_next_projection(&self) {
        self.state.malformed_next_projection.store(true, Ordering::SeqCst);
    }

    pub fn projection_requests(&self) -> usize {
        self.state.projection_requests.load(Ordering::SeqCst)
    }

    /// Push a server-originated frame to every connected client
    pub fn push(&self, frame: serde_json::Value) {
        let _ = self.state.relay.send(frame.to_string());
    }

    /// Wait until `count` websocket clients are subscribed to the relay
    pub async fn wait_for_peers(&self, count: usize) {
        let state = Arc::clone(&self.state);
        eventually(move || state.relay.receiver_count() >= count).await;
    }
}

/// Poll `condition` until it holds, failing the test after a few seconds
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

/// Run `future` with a timeout
pub async fn within<F: Future>(future: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(5), future)
        .await
        .expect("timed out")
}

fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/graph_files", get(graph_files))
        .route("/api/graphs/:graph/nodes", get(nodes))
        .route("/api/graphs/:graph/analysis", get(analysis))
        .route("/api/graphs/:graph/d3", post(projection))
        .route("/api/graphs/:graph/nodes/details", post(details))
        .route("/api/graphs/:graph/paths", post(paths))
        .with_state(state)
}

fn unknown_graph(graph: &str) -> Response {
    (StatusCode::NOT_FOUND, format!("unknown graph {}", graph)).into_response()
}

async fn graph_files() -> Json<serde_json::Value> {
    Json(json!({
        "graph_files": [
            {"id": 0, "git": OTHER_GRAPH, "selected": false},
            {"id": 1, "git": DEFAULT_GRAPH, "selected": true},
        ]
    }))
}

async fn nodes(State(state): State<Arc<ServerState>>, Path(graph): Path<String>) -> Response {
    match state.graphs.get(&graph) {
        Some(nodes) => Json(json!({ "nodes": nodes })).into_response(),
        None => unknown_graph(&graph),
    }
}

async fn analysis(State(state): State<Arc<ServerState>>, Path(graph): Path<String>) -> Response {
    match state.graphs.get(&graph) {
        Some(nodes) => Json(json!({
            "selectedGraph": graph,
            "results": {"NODE": nodes.len(), "EDGE": nodes.len().saturating_sub(1)}
        }))
        .into_response(),
        None => unknown_graph(&graph),
    }
}

async fn projection(
    State(state): State<Arc<ServerState>>,
    Path(graph): Path<String>,
    Json(body): Json<ProjectionRequest>,
) -> Response {
    state.projection_requests.fetch_add(1, Ordering::SeqCst);
    if state.fail_next_projection.swap(false, Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "graph engine unavailable").into_response();
    }
    if state.malformed_next_projection.swap(false, Ordering::SeqCst) {
        return (StatusCode::OK, r#"{"graphData": 5}"#).into_response();
    }
    let Some(all) = state.graphs.get(&graph) else {
        return unknown_graph(&graph);
    };

    let selected: BTreeSet<NodeId> = body.selected_nodes.iter().cloned().collect();
    let mut wanted = selected.clone();
    wanted.extend(body.extra_nodes.unwrap_or_default());

    let nodes: Vec<Node> = all
        .iter()
        .filter(|n| wanted.contains(&n.id))
        .map(|n| n.with_selected(selected.contains(&n.id)))
        .collect();
    let edges = nodes
        .windows(2)
        .map(|pair| Edge::direct(pair[0].id.clone(), pair[1].id.clone()))
        .collect();
    let transitive = match (body.transitive_edges, nodes.first(), nodes.last()) {
        (true, Some(first), Some(last)) if nodes.len() > 2 => {
            vec![Edge::transitive(first.id.clone(), last.id.clone())]
        }
        _ => Vec::new(),
    };

    Json(json!({ "graphData": Projection::with_data(nodes, edges, transitive) })).into_response()
}

async fn details(
    State(state): State<Arc<ServerState>>,
    Path(graph): Path<String>,
    Json(body): Json<DetailsRequest>,
) -> Response {
    let Some(all) = state.graphs.get(&graph) else {
        return unknown_graph(&graph);
    };
    let infos: Vec<NodeDetail> = all
        .iter()
        .filter(|n| body.selected_nodes.contains(&n.id))
        .map(|n| NodeDetail {
            id: n.id.clone(),
            node: n.external_key.clone(),
            name: n.display_name.clone(),
            attribs: Vec::new(),
            dependers: Vec::new(),
            dependencies: Vec::new(),
        })
        .collect();
    Json(json!({ "nodeInfos": infos })).into_response()
}

async fn paths(Path(graph): Path<String>, Json(body): Json<PathRequest>) -> Response {
    if graph != DEFAULT_GRAPH || body.from_node.as_str() != "A" || body.to_node.as_str() != "B" {
        return (StatusCode::NOT_FOUND, "no path").into_response();
    }
    Json(json!({
        "fromNode": "A",
        "toNode": "B",
        "paths": [["A", "C", "B"], ["A", "B"]],
        "extraNodes": ["C"]
    }))
    .into_response()
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<ServerState>>) -> Response {
    ws.on_upgrade(move |socket| relay(socket, state))
}

/// Forward relayed frames to the client and relay what it sends
async fn relay(socket: WebSocket, state: Arc<ServerState>) {
    let (mut sink, mut stream) = socket.split();
    let mut rx = state.relay.subscribe();

    loop {
        tokio::select! {
            frame = rx.recv() => match frame {
                Ok(frame) => {
                    if sink.send(Message::Text(frame)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            },
            message = stream.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    if let Ok(outbound) = serde_json::from_str::<OutboundMessage>(&text) {
                        if let Ok(relayed) = serde_json::to_string(&outbound.relayed()) {
                            let _ = state.relay.send(relayed);
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
}

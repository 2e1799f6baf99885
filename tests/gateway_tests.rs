//! HttpGateway against the fake graph server

mod common;

use std::collections::BTreeSet;
use std::time::Duration;

use common::{FakeServer, DEFAULT_GRAPH, OTHER_GRAPH};
use depgraph_sync::{GraphId, HttpGateway, NodeId, ProjectionKey, QueryError, QueryGateway};

fn ids(names: &[&str]) -> BTreeSet<NodeId> {
    names.iter().map(|n| NodeId::from(*n)).collect()
}

fn gateway(server: &FakeServer) -> HttpGateway {
    HttpGateway::new(server.base_url.clone(), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_list_graph_files() {
    let server = FakeServer::spawn().await;
    let files = gateway(&server).list_graph_files().await.unwrap();

    assert_eq!(files.len(), 2);
    let default = files.iter().find(|f| f.selected).unwrap();
    assert_eq!(default.git, GraphId::from(DEFAULT_GRAPH));
}

#[tokio::test]
async fn test_catalog_and_analysis() {
    let server = FakeServer::spawn().await;
    let gateway = gateway(&server);
    let graph = GraphId::from(DEFAULT_GRAPH);

    let nodes = gateway.fetch_nodes(&graph).await.unwrap();
    assert_eq!(nodes.len(), 4);
    assert_eq!(nodes[3].kind, "Program");

    let analysis = gateway.fetch_analysis(&graph).await.unwrap();
    assert_eq!(analysis.count("NODE"), Some(4));
}

#[tokio::test]
async fn test_projection_includes_extra_nodes() {
    let server = FakeServer::spawn().await;
    let key = ProjectionKey::new(GraphId::from(DEFAULT_GRAPH), ids(&["A", "B"]), true)
        .with_extra(ids(&["C"]));

    let projection = gateway(&server).fetch_projection(&key).await.unwrap();

    assert_eq!(projection.node_count(), 3);
    assert!(!projection.node(&NodeId::from("C")).unwrap().selected);
    assert_eq!(projection.edges.len(), 2);
    assert_eq!(projection.transitive_edges.len(), 1);
    assert_eq!(server.projection_requests(), 1);
}

#[tokio::test]
async fn test_server_error_status() {
    let server = FakeServer::spawn().await;
    server.fail_next_projection();
    let key = ProjectionKey::new(GraphId::from(DEFAULT_GRAPH), ids(&["A"]), false);

    let err = gateway(&server).fetch_projection(&key).await.unwrap_err();

    assert_eq!(
        err,
        QueryError::Server {
            status: 500,
            message: "graph engine unavailable".to_string()
        }
    );
}

#[tokio::test]
async fn test_unknown_graph_is_server_error() {
    let server = FakeServer::spawn().await;
    let err = gateway(&server)
        .fetch_nodes(&GraphId::from("nope"))
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::Server { status: 404, .. }));
}

#[tokio::test]
async fn test_malformed_payload() {
    let server = FakeServer::spawn().await;
    server.malformed_next_projection();
    let key = ProjectionKey::new(GraphId::from(DEFAULT_GRAPH), ids(&["A"]), false);

    let err = gateway(&server).fetch_projection(&key).await.unwrap_err();
    assert!(matches!(err, QueryError::Malformed(_)));
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    // bind and release a port so nothing is listening on it
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let gateway = HttpGateway::new(format!("http://{}", addr), Duration::from_secs(2)).unwrap();
    let err = gateway.list_graph_files().await.unwrap_err();
    assert!(matches!(err, QueryError::Network(_)));
}

#[tokio::test]
async fn test_paths_and_details() {
    let server = FakeServer::spawn().await;
    let gateway = gateway(&server);
    let graph = GraphId::from(DEFAULT_GRAPH);

    let response = gateway
        .fetch_path(&graph, &NodeId::from("A"), &NodeId::from("B"))
        .await
        .unwrap();
    assert_eq!(response.paths.len(), 2);
    assert_eq!(response.extra_nodes, vec![NodeId::from("C")]);

    let details = gateway
        .fetch_node_details(&graph, &ids(&["A", "B"]), false)
        .await
        .unwrap();
    assert_eq!(details.len(), 2);
    assert_eq!(details[0].name, "libA.so");

    let missing = gateway
        .fetch_node_details(&GraphId::from(OTHER_GRAPH), &ids(&["A"]), false)
        .await
        .unwrap();
    assert!(missing.is_empty());
}

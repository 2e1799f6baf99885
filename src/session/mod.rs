//! Client session
//!
//! Wires the selection store, both caches, the gateway, the push channel and
//! the path explorer together. Every local action and every inbound push
//! frame goes through here, in arrival order.

use std::collections::BTreeSet;
use std::sync::Arc;

use futures::{Stream, StreamExt};
use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, info, warn};

use crate::cache::{DetailsFuture, GraphProjectionCache, NodeDetailsCache, ProjectionFuture};
use crate::channel::{
    DetachedTransport, InboundMessage, PushTransport, RemoteEventChannel, WebSocketTransport,
};
use crate::config::ClientConfig;
use crate::error::{Error, PathError, Result};
use crate::gateway::{HttpGateway, QueryGateway};
use crate::path::{PathExplorer, PathState, Resolution};
use crate::selection::{SelectionSnapshot, SelectionStore};
use crate::types::{GraphAnalysis, GraphFile, GraphId, NodeId, PathSet, ReplicaId, SelectionEvent};
use crate::view::{ViewEvent, ViewNotifier, ViewState, ViewUpdate};


/// Outcome of a path query
#[derive(Clone)]
pub enum PathOutcome {
    /// Paths are ready; `projection` is the dependent fetch that includes
    /// the extra path nodes
    Ready {
        paths: PathSet,
        projection: Option<ProjectionFuture>,
    },
    /// A newer query or a clear replaced this one before it resolved
    Superseded,
}

struct SessionInner {
    gateway: Arc<dyn QueryGateway>,
    channel: RemoteEventChannel,
    store: SelectionStore,
    projections: Arc<GraphProjectionCache>,
    details: NodeDetailsCache,
    paths: Mutex<PathExplorer>,
    graph_files: Mutex<Vec<GraphFile>>,
    analysis: Mutex<Option<GraphAnalysis>>,
    notifier: ViewNotifier,
}

/// Single mutation entry point of one client replica
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    /// Create a session on top of an existing gateway and push channel
    pub fn new(gateway: Arc<dyn QueryGateway>, channel: RemoteEventChannel, config: &ClientConfig) -> Self {
        let notifier = ViewNotifier::new(config.update_buffer);
        let (state, current) = watch::channel(Arc::new(SelectionSnapshot::default()));

        let projections = Arc::new(GraphProjectionCache::new(
            Arc::clone(&gateway),
            current.clone(),
            config.cache_capacity,
            notifier.clone(),
        ));
        let details = NodeDetailsCache::new(
            Arc::clone(&gateway),
            current,
            config.details_capacity,
            notifier.clone(),
        );
        let store = SelectionStore::new(
            channel.replica().clone(),
            state,
            channel.clone(),
            Arc::clone(&projections),
            notifier.clone(),
        );

        Self {
            inner: Arc::new(SessionInner {
                gateway,
                channel,
                store,
                projections,
                details,
                paths: Mutex::new(PathExplorer::new()),
                graph_files: Mutex::new(Vec::new()),
                analysis: Mutex::new(None),
                notifier,
            }),
        }
    }

    /// Connect to the configured server and push channel
    ///
    /// Returns the inbound push frames to feed into [`Session::run`] when a
    /// push channel is configured.
    pub async fn connect(config: &ClientConfig) -> Result<(Self, Option<mpsc::UnboundedReceiver<String>>)> {
        config.validate()?;
        let gateway = Arc::new(HttpGateway::new(config.server_url.clone(), config.request_timeout)?);

        let (transport, inbound): (Arc<dyn PushTransport>, _) = match &config.push_url {
            Some(url) => {
                let (transport, inbound) = WebSocketTransport::connect(url).await?;
                (Arc::new(transport), Some(inbound))
            }
            None => (Arc::new(DetachedTransport), None),
        };

        let channel = RemoteEventChannel::new(transport, config.replica());
        info!(replica = %channel.replica(), server = %config.server_url, "session created");
        Ok((Self::new(gateway, channel, config), inbound))
    }

    pub fn replica(&self) -> &ReplicaId {
        self.inner.store.replica()
    }

    pub fn store(&self) -> &SelectionStore {
        &self.inner.store
    }

    pub fn projections(&self) -> &GraphProjectionCache {
        &self.inner.projections
    }

    pub fn snapshot(&self) -> Arc<SelectionSnapshot> {
        self.inner.store.snapshot()
    }

    /// Subscribe to view updates
    pub fn subscribe(&self) -> broadcast::Receiver<ViewUpdate> {
        self.inner.notifier.subscribe()
    }

    /// Read model for view adapters
    pub fn view(&self) -> ViewState {
        let shown = self.inner.projections.displayed_fingerprint();
        ViewState {
            snapshot: self.snapshot(),
            projection: self.inner.projections.displayed(),
            projection_fingerprint: shown,
            details: self.inner.details.displayed(),
            path: self.inner.paths.lock().state().clone(),
            graph_files: self.inner.graph_files.lock().clone(),
            analysis: self.inner.analysis.lock().clone(),
        }
    }

    /// Load the graph file list, adopting the server's default when no
    /// graph is active yet
    pub async fn load_graph_files(&self) -> Result<Vec<GraphFile>> {
        let files = self.inner.gateway.list_graph_files().await?;
        *self.inner.graph_files.lock() = files.clone();
        self.inner.notifier.publish(ViewEvent::GraphFilesChanged);
        info!(count = files.len(), "graph files loaded");

        if self.snapshot().graph().is_none() {
            if let Some(default) = files.iter().find(|f| f.selected) {
                self.switch_graph(default.git.clone(), false).await?;
            }
        }
        Ok(files)
    }

    /// Switch to `graph` and tell peers
    pub async fn select_graph(&self, graph: GraphId) -> Result<()> {
        self.switch_graph(graph, true).await
    }

    /// Select or deselect a node locally
    pub fn select_node(&self, node: &NodeId, selected: bool) -> Result<ProjectionFuture> {
        let projection = self.inner.store.apply_local(node, selected)?;
        let _ = self.node_details();
        Ok(projection)
    }

    /// Apply a peer's selection change
    pub fn apply_remote(&self, event: &SelectionEvent) -> Option<ProjectionFuture> {
        let projection = self.inner.store.apply_remote(event)?;
        let _ = self.node_details();
        Some(projection)
    }

    pub fn set_transitive(&self, transitive: bool) -> Option<ProjectionFuture> {
        let projection = self.inner.store.set_transitive(transitive);
        let _ = self.node_details();
        projection
    }

    /// Projection for the current selection
    pub fn projection(&self) -> Option<ProjectionFuture> {
        self.inner.store.projection()
    }

    /// Node details for the current selection
    pub fn node_details(&self) -> Option<DetailsFuture> {
        let key = self.snapshot().details_key()?;
        Some(self.inner.details.get(&key))
    }

    /// Explicit retry: forget the current projection and fetch it again
    ///
    /// A fetch still in flight for the current selection is joined instead
    /// of being issued twice.
    pub fn refresh(&self) -> Result<ProjectionFuture> {
        let snapshot = self.snapshot();
        let key = snapshot.projection_key().ok_or(Error::NoActiveGraph)?;
        self.inner.projections.forget(&key);
        self.inner.details.forget(&key.details_key());
        info!(
            fingerprint = %key.fingerprint().short(),
            joined = self.inner.projections.is_in_flight(&key),
            "refreshing projection"
        );

        let projection = self.inner.projections.get(&key);
        let _ = self.node_details();
        Ok(projection)
    }

    /// Query paths between two nodes, then fetch the projection that
    /// includes the nodes needed to draw them
    pub async fn find_path(&self, from: NodeId, to: NodeId) -> Result<PathOutcome> {
        let graph = self.snapshot().graph().cloned().ok_or(Error::NoActiveGraph)?;
        let request = self.inner.paths.lock().submit(from.clone(), to.clone());
        self.inner.notifier.publish(ViewEvent::PathChanged);
        // nodes of the previous path stop being drawn while this one is pending
        let _ = self.inner.store.set_extra_nodes(BTreeSet::new());
        debug!(from = %from, to = %to, "path query started");

        let result = self.inner.gateway.fetch_path(&graph, &from, &to).await;

        let resolution = self.inner.paths.lock().resolve(&request, result);
        match resolution {
            Resolution::Applied { extra_nodes } => {
                self.inner.notifier.publish(ViewEvent::PathChanged);
                let paths = self
                    .inner
                    .paths
                    .lock()
                    .paths()
                    .cloned()
                    .ok_or(PathError::NotReady)?;
                info!(from = %from, to = %to, paths = paths.len(), extra = extra_nodes.len(), "paths ready");
                let projection = self.inner.store.set_extra_nodes(extra_nodes);
                Ok(PathOutcome::Ready { paths, projection })
            }
            Resolution::Failed => {
                self.inner.notifier.publish(ViewEvent::PathChanged);
                let error = match self.inner.paths.lock().state() {
                    PathState::Failed { error, .. } => error.clone(),
                    _ => return Err(PathError::NotReady.into()),
                };
                warn!(from = %from, to = %to, error = %error, "path query failed");
                Err(error.into())
            }
            Resolution::Discarded => Ok(PathOutcome::Superseded),
        }
    }

    /// Highlight one of the ready paths; no network effect
    pub fn select_path(&self, index: isize) -> Result<()> {
        self.inner.paths.lock().select_path(index)?;
        self.inner.notifier.publish(ViewEvent::PathChanged);
        Ok(())
    }

    /// Return the path explorer to idle and drop the extra path nodes
    pub fn clear_path(&self) -> Option<ProjectionFuture> {
        self.inner.paths.lock().clear();
        self.inner.notifier.publish(ViewEvent::PathChanged);
        self.inner.store.set_extra_nodes(BTreeSet::new())
    }

    /// Change or clear the start node of path discovery
    ///
    /// A changed endpoint drops the current path and its extra nodes; the
    /// returned future is the projection without them.
    pub fn set_path_from(&self, from: Option<NodeId>) -> Option<ProjectionFuture> {
        let dropped = self.inner.paths.lock().set_from(from);
        self.endpoint_changed(dropped)
    }

    /// Change or clear the end node of path discovery
    pub fn set_path_to(&self, to: Option<NodeId>) -> Option<ProjectionFuture> {
        let dropped = self.inner.paths.lock().set_to(to);
        self.endpoint_changed(dropped)
    }

    fn endpoint_changed(&self, dropped: bool) -> Option<ProjectionFuture> {
        if !dropped {
            return None;
        }
        debug!("path endpoints changed, path dropped");
        self.inner.notifier.publish(ViewEvent::PathChanged);
        self.inner.store.set_extra_nodes(BTreeSet::new())
    }

    /// Apply one inbound push frame; undecodable frames are logged and dropped
    pub async fn handle_frame(&self, frame: &str) {
        let message = match RemoteEventChannel::decode(frame) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "dropping push frame");
                return;
            }
        };
        debug!(event = message.name(), "push message");

        match message {
            InboundMessage::OtherHashSelected { hash, origin, .. } => {
                if origin.as_ref() == Some(self.replica()) {
                    return;
                }
                if let Err(e) = self.switch_graph(hash, false).await {
                    warn!(error = %e, "failed to follow peer graph switch");
                }
            }
            InboundMessage::GraphNodes { graph_data } => {
                self.inner.store.set_catalog(graph_data.nodes);
                self.inner.notifier.publish(ViewEvent::NodeCatalogChanged);
            }
            InboundMessage::GraphData {
                graph_data,
                selected_nodes,
                origin,
            } => {
                let Some(nodes) = selected_nodes else {
                    // no way to tell which selection a bare projection belongs to
                    if graph_data.is_some() {
                        debug!("dropping pushed projection without selected nodes");
                    }
                    return;
                };
                let nodes: BTreeSet<NodeId> = nodes.into_iter().collect();
                if self.inner.store.apply_remote_set(nodes.clone(), origin.as_ref()).is_some() {
                    let _ = self.node_details();
                }
                if let Some(projection) = graph_data {
                    let snapshot = self.snapshot();
                    match snapshot.projection_key() {
                        Some(key) if *snapshot.selected() == nodes => {
                            self.inner.projections.offer(&key, projection);
                        }
                        _ => debug!("pushed projection does not match the current selection"),
                    }
                }
            }
            InboundMessage::GraphResults(analysis) => {
                *self.inner.analysis.lock() = Some(analysis);
                self.inner.notifier.publish(ViewEvent::AnalysisReady);
            }
            InboundMessage::NodeInfos { node_infos } => {
                if let Some(key) = self.snapshot().details_key() {
                    self.inner.details.offer(&key, node_infos);
                }
            }
            InboundMessage::RowSelected(row) => {
                // projection is driven by the cache's own completion handler
                let _ = self.apply_remote(&row.to_event());
            }
        }
    }

    /// Consume inbound push frames strictly in order until the stream ends
    pub async fn run<S>(&self, frames: S)
    where
        S: Stream<Item = String>,
    {
        futures::pin_mut!(frames);
        while let Some(frame) = frames.next().await {
            self.handle_frame(&frame).await;
        }
        info!("push stream ended");
    }

    async fn switch_graph(&self, graph: GraphId, announce: bool) -> Result<()> {
        if self.snapshot().graph() == Some(&graph) {
            debug!(graph = %graph, "graph already active");
            return Ok(());
        }

        self.inner.paths.lock().clear();
        self.inner.projections.invalidate_all();
        self.inner.details.invalidate_all();
        self.inner.store.set_graph(Some(graph.clone()));
        self.inner.notifier.publish(ViewEvent::PathChanged);
        self.inner.notifier.publish(ViewEvent::GraphSelected {
            graph: graph.clone(),
        });
        info!(graph = %graph, announce, "graph selected");

        if announce {
            if let Err(e) = self.inner.channel.emit_graph_selected(&graph) {
                warn!(graph = %graph, error = %e, "failed to broadcast graph switch");
            }
        }
        // nothing selected yet: resolves to an empty projection locally
        let _ = self.projection();
        let _ = self.node_details();

        let gateway = &self.inner.gateway;
        let (nodes, analysis) = tokio::join!(gateway.fetch_nodes(&graph), gateway.fetch_analysis(&graph));

        if self.snapshot().graph() != Some(&graph) {
            debug!(graph = %graph, "graph switched again while loading");
            return Ok(());
        }

        let mut first_error = None;
        match nodes {
            Ok(nodes) => {
                debug!(graph = %graph, nodes = nodes.len(), "node catalog loaded");
                self.inner.store.set_catalog(nodes);
                self.inner.notifier.publish(ViewEvent::NodeCatalogChanged);
            }
            Err(e) => {
                warn!(graph = %graph, error = %e, "failed to load node catalog");
                first_error = Some(e);
            }
        }
        match analysis {
            Ok(analysis) => {
                *self.inner.analysis.lock() = Some(analysis);
                self.inner.notifier.publish(ViewEvent::AnalysisReady);
            }
            Err(e) => {
                warn!(graph = %graph, error = %e, "failed to load graph analysis");
                first_error = first_error.or(Some(e));
            }
        }

        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

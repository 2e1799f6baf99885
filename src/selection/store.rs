//! Selection store: the single writer of what is being viewed

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use super::SelectionSnapshot;
use crate::cache::{GraphProjectionCache, ProjectionFuture};
use crate::channel::RemoteEventChannel;
use crate::error::{Error, Result};
use crate::types::{Fingerprint, GraphId, Node, NodeId, ReplicaId, SelectionEvent};
use crate::view::{ViewEvent, ViewNotifier};

/// Canonical record of selected nodes and view flags
///
/// Every mutation swaps in a new snapshot with its fingerprint already
/// recomputed, so no observer sees one without the other.
pub struct SelectionStore {
    replica: ReplicaId,
    state: watch::Sender<Arc<SelectionSnapshot>>,
    channel: RemoteEventChannel,
    cache: Arc<GraphProjectionCache>,
    notifier: ViewNotifier,
}

impl SelectionStore {
    pub fn new(
        replica: ReplicaId,
        state: watch::Sender<Arc<SelectionSnapshot>>,
        channel: RemoteEventChannel,
        cache: Arc<GraphProjectionCache>,
        notifier: ViewNotifier,
    ) -> Self {
        Self {
            replica,
            state,
            channel,
            cache,
            notifier,
        }
    }

    pub fn replica(&self) -> &ReplicaId {
        &self.replica
    }

    pub fn snapshot(&self) -> Arc<SelectionSnapshot> {
        Arc::clone(&self.state.borrow())
    }

    pub fn current_fingerprint(&self) -> Option<Fingerprint> {
        self.state.borrow().fingerprint()
    }

    /// Watch for new snapshots
    pub fn subscribe(&self) -> watch::Receiver<Arc<SelectionSnapshot>> {
        self.state.subscribe()
    }

    /// Select or deselect a node locally and broadcast the change
    pub fn apply_local(&self, node: &NodeId, selected: bool) -> Result<ProjectionFuture> {
        if self.state.borrow().graph().is_none() {
            return Err(Error::NoActiveGraph);
        }

        let snapshot = self.mutate(|s| s.select(node, selected));
        let event = SelectionEvent::new(node.clone(), selected, self.replica.clone());
        if let Err(e) = self
            .channel
            .emit_selection(&event, snapshot.display_name(node))
        {
            warn!(node = %node, error = %e, "failed to broadcast selection");
        }

        self.request(&snapshot).ok_or(Error::NoActiveGraph)
    }

    /// Apply a peer's selection change; our own echoes are ignored
    pub fn apply_remote(&self, event: &SelectionEvent) -> Option<ProjectionFuture> {
        if event.is_from(&self.replica) {
            debug!(node = %event.node_id, "ignoring echo of own selection");
            return None;
        }
        if self.state.borrow().graph().is_none() {
            debug!(node = %event.node_id, "no active graph, dropping peer selection");
            return None;
        }
        let snapshot = self.mutate(|s| s.select(&event.node_id, event.selected));
        self.request(&snapshot)
    }

    /// Replace the whole selection with a peer's (`graph_data{selectedNodes}`)
    pub fn apply_remote_set(
        &self,
        nodes: BTreeSet<NodeId>,
        origin: Option<&ReplicaId>,
    ) -> Option<ProjectionFuture> {
        if origin == Some(&self.replica) {
            debug!("ignoring echo of own selection set");
            return None;
        }
        if self.state.borrow().graph().is_none() {
            debug!("no active graph, dropping peer selection set");
            return None;
        }
        let snapshot = self.mutate(|s| s.replace_selected(nodes));
        self.request(&snapshot)
    }

    /// Show or hide transitive edges; local only
    pub fn set_transitive(&self, transitive: bool) -> Option<ProjectionFuture> {
        let snapshot = self.mutate(|s| s.set_transitive(transitive));
        self.request(&snapshot)
    }

    /// Extra nodes to draw alongside the selection; local only
    pub fn set_extra_nodes(&self, nodes: BTreeSet<NodeId>) -> Option<ProjectionFuture> {
        let snapshot = self.mutate(|s| s.set_extra(nodes));
        self.request(&snapshot)
    }

    /// Switch the active graph, clearing selection, extra nodes and catalog
    pub fn set_graph(&self, graph: Option<GraphId>) -> Arc<SelectionSnapshot> {
        self.mutate(|s| {
            s.set_graph(graph);
            true
        })
    }

    pub fn set_catalog(&self, nodes: Vec<Node>) -> Arc<SelectionSnapshot> {
        self.mutate(|s| {
            s.set_catalog(nodes);
            true
        })
    }

    /// Request the projection for the current snapshot
    pub fn projection(&self) -> Option<ProjectionFuture> {
        self.request(&self.snapshot())
    }

    /// Apply `edit` to a copy of the current snapshot and publish it
    ///
    /// Returns the snapshot in effect afterwards; unchanged when `edit`
    /// reports no change.
    fn mutate(&self, edit: impl FnOnce(&mut SelectionSnapshot) -> bool) -> Arc<SelectionSnapshot> {
        let modified = self.state.send_if_modified(|current| {
            let mut next = SelectionSnapshot::clone(current);
            if !edit(&mut next) {
                return false;
            }
            next.seal();
            *current = Arc::new(next);
            true
        });

        let snapshot = self.snapshot();
        if modified {
            debug!(
                revision = snapshot.revision(),
                selected = snapshot.selected().len(),
                fingerprint = ?snapshot.fingerprint(),
                "selection changed"
            );
            self.notifier.publish(ViewEvent::SelectionChanged {
                revision: snapshot.revision(),
                fingerprint: snapshot.fingerprint(),
            });
        }
        snapshot
    }

    fn request(&self, snapshot: &SelectionSnapshot) -> Option<ProjectionFuture> {
        snapshot.projection_key().map(|key| self.cache.get(&key))
    }
}

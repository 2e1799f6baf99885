//! Immutable selection snapshots
//!
//! Each mutation of the store produces a new snapshot; readers holding an
//! older one keep seeing it unchanged.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::types::{DetailsKey, Fingerprint, GraphId, Node, NodeId, ProjectionKey};

/// What is currently being viewed
#[derive(Debug, Clone, Default)]
pub struct SelectionSnapshot {
    revision: u64,
    graph: Option<GraphId>,
    catalog: Arc<Vec<Node>>,
    selected: Arc<BTreeSet<NodeId>>,
    transitive: bool,
    extra: Arc<BTreeSet<NodeId>>,
    fingerprint: Option<Fingerprint>,
    details_fingerprint: Option<Fingerprint>,
}

impl SelectionSnapshot {
    /// Incremented on every applied mutation
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn graph(&self) -> Option<&GraphId> {
        self.graph.as_ref()
    }

    /// Node catalog of the active graph as loaded from the server
    pub fn catalog(&self) -> &[Node] {
        &self.catalog
    }

    pub fn selected(&self) -> &BTreeSet<NodeId> {
        &self.selected
    }

    pub fn is_selected(&self, id: &NodeId) -> bool {
        self.selected.contains(id)
    }

    pub fn transitive(&self) -> bool {
        self.transitive
    }

    /// Extra nodes drawn alongside the selection, e.g. path members
    pub fn extra(&self) -> &BTreeSet<NodeId> {
        &self.extra
    }

    /// Fingerprint of the projection this selection needs
    pub fn fingerprint(&self) -> Option<Fingerprint> {
        self.fingerprint
    }

    /// Fingerprint of the node details this selection needs
    pub fn details_fingerprint(&self) -> Option<Fingerprint> {
        self.details_fingerprint
    }

    /// Request key for the projection, once a graph is active
    pub fn projection_key(&self) -> Option<ProjectionKey> {
        let graph = self.graph.clone()?;
        Some(
            ProjectionKey::new(graph, (*self.selected).clone(), self.transitive)
                .with_extra((*self.extra).clone()),
        )
    }

    pub fn details_key(&self) -> Option<DetailsKey> {
        self.projection_key().map(|key| key.details_key())
    }

    /// Catalog nodes with `selected` set from this snapshot
    pub fn nodes(&self) -> Vec<Node> {
        self.catalog
            .iter()
            .map(|n| n.with_selected(self.selected.contains(&n.id)))
            .collect()
    }

    /// Display name from the catalog, falling back to the id
    pub fn display_name<'a>(&'a self, id: &'a NodeId) -> &'a str {
        self.catalog
            .iter()
            .find(|n| &n.id == id)
            .map(|n| n.display_name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| id.as_str())
    }

    pub(super) fn select(&mut self, id: &NodeId, selected: bool) -> bool {
        let set = Arc::make_mut(&mut self.selected);
        if selected {
            set.insert(id.clone())
        } else {
            set.remove(id)
        }
    }

    pub(super) fn replace_selected(&mut self, ids: BTreeSet<NodeId>) -> bool {
        if *self.selected == ids {
            return false;
        }
        self.selected = Arc::new(ids);
        true
    }

    pub(super) fn set_transitive(&mut self, transitive: bool) -> bool {
        let changed = self.transitive != transitive;
        self.transitive = transitive;
        changed
    }

    pub(super) fn set_extra(&mut self, ids: BTreeSet<NodeId>) -> bool {
        if *self.extra == ids {
            return false;
        }
        self.extra = Arc::new(ids);
        true
    }

    /// Switch graphs, dropping everything tied to the previous one
    pub(super) fn set_graph(&mut self, graph: Option<GraphId>) {
        self.graph = graph;
        self.catalog = Arc::default();
        self.selected = Arc::default();
        self.extra = Arc::default();
    }

    pub(super) fn set_catalog(&mut self, nodes: Vec<Node>) {
        self.catalog = Arc::new(nodes);
    }

    /// Finish a mutation: bump the revision and recompute fingerprints
    pub(super) fn seal(&mut self) {
        self.revision += 1;
        let key = self.projection_key();
        self.fingerprint = key.as_ref().map(ProjectionKey::fingerprint);
        self.details_fingerprint = key.map(|k| k.details_key().fingerprint());
    }

    /// Snapshot viewing exactly `key`
    #[cfg(test)]
    pub(crate) fn for_key(key: ProjectionKey) -> Self {
        let mut snapshot = Self {
            graph: Some(key.graph),
            selected: Arc::new(key.selected),
            transitive: key.transitive,
            extra: Arc::new(key.extra),
            ..Self::default()
        };
        snapshot.seal();
        snapshot
    }
}

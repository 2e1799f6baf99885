//! Node details cache
//!
//! Independent of the projection cache: a failed details fetch never blocks
//! or rolls back the projection for the same selection.

use std::sync::Arc;

use tokio::sync::watch;

use super::fetch::SharedFetch;
use super::resource::{Resource, ResourceCache};
use crate::error::QueryError;
use crate::gateway::QueryGateway;
use crate::selection::SelectionSnapshot;
use crate::types::{DetailsKey, Fingerprint, NodeDetail};
use crate::view::{ViewEvent, ViewNotifier};

pub type DetailsFuture = SharedFetch<Vec<NodeDetail>>;

pub(crate) struct NodeDetailsResource;

impl Resource for NodeDetailsResource {
    type Value = Vec<NodeDetail>;

    const KIND: &'static str = "node_details";

    fn current(snapshot: &SelectionSnapshot) -> Option<Fingerprint> {
        snapshot.details_fingerprint()
    }

    fn ready_event(fingerprint: Fingerprint) -> ViewEvent {
        ViewEvent::NodeDetailsReady { fingerprint }
    }

    fn failed_event(fingerprint: Fingerprint, error: QueryError) -> ViewEvent {
        ViewEvent::NodeDetailsFailed { fingerprint, error }
    }
}

pub struct NodeDetailsCache {
    gateway: Arc<dyn QueryGateway>,
    cache: ResourceCache<NodeDetailsResource>,
}

impl NodeDetailsCache {
    pub fn new(
        gateway: Arc<dyn QueryGateway>,
        current: watch::Receiver<Arc<SelectionSnapshot>>,
        capacity: usize,
        notifier: ViewNotifier,
    ) -> Self {
        Self {
            gateway,
            cache: ResourceCache::new(current, capacity, notifier),
        }
    }

    /// Details for the selected nodes of `key`
    pub fn get(&self, key: &DetailsKey) -> DetailsFuture {
        let fingerprint = key.fingerprint();
        if key.selected.is_empty() {
            return self.cache.resolve_local(fingerprint, Vec::new());
        }

        let gateway = Arc::clone(&self.gateway);
        let key = key.clone();
        self.cache.get(fingerprint, async move {
            gateway
                .fetch_node_details(&key.graph, &key.selected, key.transitive)
                .await
        })
    }

    /// Accept details pushed by the server (`node_infos`)
    pub fn offer(&self, key: &DetailsKey, details: Vec<NodeDetail>) -> bool {
        self.cache.offer(key.fingerprint(), details)
    }

    pub fn invalidate(&self, key: &DetailsKey) -> bool {
        self.cache.invalidate(&key.fingerprint())
    }

    pub fn forget(&self, key: &DetailsKey) -> bool {
        self.cache.forget(&key.fingerprint())
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    /// Last good details shown for the selection
    pub fn displayed(&self) -> Option<Arc<Vec<NodeDetail>>> {
        self.cache.shown().map(|(_, details)| details)
    }

    pub fn is_in_flight(&self, key: &DetailsKey) -> bool {
        self.cache.is_in_flight(&key.fingerprint())
    }

    pub fn in_flight_len(&self) -> usize {
        self.cache.in_flight_len()
    }
}

//! Graph projection cache

use std::sync::Arc;

use tokio::sync::watch;

use super::fetch::SharedFetch;
use super::resource::{Resource, ResourceCache};
use crate::error::QueryError;
use crate::gateway::QueryGateway;
use crate::selection::SelectionSnapshot;
use crate::types::{Fingerprint, Projection, ProjectionKey};
use crate::view::{ViewEvent, ViewNotifier};

/// Pending or completed projection, shared by coalesced callers
pub type ProjectionFuture = SharedFetch<Projection>;

pub(crate) struct ProjectionResource;

impl Resource for ProjectionResource {
    type Value = Projection;

    const KIND: &'static str = "projection";

    fn current(snapshot: &SelectionSnapshot) -> Option<Fingerprint> {
        snapshot.fingerprint()
    }

    fn ready_event(fingerprint: Fingerprint) -> ViewEvent {
        ViewEvent::ProjectionReady { fingerprint }
    }

    fn failed_event(fingerprint: Fingerprint, error: QueryError) -> ViewEvent {
        ViewEvent::ProjectionFailed { fingerprint, error }
    }
}

/// Projections keyed by fingerprint, with at most one fetch in flight each
pub struct GraphProjectionCache {
    gateway: Arc<dyn QueryGateway>,
    cache: ResourceCache<ProjectionResource>,
}

impl GraphProjectionCache {
    /// Create a cache checking relevance against `current`
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

    /// Projection for `key`: cached, joined, or freshly fetched
    ///
    /// An empty key resolves to an empty projection without a request.
    pub fn get(&self, key: &ProjectionKey) -> ProjectionFuture {
        let fingerprint = key.fingerprint();
        if key.is_empty() {
            return self.cache.resolve_local(fingerprint, Projection::default());
        }

        let gateway = Arc::clone(&self.gateway);
        let key = key.clone();
        self.cache
            .get(fingerprint, async move { gateway.fetch_projection(&key).await })
    }

    /// Accept a projection pushed by the server for `key`
    pub fn offer(&self, key: &ProjectionKey, projection: Projection) -> bool {
        self.cache.offer(key.fingerprint(), projection)
    }

    /// Drop the entry for `key`; an orphaned fetch resolves as stale
    pub fn invalidate(&self, key: &ProjectionKey) -> bool {
        self.cache.invalidate(&key.fingerprint())
    }

    /// Drop the retained projection for `key` so the next get fetches it
    /// again; a fetch already in flight is joined, not duplicated
    pub fn forget(&self, key: &ProjectionKey) -> bool {
        self.cache.forget(&key.fingerprint())
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    /// Last good projection shown for the selection
    pub fn displayed(&self) -> Option<Arc<Projection>> {
        self.cache.shown().map(|(_, projection)| projection)
    }

    /// Fingerprint of the displayed projection
    pub fn displayed_fingerprint(&self) -> Option<Fingerprint> {
        self.cache.shown().map(|(fingerprint, _)| fingerprint)
    }

    pub fn peek(&self, key: &ProjectionKey) -> Option<Arc<Projection>> {
        self.cache.peek(&key.fingerprint())
    }

    pub fn is_in_flight(&self, key: &ProjectionKey) -> bool {
        self.cache.is_in_flight(&key.fingerprint())
    }

    pub fn in_flight_len(&self) -> usize {
        self.cache.in_flight_len()
    }

    /// Number of retained projections
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

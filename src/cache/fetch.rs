//! Request coalescing on top of the retention window
//!
//! At most one fetch is in flight per fingerprint. Concurrent callers share
//! the same `Shared` future; the first completion clears the in-flight marker
//! whether it succeeded or not, so a later call can try again.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;

use super::window::RecentWindow;
use crate::error::QueryError;
use crate::types::Fingerprint;

/// Pending or completed fetch, cloneable across coalesced callers
pub type SharedFetch<V> = Shared<BoxFuture<'static, Result<Arc<V>, QueryError>>>;

/// Result of consulting the cache
pub(crate) enum Lookup<V> {
    /// Value already retained
    Cached(Arc<V>),
    /// Identical fingerprint already has a fetch in flight
    Pending(SharedFetch<V>),
    /// A new fetch was registered; the caller must make sure it gets driven
    Started(SharedFetch<V>),
}

struct InFlight<V> {
    ticket: u64,
    fetch: SharedFetch<V>,
}

struct Inner<V> {
    window: RecentWindow<V>,
    in_flight: HashMap<Fingerprint, InFlight<V>>,
    next_ticket: u64,
}

pub(crate) struct FetchCache<V> {
    inner: Arc<Mutex<Inner<V>>>,
}

impl<V: Send + Sync + 'static> FetchCache<V> {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                window: RecentWindow::new(capacity),
                in_flight: HashMap::new(),
                next_ticket: 0,
            })),
        }
    }

    /// Return the retained value, join the pending fetch, or register `fetch`
    ///
    /// `relevant` is asked at completion time; a result it rejects, or one
    /// whose marker was invalidated meanwhile, resolves to `QueryError::Stale`
    /// and is not retained.
    pub(crate) fn lookup_or_start<F, R>(&self, fingerprint: Fingerprint, fetch: F, relevant: R) -> Lookup<V>
    where
        F: Future<Output = Result<V, QueryError>> + Send + 'static,
        R: Fn(&Fingerprint) -> bool + Send + 'static,
    {
        let mut inner = self.inner.lock();

        if let Some(value) = inner.window.get(&fingerprint) {
            return Lookup::Cached(value);
        }
        if let Some(pending) = inner.in_flight.get(&fingerprint) {
            return Lookup::Pending(pending.fetch.clone());
        }

        let ticket = inner.next_ticket;
        inner.next_ticket += 1;

        let shared_inner = Arc::clone(&self.inner);
        let future: BoxFuture<'static, Result<Arc<V>, QueryError>> = async move {
            let result = fetch.await;

            let mut inner = shared_inner.lock();
            let registered = inner
                .in_flight
                .get(&fingerprint)
                .map_or(false, |pending| pending.ticket == ticket);
            if registered {
                inner.in_flight.remove(&fingerprint);
            }

            let value = match result {
                Ok(value) => Arc::new(value),
                Err(error) => return Err(error),
            };
            if !registered || !relevant(&fingerprint) {
                return Err(QueryError::Stale(fingerprint));
            }
            inner.window.insert(fingerprint, Arc::clone(&value));
            Ok(value)
        }
        .boxed();

        let fetch = future.shared();
        inner.in_flight.insert(
            fingerprint,
            InFlight {
                ticket,
                fetch: fetch.clone(),
            },
        );
        Lookup::Started(fetch)
    }

    /// Retain a value obtained outside a fetch
    pub(crate) fn insert(&self, fingerprint: Fingerprint, value: Arc<V>) {
        self.inner.lock().window.insert(fingerprint, value);
    }

    pub(crate) fn peek(&self, fingerprint: &Fingerprint) -> Option<Arc<V>> {
        self.inner.lock().window.get(fingerprint)
    }

    /// Drop the retained value and forget any in-flight marker
    pub(crate) fn invalidate(&self, fingerprint: &Fingerprint) -> bool {
        let mut inner = self.inner.lock();
        let removed = inner.window.remove(fingerprint).is_some();
        let forgotten = inner.in_flight.remove(fingerprint).is_some();
        removed || forgotten
    }

    /// Drop the retained value only; a pending fetch keeps its callers
    pub(crate) fn forget(&self, fingerprint: &Fingerprint) -> bool {
        self.inner.lock().window.remove(fingerprint).is_some()
    }

    pub(crate) fn invalidate_all(&self) {
        let mut inner = self.inner.lock();
        inner.window.clear();
        inner.in_flight.clear();
    }

    pub(crate) fn is_in_flight(&self, fingerprint: &Fingerprint) -> bool {
        self.inner.lock().in_flight.contains_key(fingerprint)
    }

    pub(crate) fn in_flight_len(&self) -> usize {
        self.inner.lock().in_flight.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.lock().window.len()
    }
}

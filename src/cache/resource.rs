//! Relevance-checked cache shared by projections and node details
//!
//! Wraps [`FetchCache`] with the selection store's current fingerprint:
//! results are retained and displayed only while they still match it.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use futures::future::{self, FutureExt};
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::fetch::{FetchCache, Lookup, SharedFetch};
use crate::error::QueryError;
use crate::selection::SelectionSnapshot;
use crate::types::Fingerprint;
use crate::view::{ViewEvent, ViewNotifier};

/// A cacheable resource derived from the current selection
pub(crate) trait Resource: Send + Sync + 'static {
    type Value: Send + Sync + 'static;

    /// Resource name for logs
    const KIND: &'static str;

    /// Fingerprint this resource should currently be showing
    fn current(snapshot: &SelectionSnapshot) -> Option<Fingerprint>;

    fn ready_event(fingerprint: Fingerprint) -> ViewEvent;

    fn failed_event(fingerprint: Fingerprint, error: QueryError) -> ViewEvent;
}

type Shown<V> = Option<(Fingerprint, Arc<V>)>;

/// The value views render, plus the relevance check guarding it
struct Presenter<R: Resource> {
    current: watch::Receiver<Arc<SelectionSnapshot>>,
    shown: Arc<Mutex<Shown<R::Value>>>,
    notifier: ViewNotifier,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> Clone for Presenter<R> {
    fn clone(&self) -> Self {
        Self {
            current: self.current.clone(),
            shown: Arc::clone(&self.shown),
            notifier: self.notifier.clone(),
            _resource: PhantomData,
        }
    }
}

impl<R: Resource> Presenter<R> {
    fn is_current(&self, fingerprint: &Fingerprint) -> bool {
        R::current(&self.current.borrow()) == Some(*fingerprint)
    }

    /// Show `value` if it still matches the selection
    fn show(&self, fingerprint: Fingerprint, value: Arc<R::Value>) -> bool {
        if !self.is_current(&fingerprint) {
            debug!(kind = R::KIND, fingerprint = ?fingerprint, "discarding superseded result");
            return false;
        }

        let mut shown = self.shown.lock();
        let unchanged = matches!(&*shown, Some((fp, v)) if *fp == fingerprint && Arc::ptr_eq(v, &value));
        if !unchanged {
            *shown = Some((fingerprint, value));
            drop(shown);
            self.notifier.publish(R::ready_event(fingerprint));
        }
        true
    }

    /// Report a completed fetch to views
    fn settle(&self, fingerprint: Fingerprint, outcome: Result<Arc<R::Value>, QueryError>) {
        match outcome {
            Ok(value) => {
                self.show(fingerprint, value);
            }
            Err(QueryError::Stale(_)) => {
                debug!(kind = R::KIND, fingerprint = ?fingerprint, "dropped stale response");
            }
            Err(error) => {
                if self.is_current(&fingerprint) {
                    warn!(kind = R::KIND, fingerprint = ?fingerprint, error = %error, "fetch failed");
                    self.notifier.publish(R::failed_event(fingerprint, error));
                } else {
                    debug!(kind = R::KIND, fingerprint = ?fingerprint, error = %error, "superseded fetch failed");
                }
            }
        }
    }
}

pub(crate) struct ResourceCache<R: Resource> {
    entries: FetchCache<R::Value>,
    presenter: Presenter<R>,
}

impl<R: Resource> ResourceCache<R> {
    pub(crate) fn new(
        current: watch::Receiver<Arc<SelectionSnapshot>>,
        capacity: usize,
        notifier: ViewNotifier,
    ) -> Self {
        Self {
            entries: FetchCache::new(capacity),
            presenter: Presenter {
                current,
                shown: Arc::new(Mutex::new(None)),
                notifier,
                _resource: PhantomData,
            },
        }
    }

    /// Serve from cache, join the pending request, or start `fetch`
    ///
    /// A newly started fetch is spawned so it completes even if every caller
    /// drops its future; its completion handler re-checks relevance.
    pub(crate) fn get<F>(&self, fingerprint: Fingerprint, fetch: F) -> SharedFetch<R::Value>
    where
        F: Future<Output = Result<R::Value, QueryError>> + Send + 'static,
    {
        let relevance = self.presenter.clone();
        let lookup = self
            .entries
            .lookup_or_start(fingerprint, fetch, move |fp| relevance.is_current(fp));

        match lookup {
            Lookup::Cached(value) => {
                debug!(kind = R::KIND, fingerprint = ?fingerprint, "cache hit");
                self.presenter.show(fingerprint, Arc::clone(&value));
                ready(Ok(value))
            }
            Lookup::Pending(pending) => {
                debug!(kind = R::KIND, fingerprint = ?fingerprint, "joining in-flight request");
                pending
            }
            Lookup::Started(fetch) => {
                debug!(kind = R::KIND, fingerprint = ?fingerprint, "fetch started");
                let presenter = self.presenter.clone();
                let driver = fetch.clone();
                tokio::spawn(async move {
                    let outcome = driver.await;
                    presenter.settle(fingerprint, outcome);
                });
                fetch
            }
        }
    }

    /// Resolve locally without a request, still subject to relevance
    pub(crate) fn resolve_local(&self, fingerprint: Fingerprint, value: R::Value) -> SharedFetch<R::Value> {
        let value = Arc::new(value);
        self.presenter.show(fingerprint, Arc::clone(&value));
        ready(Ok(value))
    }

    /// Accept a value pushed by the server; retained only if current
    pub(crate) fn offer(&self, fingerprint: Fingerprint, value: R::Value) -> bool {
        if !self.presenter.is_current(&fingerprint) {
            debug!(kind = R::KIND, fingerprint = ?fingerprint, "ignoring pushed result for another selection");
            return false;
        }
        let value = Arc::new(value);
        self.entries.insert(fingerprint, Arc::clone(&value));
        self.presenter.show(fingerprint, value)
    }

    pub(crate) fn invalidate(&self, fingerprint: &Fingerprint) -> bool {
        self.entries.invalidate(fingerprint)
    }

    pub(crate) fn forget(&self, fingerprint: &Fingerprint) -> bool {
        self.entries.forget(fingerprint)
    }

    pub(crate) fn invalidate_all(&self) {
        self.entries.invalidate_all();
    }

    pub(crate) fn peek(&self, fingerprint: &Fingerprint) -> Option<Arc<R::Value>> {
        self.entries.peek(fingerprint)
    }

    /// Last good value shown for the selection
    pub(crate) fn shown(&self) -> Option<(Fingerprint, Arc<R::Value>)> {
        self.presenter.shown.lock().clone()
    }

    pub(crate) fn is_in_flight(&self, fingerprint: &Fingerprint) -> bool {
        self.entries.is_in_flight(fingerprint)
    }

    pub(crate) fn in_flight_len(&self) -> usize {
        self.entries.in_flight_len()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

fn ready<V: Send + Sync + 'static>(outcome: Result<Arc<V>, QueryError>) -> SharedFetch<V> {
    future::ready(outcome).boxed().shared()
}

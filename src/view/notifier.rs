//! View update broadcaster
//!
//! Store, caches and session publish what changed; view adapters subscribe
//! and re-read the store+cache pair on each update.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;

use crate::error::QueryError;
use crate::types::{Fingerprint, GraphId};

/// Things view adapters re-render on
#[derive(Clone, Debug, PartialEq)]
pub enum ViewEvent {
    /// Selection, transitive flag or extra nodes changed
    SelectionChanged {
        revision: u64,
        fingerprint: Option<Fingerprint>,
    },

    /// Projection for the current fingerprint is available
    ProjectionReady { fingerprint: Fingerprint },

    /// Projection fetch failed; the last good projection stays visible
    ProjectionFailed {
        fingerprint: Fingerprint,
        error: QueryError,
    },

    /// Node details for the current selection are available
    NodeDetailsReady { fingerprint: Fingerprint },

    /// Node details fetch failed
    NodeDetailsFailed {
        fingerprint: Fingerprint,
        error: QueryError,
    },

    /// Path explorer changed state
    PathChanged,

    /// A different graph file became active
    GraphSelected { graph: GraphId },

    /// Graph file list was reloaded
    GraphFilesChanged,

    /// Node catalog of the active graph was replaced
    NodeCatalogChanged,

    /// Graph analysis counts arrived
    AnalysisReady,
}

/// View event wrapper with metadata
#[derive(Clone, Debug)]
pub struct ViewUpdate {
    pub event: ViewEvent,

    /// Monotonically increasing sequence ID for gap detection
    pub sequence_id: u64,

    /// Unix timestamp (milliseconds) when the update was published
    pub timestamp: i64,
}

/// Broadcaster for view updates
#[derive(Clone)]
pub struct ViewNotifier {
    tx: broadcast::Sender<ViewUpdate>,
    sequence_counter: Arc<AtomicU64>,
}

impl ViewNotifier {
    /// Create a notifier buffering up to `capacity` updates per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            sequence_counter: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: ViewEvent) {
        let seq = self.sequence_counter.fetch_add(1, Ordering::SeqCst);
        let update = ViewUpdate {
            event,
            sequence_id: seq,
            timestamp: chrono::Utc::now().timestamp_millis(),
        };
        // No subscribers is fine
        let _ = self.tx.send(update);
    }

    /// Get the current sequence ID
    pub fn current_sequence_id(&self) -> u64 {
        self.sequence_counter.load(Ordering::SeqCst)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ViewUpdate> {
        self.tx.subscribe()
    }
}

impl Default for ViewNotifier {
    fn default() -> Self {
        Self::new(256)
    }
}

//! Path explorer state machine
//!
//! `Idle -> Pending(from, to) -> Ready(PathSet) | Failed`. A new pair
//! submitted from any state goes back to `Pending`; a response is applied
//! only while its pair is still the pending one.

use std::collections::BTreeSet;

use tracing::debug;

use crate::error::{PathError, QueryError};
use crate::types::{NodeId, PathResponse, PathSet};

/// Current state of path discovery
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PathState {
    #[default]
    Idle,
    Pending { from: NodeId, to: NodeId },
    Ready(PathSet),
    Failed {
        from: NodeId,
        to: NodeId,
        error: QueryError,
    },
}

/// Ticket for one submitted path query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRequest {
    pub from: NodeId,
    pub to: NodeId,
    generation: u64,
}

/// What happened to a path response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Paths are ready; these extra nodes must be drawn to show them
    Applied { extra_nodes: BTreeSet<NodeId> },
    /// The query failed and the explorer is now `Failed`
    Failed,
    /// The request was superseded or cleared meanwhile
    Discarded,
}

#[derive(Debug, Default)]
pub struct PathExplorer {
    state: PathState,
    from: Option<NodeId>,
    to: Option<NodeId>,
    generation: u64,
}

impl PathExplorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &PathState {
        &self.state
    }

    pub fn from_node(&self) -> Option<&NodeId> {
        self.from.as_ref()
    }

    pub fn to_node(&self) -> Option<&NodeId> {
        self.to.as_ref()
    }

    /// The ready path set, if any
    pub fn paths(&self) -> Option<&PathSet> {
        match &self.state {
            PathState::Ready(set) => Some(set),
            _ => None,
        }
    }

    /// Start a query for `from -> to`, even if the same pair just failed
    pub fn submit(&mut self, from: NodeId, to: NodeId) -> PathRequest {
        self.generation += 1;
        self.from = Some(from.clone());
        self.to = Some(to.clone());
        self.state = PathState::Pending {
            from: from.clone(),
            to: to.clone(),
        };
        PathRequest {
            from,
            to,
            generation: self.generation,
        }
    }

    /// Apply a path response if `request` is still the pending one
    pub fn resolve(&mut self, request: &PathRequest, result: Result<PathResponse, QueryError>) -> Resolution {
        if !self.is_pending(request) {
            debug!(from = %request.from, to = %request.to, "discarding superseded path response");
            return Resolution::Discarded;
        }

        match result {
            Ok(response) => {
                let extra_nodes = response.extra_nodes.iter().cloned().collect();
                let set = PathSet::new(request.from.clone(), request.to.clone(), response.paths);
                self.state = PathState::Ready(set);
                Resolution::Applied { extra_nodes }
            }
            Err(error) if error.is_stale() => Resolution::Discarded,
            Err(error) => {
                self.state = PathState::Failed {
                    from: request.from.clone(),
                    to: request.to.clone(),
                    error,
                };
                Resolution::Failed
            }
        }
    }

    /// Whether `request` is the query the explorer is waiting on
    pub fn is_pending(&self, request: &PathRequest) -> bool {
        request.generation == self.generation
            && matches!(&self.state, PathState::Pending { from, to } if *from == request.from && *to == request.to)
    }

    /// Highlight a path; -1 removes the highlight. Purely local.
    pub fn select_path(&mut self, index: isize) -> Result<(), PathError> {
        let PathState::Ready(set) = &mut self.state else {
            return Err(PathError::NotReady);
        };
        if !set.accepts_index(index) {
            return Err(PathError::IndexOutOfRange {
                index,
                len: set.len(),
            });
        }
        set.selected_path_index = index;
        Ok(())
    }

    /// Change the start node
    ///
    /// A different (or cleared) endpoint no longer matches the path set, so
    /// the explorer returns to `Idle`. Returns whether a path state was
    /// dropped.
    pub fn set_from(&mut self, from: Option<NodeId>) -> bool {
        if self.from == from {
            return false;
        }
        self.from = from;
        self.reset()
    }

    /// Change the end node; see [`PathExplorer::set_from`]
    pub fn set_to(&mut self, to: Option<NodeId>) -> bool {
        if self.to == to {
            return false;
        }
        self.to = to;
        self.reset()
    }

    /// Forget both endpoints and any path set
    pub fn clear(&mut self) {
        self.from = None;
        self.to = None;
        self.reset();
    }

    fn reset(&mut self) -> bool {
        // outstanding responses no longer match
        self.generation += 1;
        std::mem::take(&mut self.state) != PathState::Idle
    }
}

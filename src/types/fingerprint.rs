//! Projection request keys and their fingerprints
//!
//! A fingerprint is a SHA-256 digest over a canonical, length-prefixed encoding
//! of a request key. Sets are kept in `BTreeSet`s so equal inputs hash equally
//! regardless of the order nodes were selected in.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{GraphId, NodeId};

/// Deterministic key of a cacheable request
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Short hex prefix for logs
    pub fn short(&self) -> String {
        self.0[..6].iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.short())
    }
}

/// Incremental canonical encoder behind every fingerprint
struct KeyHasher(Sha256);

impl KeyHasher {
    fn new(domain: &str) -> Self {
        let mut hasher = Self(Sha256::new());
        hasher.field(domain.as_bytes());
        hasher
    }

    fn field(&mut self, bytes: &[u8]) {
        self.0.update((bytes.len() as u64).to_le_bytes());
        self.0.update(bytes);
    }

    fn set(&mut self, ids: &BTreeSet<NodeId>) {
        self.0.update((ids.len() as u64).to_le_bytes());
        for id in ids {
            self.field(id.as_str().as_bytes());
        }
    }

    fn flag(&mut self, value: bool) {
        self.0.update([u8::from(value)]);
    }

    fn finish(self) -> Fingerprint {
        let digest = self.0.finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Fingerprint(bytes)
    }
}

/// Inputs of a graph projection request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectionKey {
    pub graph: GraphId,
    pub selected: BTreeSet<NodeId>,
    pub transitive: bool,
    pub extra: BTreeSet<NodeId>,
}

impl ProjectionKey {
    /// Create a key without extra nodes
    pub fn new(graph: GraphId, selected: BTreeSet<NodeId>, transitive: bool) -> Self {
        Self {
            graph,
            selected,
            transitive,
            extra: BTreeSet::new(),
        }
    }

    /// Same key with the given extra nodes
    pub fn with_extra(mut self, extra: BTreeSet<NodeId>) -> Self {
        self.extra = extra;
        self
    }

    /// A key with neither selected nor extra nodes projects to nothing
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty() && self.extra.is_empty()
    }

    pub fn fingerprint(&self) -> Fingerprint {
        let mut hasher = KeyHasher::new("projection");
        hasher.field(self.graph.as_str().as_bytes());
        hasher.set(&self.selected);
        hasher.flag(self.transitive);
        hasher.set(&self.extra);
        hasher.finish()
    }

    /// Key of the node-details request for the same selection
    pub fn details_key(&self) -> DetailsKey {
        DetailsKey {
            graph: self.graph.clone(),
            selected: self.selected.clone(),
            transitive: self.transitive,
        }
    }
}

/// Inputs of a node-details request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DetailsKey {
    pub graph: GraphId,
    pub selected: BTreeSet<NodeId>,
    pub transitive: bool,
}

impl DetailsKey {
    pub fn fingerprint(&self) -> Fingerprint {
        let mut hasher = KeyHasher::new("details");
        hasher.field(self.graph.as_str().as_bytes());
        hasher.set(&self.selected);
        hasher.flag(self.transitive);
        hasher.finish()
    }
}

//! Client configuration
//!
//! Defaults can be overridden through `DEPGRAPH_*` environment variables.

use std::env;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::types::ReplicaId;

/// Configuration for a client session
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the graph server REST API
    pub server_url: String,
    /// Websocket URL of the push channel (no push channel when unset)
    pub push_url: Option<String>,
    /// Replica identity on the push channel (generated when unset)
    pub replica_id: Option<String>,
    /// Number of recent projections retained by the cache
    pub cache_capacity: usize,
    /// Number of recent node-detail results retained
    pub details_capacity: usize,
    /// Transport timeout for gateway requests
    #[serde(with = "secs")]
    pub request_timeout: Duration,
    /// Buffered view updates before slow subscribers start lagging
    pub update_buffer: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:5000".to_string(),
            push_url: None,
            replica_id: None,
            cache_capacity: 16,
            details_capacity: 16,
            request_timeout: Duration::from_secs(60),
            update_buffer: 256,
        }
    }
}

impl ClientConfig {
    /// Load configuration from the environment on top of the defaults
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(url) = lookup("DEPGRAPH_SERVER_URL") {
            config.server_url = url;
        }
        if let Some(url) = lookup("DEPGRAPH_PUSH_URL") {
            config.push_url = Some(url).filter(|u| !u.is_empty());
        }
        if let Some(id) = lookup("DEPGRAPH_REPLICA_ID") {
            config.replica_id = Some(id).filter(|i| !i.is_empty());
        }
        if let Some(value) = lookup("DEPGRAPH_CACHE_CAPACITY") {
            config.cache_capacity = parse_number("DEPGRAPH_CACHE_CAPACITY", &value)?;
        }
        if let Some(value) = lookup("DEPGRAPH_DETAILS_CAPACITY") {
            config.details_capacity = parse_number("DEPGRAPH_DETAILS_CAPACITY", &value)?;
        }
        if let Some(value) = lookup("DEPGRAPH_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = parse_number("DEPGRAPH_REQUEST_TIMEOUT_SECS", &value)?;
            config.request_timeout = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values the session cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.server_url.trim().is_empty() {
            return Err(Error::Config("server_url must not be empty".to_string()));
        }
        if self.update_buffer == 0 {
            return Err(Error::Config("update_buffer must be positive".to_string()));
        }
        Ok(())
    }

    /// Replica id from configuration, or a freshly generated one
    pub fn replica(&self) -> ReplicaId {
        match &self.replica_id {
            Some(id) => ReplicaId::new(id.clone()),
            None => ReplicaId::generate(),
        }
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{} must be a non-negative integer, got '{}'", key, value)))
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

//! Derived-view caches
//!
//! - `window`: bounded recent-fingerprint retention
//! - `fetch`: request coalescing, one in-flight fetch per fingerprint
//! - `resource`: relevance checks against the selection store
//! - `projection` / `details`: the two cached resources views render

mod details;
mod fetch;
mod projection;
mod resource;
mod window;

pub use details::{DetailsFuture, NodeDetailsCache};
pub use fetch::SharedFetch;
pub use projection::{GraphProjectionCache, ProjectionFuture};

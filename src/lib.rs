//! Dependency Graph Sync
//!
//! Client core for browsing a server-computed software dependency graph:
//! keeps selection, cached projections and path discovery consistent across
//! local edits and collaborators on a shared push channel.
//!
//! # Features
//!
//! - **Single Writer**: one selection store, immutable snapshots, atomic fingerprints
//! - **Request Coalescing**: at most one projection fetch in flight per fingerprint
//! - **Staleness Suppression**: superseded responses complete and are discarded
//! - **Collaboration**: selection changes relayed over a websocket push channel
//! - **Path Discovery**: two-stage path query with a dependent projection fetch
//!
//! # Modules
//!
//! - `types`: Core data structures (Node, Edge, Projection, Fingerprint)
//! - `selection`: Selection store and snapshots
//! - `cache`: Projection and node-details caches
//! - `gateway`: REST query gateway
//! - `channel`: Push channel messages and transports
//! - `path`: Path explorer state machine
//! - `view`: View notifications and read model
//! - `session`: Facade wiring everything together
//!
//! # Example
//!
//! ```no_run
//! use depgraph_sync::{ClientConfig, NodeId, Session};
//!
//! #[tokio::main]
//! async fn main() -> depgraph_sync::Result<()> {
//!     let config = ClientConfig::from_env()?;
//!     let (session, _push) = Session::connect(&config).await?;
//!
//!     session.load_graph_files().await?;
//!     let projection = session.select_node(&NodeId::from("src/libbase.so"), true)?.await?;
//!     println!("{} nodes", projection.node_count());
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod channel;
pub mod config;
pub mod error;
pub mod gateway;
pub mod path;
pub mod selection;
pub mod session;
pub mod types;
pub mod view;

// Re-export commonly used items at crate root
pub use cache::{GraphProjectionCache, NodeDetailsCache, ProjectionFuture};
pub use channel::{LoopbackHub, RemoteEventChannel, WebSocketTransport};
pub use config::ClientConfig;
pub use error::{Error, QueryError, Result};
pub use gateway::{HttpGateway, QueryGateway};
pub use path::{PathExplorer, PathState};
pub use selection::{SelectionSnapshot, SelectionStore};
pub use session::{PathOutcome, Session};
pub use types::{
    Edge, Fingerprint, GraphFile, GraphId, Node, NodeId, PathSet, Projection, ProjectionKey,
    ReplicaId, SelectionEvent,
};
pub use view::{ViewEvent, ViewState, ViewUpdate};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

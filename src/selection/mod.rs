//! Selection state
//!
//! `SelectionStore` is the only writer; everyone else reads immutable
//! `SelectionSnapshot`s through a watch channel.

mod snapshot;
mod store;

pub use snapshot::SelectionSnapshot;
pub use store::SelectionStore;

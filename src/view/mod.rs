//! View adapter support: update notifications and the read model

mod notifier;
mod state;

pub use notifier::{ViewEvent, ViewNotifier, ViewUpdate};
pub use state::ViewState;

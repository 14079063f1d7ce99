#![warn(clippy::missing_docs_in_private_items)]

/// Channel and transfer states.
mod state;
/// Channel updates and user parameters.
mod update;

pub use state::*;
pub use update::*;

#![warn(clippy::missing_docs_in_private_items)]

use conduit_primitives::types::{
	DefundNonce,
	Nonce,
};

/// The nonce a channel is born with.
pub const SETUP_NONCE: Nonce = 1;

/// Per-asset defund counters start at one; the adjudicator increments them
/// on every withdrawal.
pub const INITIAL_DEFUND_NONCE: DefundNonce = 1;

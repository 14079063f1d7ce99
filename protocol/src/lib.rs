#![warn(clippy::missing_docs_in_private_items)]

//! The update protocol engine: the `outbound` and `inbound` procedures
//! that propose, validate, apply and synchronize signed channel updates
//! while keeping the two participants' replicas consistent.

/// Protocol errors.
pub mod errors;
/// Per-channel serialization.
pub mod queue;
/// The outbound/inbound sync procedures.
pub mod sync;
#[cfg(test)]
mod tests;
/// External validation hook.
pub mod traits;
/// Update generation and inbound validation.
pub mod validation;

use std::sync::Arc;

use conduit_blockchain::{
	keys::PrivateKey,
	reader::ChainReader,
};
use conduit_primitives::types::PublicIdentifier;
use conduit_storage::Store;
use conduit_transport::Messaging;
use web3::signing::Key;

use crate::{
	queue::ChannelLocks,
	traits::{
		ExternalValidation,
		NoopValidation,
	},
};

/// One participant's protocol engine.
///
/// Collaborators are passed in explicitly; the engine holds no process-wide
/// state. A single engine serves every channel its identifier participates
/// in, serialized per channel by [`ChannelLocks`].
pub struct ProtocolEngine {
	/// The participant's signing key.
	signer: PrivateKey,
	/// The address of the signing key, used as the messaging identity.
	public_identifier: PublicIdentifier,
	/// Channel and transfer persistence.
	store: Arc<dyn Store>,
	/// Read-only chain access.
	chain: Arc<dyn ChainReader>,
	/// Delivery to the counterparty's `inbound`.
	messaging: Arc<dyn Messaging>,
	/// Application-level validation hook.
	external: Arc<dyn ExternalValidation>,
	/// Per-channel mutual exclusion.
	locks: ChannelLocks,
}

impl ProtocolEngine {
	pub fn new(
		signer: PrivateKey,
		store: Arc<dyn Store>,
		chain: Arc<dyn ChainReader>,
		messaging: Arc<dyn Messaging>,
		external: Option<Arc<dyn ExternalValidation>>,
	) -> Self {
		let public_identifier = signer.address();
		Self {
			signer,
			public_identifier,
			store,
			chain,
			messaging,
			external: external.unwrap_or_else(|| Arc::new(NoopValidation)),
			locks: ChannelLocks::new(),
		}
	}

	/// The messaging identity of this participant.
	pub fn public_identifier(&self) -> PublicIdentifier {
		self.public_identifier
	}
}

use conduit_blockchain::errors::ChainError;
use conduit_state_machine::{
	errors::ChannelError,
	types::ChannelUpdate,
};
use conduit_storage::errors::StorageError;
use conduit_transport::errors::TransportError;
use thiserror::Error;

/// The protocol error taxonomy.
///
/// Errors are values returned to the caller, never panics; replica state is
/// mutated only on success.
#[derive(Error, Debug)]
pub enum ProtocolError {
	/// The received nonce is in the past. Carries this replica's latest
	/// committed update so the counterparty can synchronize.
	#[error("Update nonce is behind this replica")]
	StaleUpdate(Box<ChannelUpdate>),
	#[error("Counterparty offered a single-signed update to sync")]
	SyncSingleSigned,
	#[error("Synchronizing a setup update is not possible")]
	CannotSyncSetup,
	#[error("Nonce gap is wider than one update, replica needs restore")]
	RestoreNeeded,
	#[error("Invalid parameters: {0}")]
	InvalidParams(String),
	#[error("Invalid update: {0}")]
	InvalidUpdate(#[from] ChannelError),
	#[error("External validation failed: {0}")]
	ExternalValidationFailed(String),
	#[error("Bad signatures: {0}")]
	BadSignatures(String),
	#[error("Counterparty failure: {0}")]
	CounterpartyFailure(String),
	#[error("Signing failed: {0}")]
	Signing(String),
	#[error("Store failure: {0}")]
	Store(StorageError),
	#[error("Chain error: {0}")]
	Chain(#[from] ChainError),
}

impl From<StorageError> for ProtocolError {
	fn from(e: StorageError) -> Self {
		Self::Store(e)
	}
}

impl From<TransportError> for ProtocolError {
	fn from(e: TransportError) -> Self {
		Self::CounterpartyFailure(e.to_string())
	}
}

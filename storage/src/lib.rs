#![warn(clippy::missing_docs_in_private_items)]

//! Persistence for conduit channels: the store contract consumed by the
//! protocol engine and its sqlite implementation.

/// Storage errors.
pub mod errors;
/// Embedded database schema.
pub mod sqlite;
/// Sqlite-backed store.
pub mod state;

use async_trait::async_trait;
use conduit_primitives::types::{
	ChannelAddress,
	Nonce,
	TransferId,
};
use conduit_state_machine::types::{
	ChannelUpdate,
	FullChannelState,
	FullTransferState,
};

use crate::errors::StorageError;

pub type Result<T> = std::result::Result<T, StorageError>;

/// A transfer installed or removed by the update being persisted.
#[derive(Clone, Debug)]
pub enum TransferChange {
	Created(FullTransferState),
	Resolved(TransferId),
}

/// The store contract.
///
/// The engine is the exclusive writer per channel address and
/// `save_channel_state` must commit the channel state, the update archive
/// row and the transfer change in one atomic step.
#[async_trait]
pub trait Store: Send + Sync {
	/// The replica's channel state, if the channel exists.
	async fn get_channel_state(
		&self,
		channel_address: ChannelAddress,
	) -> Result<Option<FullChannelState>>;

	/// The active transfers of a channel in canonical order.
	async fn get_active_transfers(
		&self,
		channel_address: ChannelAddress,
	) -> Result<Vec<FullTransferState>>;

	/// The committed update at the given nonce, if archived.
	async fn get_update_by_nonce(
		&self,
		channel_address: ChannelAddress,
		nonce: Nonce,
	) -> Result<Option<ChannelUpdate>>;

	/// Atomically persist the channel state and the transfer change of the
	/// update that produced it.
	async fn save_channel_state(
		&self,
		state: FullChannelState,
		transfer_change: Option<TransferChange>,
	) -> Result<()>;
}

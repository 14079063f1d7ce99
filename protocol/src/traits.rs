#![warn(clippy::missing_docs_in_private_items)]

use async_trait::async_trait;
use conduit_state_machine::types::{
	ChannelUpdate,
	FullChannelState,
	FullTransferState,
	UpdateParams,
};

/// Application-level validation consulted before an update is signed or
/// countersigned.
///
/// A failure is fatal for the current update but never corrupts stored
/// state.
#[async_trait]
pub trait ExternalValidation: Send + Sync {
	async fn validate_outbound(
		&self,
		params: &UpdateParams,
		state: Option<&FullChannelState>,
		active_transfers: &[FullTransferState],
	) -> Result<(), String>;

	async fn validate_inbound(
		&self,
		update: &ChannelUpdate,
		state: Option<&FullChannelState>,
		active_transfers: &[FullTransferState],
	) -> Result<(), String>;
}

/// The default hook: accepts every update.
pub struct NoopValidation;

#[async_trait]
impl ExternalValidation for NoopValidation {
	async fn validate_outbound(
		&self,
		_params: &UpdateParams,
		_state: Option<&FullChannelState>,
		_active_transfers: &[FullTransferState],
	) -> Result<(), String> {
		Ok(())
	}

	async fn validate_inbound(
		&self,
		_update: &ChannelUpdate,
		_state: Option<&FullChannelState>,
		_active_transfers: &[FullTransferState],
	) -> Result<(), String> {
		Ok(())
	}
}

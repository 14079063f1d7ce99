use conduit_primitives::types::{
	Address,
	AssetId,
	Nonce,
	TransferId,
	TransferTimeout,
};
use thiserror::Error;

use crate::types::ChannelSide;

/// Rejections produced by the pure validators and the applier.
///
/// None of these mutate state; a failed update leaves both replicas at the
/// last committed nonce.
#[derive(Error, Debug)]
pub enum ChannelError {
	#[error("Channel already exists")]
	AlreadySetup,
	#[error("Update requires an existing channel")]
	NoChannel,
	#[error("Update is for channel `{got}`, replica holds `{expected}`")]
	WrongChannel { expected: Address, got: Address },
	#[error("`{0}` is not a participant of this channel")]
	InvalidParticipant(Address),
	#[error("Update nonce `{got}` does not follow committed nonce, expected `{expected}`")]
	InvalidNonce { expected: Nonce, got: Nonce },
	#[error("Asset `{0}` is not tracked by this channel")]
	UnknownAsset(AssetId),
	#[error("Insufficient channel balance for asset `{0}`")]
	InsufficientFunds(AssetId),
	#[error("Balance arithmetic overflow")]
	AmountOverflow,
	#[error("Deposit totals are behind processed deposits")]
	DepositRegression,
	#[error("Transfer `{0}` is already active")]
	DuplicateTransfer(TransferId),
	#[error("Transfer `{0}` is not active")]
	UnknownTransfer(TransferId),
	#[error("Transfer timeout `{0}` is outside policy bounds")]
	TransferTimeoutOutOfBounds(TransferTimeout),
	#[error("Transfer payout target `{0}` is not a channel participant")]
	InvalidTransferTarget(Address),
	#[error("Transfer identifier does not match its derivation")]
	TransferIdMismatch,
	#[error("Resolver payload is not well-formed")]
	InvalidResolver,
	#[error("Resolve update requires a resolved payout")]
	MissingResolution,
	#[error("Resolved payout does not preserve the locked amount")]
	PayoutMismatch,
	#[error("Update balance does not match the applied result")]
	BalanceMismatch,
	#[error("Value conservation violated for asset `{0}`")]
	ConservationViolated(AssetId),
	#[error("Invalid signature: {0}")]
	InvalidSignature(String),
	#[error("Missing required signature for {0}")]
	MissingSignature(ChannelSide),
	#[error("Encoding error: {0}")]
	Encoding(#[from] serde_json::Error),
}

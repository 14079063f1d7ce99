#![warn(clippy::missing_docs_in_private_items)]

use conduit_state_machine::types::ChannelUpdate;
use derive_more::Display;
use serde::{
	Deserialize,
	Serialize,
};

/// Error codes a responder attaches to a rejected protocol request.
#[derive(Copy, Clone, Debug, Display, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyErrorCode {
	#[display(fmt = "stale_update")]
	StaleUpdate,
	#[display(fmt = "restore_needed")]
	RestoreNeeded,
	#[display(fmt = "sync_single_signed")]
	SyncSingleSigned,
	#[display(fmt = "cannot_sync_setup")]
	CannotSyncSetup,
	#[display(fmt = "invalid_update")]
	InvalidUpdate,
	#[display(fmt = "bad_signatures")]
	BadSignatures,
	#[display(fmt = "external_validation_failed")]
	ExternalValidationFailed,
	#[display(fmt = "internal_error")]
	InternalError,
}

/// A protocol request: the proposed update and the initiator's latest
/// committed update, used by the responder for one-step catch-up.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ProtocolRequest {
	pub request_id: String,
	pub update: ChannelUpdate,
	pub previous_update: Option<ChannelUpdate>,
}

/// A success reply: the same update carrying both commitment signatures.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ProtocolResponse {
	pub request_id: String,
	pub update: ChannelUpdate,
	pub previous_update: Option<ChannelUpdate>,
}

/// An error reply. On stale nonces `latest_update` carries the responder's
/// committed update so the initiator can synchronize.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ProtocolErrorReply {
	pub request_id: String,
	pub code: ReplyErrorCode,
	pub message: String,
	pub latest_update: Option<ChannelUpdate>,
}

/// The responder's reply, delivered to the initiator verbatim.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProtocolReply {
	Response(ProtocolResponse),
	Error(ProtocolErrorReply),
}

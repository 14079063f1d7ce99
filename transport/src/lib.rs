#![warn(clippy::missing_docs_in_private_items)]

//! The messaging contract between the two replicas of a channel: wire
//! envelope types, the `Messaging` trait the engine consumes, and an
//! in-process transport pair for tests and demos.

/// Messaging configuration.
pub mod config;
/// Transport errors.
pub mod errors;
/// In-process transport pair.
pub mod local;
/// Wire envelope types.
pub mod messages;

use async_trait::async_trait;
use conduit_state_machine::types::ChannelUpdate;

use crate::{
	errors::TransportError,
	messages::ProtocolReply,
};

/// Request/response delivery to the counterparty's `inbound` procedure.
///
/// Implementations must deliver the update to the counterparty and return
/// its reply, success or error, verbatim.
#[async_trait]
pub trait Messaging: Send + Sync {
	async fn send_protocol_message(
		&self,
		update: ChannelUpdate,
		previous_update: Option<ChannelUpdate>,
	) -> Result<ProtocolReply, TransportError>;
}

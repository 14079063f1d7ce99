#![warn(clippy::missing_docs_in_private_items)]

use std::sync::Arc;

use conduit_primitives::identifiers;
use conduit_state_machine::{
	errors::ChannelError,
	machine::{
		validators,
		AppliedUpdate,
	},
	merkle::TransferSet,
	types::{
		ChannelUpdate,
		FullChannelState,
		FullTransferState,
		UpdateParams,
		UpdateType,
	},
	views,
};
use conduit_storage::TransferChange;
use conduit_transport::{
	local::LocalInbox,
	messages::{
		ProtocolErrorReply,
		ProtocolReply,
		ProtocolResponse,
		ReplyErrorCode,
	},
};
use derive_more::Display;
use tracing::{
	debug,
	info,
	warn,
};

use crate::{
	errors::ProtocolError,
	ProtocolEngine,
};

/// How an outbound call concluded.
#[derive(Copy, Clone, Debug, Display, Eq, PartialEq)]
pub enum OutboundStatus {
	/// Our proposal was countersigned and committed.
	#[display(fmt = "applied")]
	Applied,
	/// We were behind and caught up to the counterparty's committed update
	/// instead; the original proposal was not retransmitted.
	#[display(fmt = "synced")]
	Synced,
}

/// Result of a successful outbound call.
#[derive(Clone, Debug)]
pub struct OutboundResult {
	pub status: OutboundStatus,
	/// The committed channel state.
	pub channel: FullChannelState,
	/// The committed update: ours when `Applied`, the counterparty's when
	/// `Synced`.
	pub update: ChannelUpdate,
	/// The transfer installed or resolved by the committed update.
	pub transfer: Option<FullTransferState>,
}

/// Result of a successful inbound call.
#[derive(Clone, Debug)]
pub struct InboundResult {
	/// The update carrying both commitment signatures, returned to the
	/// initiator.
	pub update: ChannelUpdate,
	/// The committed channel state.
	pub channel: FullChannelState,
}

impl ProtocolEngine {
	/// Propose an update to the counterparty and commit it once
	/// countersigned.
	///
	/// On a stale-nonce reply the engine performs exactly one catch-up
	/// from the counterparty's committed update and returns `Synced`
	/// without retransmitting; re-proposing is the caller's choice.
	pub async fn outbound(&self, params: UpdateParams) -> Result<OutboundResult, ProtocolError> {
		let channel_address = match (&params, params.channel_address()) {
			(_, Some(address)) => address,
			(UpdateParams::Setup(setup), None) => identifiers::channel_address(
				setup.counterparty_identifier,
				self.public_identifier,
				setup.network_context.chain_id,
				setup.network_context.channel_factory_address,
			),
			_ => return Err(ProtocolError::InvalidParams("Missing channel address".to_owned())),
		};
		let _guard = self.locks.acquire(channel_address).await;

		let channel = self.store.get_channel_state(channel_address).await?;
		let active_transfers =
			TransferSet::from_transfers(self.store.get_active_transfers(channel_address).await?);

		let (update, applied) =
			self.validate_and_generate(&params, channel.as_ref(), &active_transfers).await?;
		debug!(
			channel = %channel_address,
			nonce = update.nonce,
			update_type = %update.update_type(),
			"Proposing update",
		);

		let previous_update = channel.as_ref().and_then(|state| state.latest_update.clone());
		let reply = self.messaging.send_protocol_message(update.clone(), previous_update).await?;

		match reply {
			ProtocolReply::Response(response) =>
				self.commit_countersigned(update, applied, response).await,
			ProtocolReply::Error(error) => match error.code {
				ReplyErrorCode::StaleUpdate => {
					let to_sync = error.latest_update.ok_or_else(|| {
						ProtocolError::CounterpartyFailure(
							"Stale-update reply carried no update to sync".to_owned(),
						)
					})?;
					self.sync_from_counterparty(channel.as_ref(), &active_transfers, to_sync)
						.await
				},
				code => Err(ProtocolError::CounterpartyFailure(format!(
					"{}: {}",
					code, error.message
				))),
			},
		}
	}

	/// Verify the countersigned response and persist the committed update.
	async fn commit_countersigned(
		&self,
		update: ChannelUpdate,
		applied: AppliedUpdate,
		response: ProtocolResponse,
	) -> Result<OutboundResult, ProtocolError> {
		let countersigned = response.update;
		if countersigned.id.id != update.id.id {
			return Err(ProtocolError::CounterpartyFailure(
				"Reply answers a different update".to_owned(),
			))
		}
		// Signature validation on the response is non-negotiable.
		validators::ensure_double_signed(&countersigned, &applied.channel.core)
			.map_err(|e| ProtocolError::BadSignatures(e.to_string()))?;

		let mut channel = applied.channel.clone();
		channel.latest_update = Some(countersigned.clone());
		let transfer_change = transfer_change_for(&countersigned, &applied);
		self.store.save_channel_state(channel.clone(), transfer_change).await?;

		info!(
			channel = %channel.core.channel_address,
			nonce = countersigned.nonce,
			update_type = %countersigned.update_type(),
			"Applied outbound update",
		);
		Ok(OutboundResult {
			status: OutboundStatus::Applied,
			channel,
			update: countersigned,
			transfer: applied.transfer,
		})
	}

	/// One-shot catch-up: apply the counterparty's committed update this
	/// replica missed. Never retransmits the original proposal.
	async fn sync_from_counterparty(
		&self,
		channel: Option<&FullChannelState>,
		active_transfers: &TransferSet,
		to_sync: ChannelUpdate,
	) -> Result<OutboundResult, ProtocolError> {
		if to_sync.update_type() == UpdateType::Setup {
			return Err(ProtocolError::CannotSyncSetup)
		}
		if !to_sync.is_double_signed() {
			return Err(ProtocolError::SyncSingleSigned)
		}
		let channel = channel.ok_or(ProtocolError::RestoreNeeded)?;
		if to_sync.nonce != views::next_nonce(channel.core.nonce) {
			return Err(ProtocolError::RestoreNeeded)
		}

		let applied =
			self.validate_and_apply(&to_sync, Some(channel), active_transfers, true).await?;
		let transfer_change = transfer_change_for(&to_sync, &applied);
		self.store.save_channel_state(applied.channel.clone(), transfer_change).await?;

		warn!(
			channel = %applied.channel.core.channel_address,
			nonce = to_sync.nonce,
			"Synchronized from counterparty, proposal not retransmitted",
		);
		Ok(OutboundResult {
			status: OutboundStatus::Synced,
			channel: applied.channel,
			update: to_sync,
			transfer: applied.transfer,
		})
	}

	/// Receive a proposed update, arbitrate its nonce, apply it and reply
	/// with both commitment signatures.
	pub async fn inbound(
		&self,
		update: ChannelUpdate,
		previous_update: Option<ChannelUpdate>,
	) -> Result<InboundResult, ProtocolError> {
		let _guard = self.locks.acquire(update.channel_address).await;

		let channel = self.store.get_channel_state(update.channel_address).await?;
		let active_transfers = TransferSet::from_transfers(
			self.store.get_active_transfers(update.channel_address).await?,
		);

		let channel = match channel {
			None => {
				// Only a setup update may arrive on an empty replica.
				if update.update_type() != UpdateType::Setup {
					return Err(ProtocolError::RestoreNeeded)
				}
				return self.apply_and_countersign(update, None, &active_transfers).await
			},
			Some(channel) => channel,
		};

		let expected = views::next_nonce(channel.core.nonce);
		if update.nonce < expected {
			return self.replay_or_stale(update, channel).await
		}
		if update.nonce == expected {
			return self.apply_and_countersign(update, Some(&channel), &active_transfers).await
		}
		if update.nonce == expected + 1 {
			// The counterparty is exactly one update ahead; catch up with
			// its committed previous update before applying the new one.
			let previous = previous_update.ok_or(ProtocolError::RestoreNeeded)?;
			if previous.nonce != expected {
				return Err(ProtocolError::RestoreNeeded)
			}
			if !previous.is_double_signed() {
				return Err(ProtocolError::SyncSingleSigned)
			}

			let applied =
				self.validate_and_apply(&previous, Some(&channel), &active_transfers, true).await?;
			let transfer_change = transfer_change_for(&previous, &applied);
			self.store.save_channel_state(applied.channel.clone(), transfer_change).await?;
			debug!(
				channel = %applied.channel.core.channel_address,
				nonce = previous.nonce,
				"Caught up from the initiator's previous update",
			);

			return self
				.apply_and_countersign(update, Some(&applied.channel), &applied.active_transfers)
				.await
		}

		Err(ProtocolError::RestoreNeeded)
	}

	/// A nonce in the past: either the retry of an update this replica
	/// already committed, answered idempotently, or a genuinely stale
	/// counterparty that is told to sync.
	async fn replay_or_stale(
		&self,
		update: ChannelUpdate,
		channel: FullChannelState,
	) -> Result<InboundResult, ProtocolError> {
		let latest = channel
			.latest_update
			.clone()
			.ok_or_else(|| ProtocolError::InvalidUpdate(ChannelError::NoChannel))?;

		if latest.nonce == update.nonce && latest.id.id == update.id.id {
			debug!(nonce = update.nonce, "Answering retry with the committed update");
			return Ok(InboundResult { update: latest, channel })
		}
		// Deep retries are answered from the archive as well.
		if let Some(committed) = self
			.store
			.get_update_by_nonce(channel.core.channel_address, update.nonce)
			.await?
		{
			if committed.id.id == update.id.id {
				debug!(nonce = update.nonce, "Answering retry with an archived update");
				return Ok(InboundResult { update: committed, channel })
			}
		}

		Err(ProtocolError::StaleUpdate(Box::new(latest)))
	}

	/// Validate and apply an expected-nonce update, countersign it and
	/// persist the result.
	async fn apply_and_countersign(
		&self,
		mut update: ChannelUpdate,
		channel: Option<&FullChannelState>,
		active_transfers: &TransferSet,
	) -> Result<InboundResult, ProtocolError> {
		let applied = self.validate_and_apply(&update, channel, active_transfers, false).await?;

		let digest = applied.channel.core.commitment_hash();
		let our_side =
			views::side_of(&applied.channel.core, self.public_identifier()).ok_or_else(|| {
				ProtocolError::InvalidUpdate(ChannelError::InvalidParticipant(
					self.public_identifier(),
				))
			})?;
		let signature = self
			.signer
			.sign_message_bytes(digest.as_bytes())
			.map_err(|e| ProtocolError::Signing(format!("{:?}", e)))?;
		update.set_signature(our_side, signature);

		let mut channel = applied.channel.clone();
		channel.latest_update = Some(update.clone());
		let transfer_change = transfer_change_for(&update, &applied);
		self.store.save_channel_state(channel.clone(), transfer_change).await?;

		info!(
			channel = %channel.core.channel_address,
			nonce = update.nonce,
			update_type = %update.update_type(),
			"Applied inbound update",
		);
		Ok(InboundResult { update, channel })
	}
}

/// The store-side transfer change implied by a committed update.
fn transfer_change_for(update: &ChannelUpdate, applied: &AppliedUpdate) -> Option<TransferChange> {
	match update.update_type() {
		UpdateType::Create => applied.transfer.clone().map(TransferChange::Created),
		UpdateType::Resolve =>
			applied.transfer.as_ref().map(|t| TransferChange::Resolved(t.core.transfer_id)),
		_ => None,
	}
}

/// Map an inbound outcome to the wire reply, so transports deliver errors
/// verbatim.
pub fn reply_for(request_id: String, result: Result<InboundResult, ProtocolError>) -> ProtocolReply {
	match result {
		Ok(inbound) => ProtocolReply::Response(ProtocolResponse {
			request_id,
			update: inbound.update,
			previous_update: None,
		}),
		Err(error) => {
			let message = error.to_string();
			let (code, latest_update) = match error {
				ProtocolError::StaleUpdate(latest) => (ReplyErrorCode::StaleUpdate, Some(*latest)),
				ProtocolError::RestoreNeeded => (ReplyErrorCode::RestoreNeeded, None),
				ProtocolError::SyncSingleSigned => (ReplyErrorCode::SyncSingleSigned, None),
				ProtocolError::CannotSyncSetup => (ReplyErrorCode::CannotSyncSetup, None),
				ProtocolError::BadSignatures(_) => (ReplyErrorCode::BadSignatures, None),
				ProtocolError::ExternalValidationFailed(_) =>
					(ReplyErrorCode::ExternalValidationFailed, None),
				ProtocolError::InvalidUpdate(_) | ProtocolError::InvalidParams(_) =>
					(ReplyErrorCode::InvalidUpdate, None),
				ProtocolError::CounterpartyFailure(_) |
				ProtocolError::Signing(_) |
				ProtocolError::Store(_) |
				ProtocolError::Chain(_) => (ReplyErrorCode::InternalError, None),
			};
			ProtocolReply::Error(ProtocolErrorReply { request_id, code, message, latest_update })
		},
	}
}

/// Serve an in-process inbox with this engine until the counterparty
/// endpoint is dropped.
pub async fn serve_inbox(engine: Arc<ProtocolEngine>, mut inbox: LocalInbox) {
	while let Some(incoming) = inbox.recv().await {
		let request = incoming.request().clone();
		let result = engine.inbound(request.update, request.previous_update).await;
		incoming.respond(reply_for(request.request_id, result));
	}
}

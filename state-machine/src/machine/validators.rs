#![warn(clippy::missing_docs_in_private_items)]

use conduit_primitives::{
	constants::{
		MAXIMUM_TRANSFER_TIMEOUT,
		MINIMUM_TRANSFER_TIMEOUT,
	},
	hashing::hash_canonical_json,
	identifiers,
	signing::recover,
	types::{
		Address,
		Signature,
	},
};

use crate::{
	constants::SETUP_NONCE,
	errors::ChannelError,
	merkle::TransferSet,
	types::{
		ChannelSide,
		ChannelUpdate,
		CoreChannelState,
		CreateUpdateDetails,
		FullChannelState,
		ResolveUpdateDetails,
		UpdateDetails,
		UpdateType,
	},
	views,
};

/// Validates a signature based on provided data and sender's address.
pub fn is_valid_signature(
	data: &[u8],
	signature: &Signature,
	sender_address: Address,
) -> Result<(), ChannelError> {
	let signer_address = recover(data, &signature.0)
		.map_err(|e| ChannelError::InvalidSignature(format!("Error recovering signature {:?}", e)))?;

	if signer_address == sender_address {
		return Ok(())
	}

	Err(ChannelError::InvalidSignature(
		"Signature was valid but the expected address does not match".to_owned(),
	))
}

/// The identifier signature must verify under the initiator.
pub fn validate_update_id(update: &ChannelUpdate) -> Result<(), ChannelError> {
	is_valid_signature(update.id.id.as_bytes(), &update.id.signature, update.from_identifier)
}

/// Verify every present commitment signature over the applied state and
/// require at least the initiator's.
pub fn validate_commitment_signatures(
	update: &ChannelUpdate,
	applied: &CoreChannelState,
) -> Result<(), ChannelError> {
	let digest = applied.commitment_hash();

	if let Some(signature) = &update.alice_signature {
		is_valid_signature(digest.as_bytes(), signature, applied.alice)?;
	}
	if let Some(signature) = &update.bob_signature {
		is_valid_signature(digest.as_bytes(), signature, applied.bob)?;
	}

	let initiator_side = views::side_of(applied, update.from_identifier)
		.ok_or(ChannelError::InvalidParticipant(update.from_identifier))?;
	if update.signature_of(initiator_side).is_none() {
		return Err(ChannelError::MissingSignature(initiator_side))
	}

	Ok(())
}

/// A committed update carries two valid signatures.
pub fn ensure_double_signed(
	update: &ChannelUpdate,
	applied: &CoreChannelState,
) -> Result<(), ChannelError> {
	if update.alice_signature.is_none() {
		return Err(ChannelError::MissingSignature(ChannelSide::Alice))
	}
	if update.bob_signature.is_none() {
		return Err(ChannelError::MissingSignature(ChannelSide::Bob))
	}
	validate_commitment_signatures(update, applied)
}

/// Structural and per-type preconditions, checked before applying.
pub fn validate_update(
	update: &ChannelUpdate,
	channel: Option<&FullChannelState>,
	active_transfers: &TransferSet,
) -> Result<(), ChannelError> {
	match &update.details {
		UpdateDetails::Setup(details) => {
			if channel.is_some() {
				return Err(ChannelError::AlreadySetup)
			}
			if update.nonce != SETUP_NONCE {
				return Err(ChannelError::InvalidNonce { expected: SETUP_NONCE, got: update.nonce })
			}
			if update.from_identifier == update.to_identifier {
				return Err(ChannelError::InvalidParticipant(update.from_identifier))
			}
			// The setup initiator is Bob; the derivation pins the order.
			let derived = identifiers::channel_address(
				update.to_identifier,
				update.from_identifier,
				details.network_context.chain_id,
				details.network_context.channel_factory_address,
			);
			if derived != update.channel_address {
				return Err(ChannelError::WrongChannel {
					expected: derived,
					got: update.channel_address,
				})
			}
			Ok(())
		},
		details => {
			let channel = channel.ok_or(ChannelError::NoChannel)?;
			if update.channel_address != channel.core.channel_address {
				return Err(ChannelError::WrongChannel {
					expected: channel.core.channel_address,
					got: update.channel_address,
				})
			}
			let from_side = views::side_of(&channel.core, update.from_identifier)
				.ok_or(ChannelError::InvalidParticipant(update.from_identifier))?;
			if update.to_identifier != views::participant_of(&channel.core, from_side.other()) {
				return Err(ChannelError::InvalidParticipant(update.to_identifier))
			}
			if update.nonce != views::next_nonce(channel.core.nonce) {
				return Err(ChannelError::InvalidNonce {
					expected: views::next_nonce(channel.core.nonce),
					got: update.nonce,
				})
			}

			match details {
				UpdateDetails::Deposit(_) => Ok(()),
				UpdateDetails::Create(details) =>
					validate_create(update, channel, active_transfers, details),
				UpdateDetails::Resolve(details) =>
					validate_resolve(update, active_transfers, details),
				// Handled by the outer match arm.
				UpdateDetails::Setup(_) => unreachable!("setup handled above"),
			}
		},
	}
}

/// Create preconditions: known asset, sane timeout, participant payout
/// targets, identifier derivation, no duplicate install.
fn validate_create(
	update: &ChannelUpdate,
	channel: &FullChannelState,
	active_transfers: &TransferSet,
	details: &CreateUpdateDetails,
) -> Result<(), ChannelError> {
	views::asset_index(&channel.core, update.asset_id)
		.ok_or(ChannelError::UnknownAsset(update.asset_id))?;

	if details.transfer_timeout < MINIMUM_TRANSFER_TIMEOUT ||
		details.transfer_timeout > MAXIMUM_TRANSFER_TIMEOUT
	{
		return Err(ChannelError::TransferTimeoutOutOfBounds(details.transfer_timeout))
	}

	for target in details.balance.to {
		if views::side_of(&channel.core, target).is_none() {
			return Err(ChannelError::InvalidTransferTarget(target))
		}
	}

	let initial_state_hash = hash_canonical_json(&details.transfer_initial_state)?;
	let derived = identifiers::transfer_id(
		channel.core.channel_address,
		update.nonce,
		details.transfer_definition,
		initial_state_hash,
	);
	if derived != details.transfer_id {
		return Err(ChannelError::TransferIdMismatch)
	}

	if active_transfers.contains(&details.transfer_id) {
		return Err(ChannelError::DuplicateTransfer(details.transfer_id))
	}

	Ok(())
}

/// Resolve preconditions: active transfer, consistent definition and asset,
/// well-formed resolver payload.
fn validate_resolve(
	update: &ChannelUpdate,
	active_transfers: &TransferSet,
	details: &ResolveUpdateDetails,
) -> Result<(), ChannelError> {
	let transfer = active_transfers
		.get(&details.transfer_id)
		.ok_or(ChannelError::UnknownTransfer(details.transfer_id))?;

	if transfer.core.transfer_definition != details.transfer_definition {
		return Err(ChannelError::InvalidResolver)
	}
	if transfer.core.asset_id != update.asset_id {
		return Err(ChannelError::UnknownAsset(update.asset_id))
	}
	if details.transfer_resolver.is_null() {
		return Err(ChannelError::InvalidResolver)
	}

	Ok(())
}

/// The per-asset balance carried by the update must match the applied
/// result.
pub fn validate_applied_balance(
	update: &ChannelUpdate,
	applied: &CoreChannelState,
) -> Result<(), ChannelError> {
	if update.update_type() == UpdateType::Setup {
		return Ok(())
	}
	let index = views::asset_index(applied, update.asset_id)
		.ok_or(ChannelError::UnknownAsset(update.asset_id))?;
	if applied.balances[index] != update.balance {
		return Err(ChannelError::BalanceMismatch)
	}
	Ok(())
}

/// Value conservation: per asset, channel balances plus locked transfer
/// amounts equal the processed deposit totals.
pub fn ensure_conservation(
	core: &CoreChannelState,
	active_transfers: &TransferSet,
) -> Result<(), ChannelError> {
	for (index, asset_id) in core.asset_ids.iter().enumerate() {
		let in_channel = core.balances[index].total().ok_or(ChannelError::AmountOverflow)?;
		let locked =
			views::locked_amount(active_transfers, *asset_id).ok_or(ChannelError::AmountOverflow)?;
		let deposited = core.processed_deposits_a[index]
			.checked_add(core.processed_deposits_b[index])
			.ok_or(ChannelError::AmountOverflow)?;

		if in_channel.checked_add(locked).ok_or(ChannelError::AmountOverflow)? != deposited {
			return Err(ChannelError::ConservationViolated(*asset_id))
		}
	}
	Ok(())
}

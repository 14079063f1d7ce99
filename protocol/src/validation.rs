#![warn(clippy::missing_docs_in_private_items)]

use conduit_primitives::{
	hashing::hash_canonical_json,
	identifiers,
	types::{
		AssetId,
		Balance,
		ChannelAddress,
		Nonce,
		PublicIdentifier,
	},
};
use conduit_state_machine::{
	constants::SETUP_NONCE,
	errors::ChannelError,
	machine::{
		apply_update,
		validators,
		AppliedUpdate,
	},
	merkle::TransferSet,
	types::{
		ChannelSide,
		ChannelUpdate,
		CreateUpdateDetails,
		DepositUpdateDetails,
		FullChannelState,
		FullTransferState,
		ResolveUpdateDetails,
		SetupUpdateDetails,
		UpdateDetails,
		UpdateId,
		UpdateParams,
		UpdateType,
	},
	views,
};
use ulid::Ulid;

use crate::{
	errors::ProtocolError,
	ProtocolEngine,
};

impl ProtocolEngine {
	/// Outbound validator entry point: enrich the parameters with chain
	/// data, build the candidate update, validate, apply and sign it.
	///
	/// Nothing is persisted here; the caller commits only after the
	/// counterparty countersigned.
	pub(crate) async fn validate_and_generate(
		&self,
		params: &UpdateParams,
		channel: Option<&FullChannelState>,
		active_transfers: &TransferSet,
	) -> Result<(ChannelUpdate, AppliedUpdate), ProtocolError> {
		let snapshot: Vec<FullTransferState> = active_transfers.transfers().cloned().collect();
		self.external
			.validate_outbound(params, channel, &snapshot)
			.await
			.map_err(ProtocolError::ExternalValidationFailed)?;

		let (mut update, resolved_balance) =
			self.build_update(params, channel, active_transfers).await?;

		validators::validate_update(&update, channel, active_transfers)?;
		let mut applied = apply_update(&update, channel, active_transfers, resolved_balance)?;
		validators::ensure_conservation(&applied.channel.core, &applied.active_transfers)?;

		// The update carries the post-update balance of its asset.
		update.balance = balance_of(&applied.channel, update.asset_id)?;

		let digest = applied.channel.core.commitment_hash();
		let our_side = views::side_of(&applied.channel.core, self.public_identifier)
			.ok_or_else(|| ProtocolError::InvalidParams("Not a channel participant".to_owned()))?;
		let signature = self
			.signer
			.sign_message_bytes(digest.as_bytes())
			.map_err(|e| ProtocolError::Signing(format!("{:?}", e)))?;
		update.set_signature(our_side, signature);

		// The applier stamped the pre-signature update; replace it.
		applied.channel.latest_update = Some(update.clone());

		Ok((update, applied))
	}

	/// Inbound validator entry point: validate, apply, verify the
	/// signatures over the applied commitment and consult the external
	/// hook. Fails without mutating anything.
	pub(crate) async fn validate_and_apply(
		&self,
		update: &ChannelUpdate,
		channel: Option<&FullChannelState>,
		active_transfers: &TransferSet,
		require_double_signed: bool,
	) -> Result<AppliedUpdate, ProtocolError> {
		validators::validate_update_id(update)
			.map_err(|e| ProtocolError::BadSignatures(e.to_string()))?;
		validators::validate_update(update, channel, active_transfers)?;

		let resolved_balance = match &update.details {
			UpdateDetails::Resolve(details) =>
				Some(self.resolve_payout(channel, active_transfers, details).await?),
			_ => None,
		};

		let applied = apply_update(update, channel, active_transfers, resolved_balance)?;
		validators::validate_applied_balance(update, &applied.channel.core)?;
		validators::ensure_conservation(&applied.channel.core, &applied.active_transfers)?;

		if require_double_signed {
			validators::ensure_double_signed(update, &applied.channel.core)
				.map_err(|e| ProtocolError::BadSignatures(e.to_string()))?;
		} else {
			validators::validate_commitment_signatures(update, &applied.channel.core)
				.map_err(|e| ProtocolError::BadSignatures(e.to_string()))?;
		}

		let snapshot: Vec<FullTransferState> = active_transfers.transfers().cloned().collect();
		self.external
			.validate_inbound(update, channel, &snapshot)
			.await
			.map_err(ProtocolError::ExternalValidationFailed)?;

		Ok(applied)
	}

	/// Evaluate the transfer definition for an inbound resolve. The payout
	/// is computed locally; a dishonest initiator balance surfaces as a
	/// balance mismatch.
	async fn resolve_payout(
		&self,
		channel: Option<&FullChannelState>,
		active_transfers: &TransferSet,
		details: &ResolveUpdateDetails,
	) -> Result<Balance, ProtocolError> {
		let channel = channel.ok_or(ProtocolError::InvalidUpdate(ChannelError::NoChannel))?;
		let transfer = active_transfers
			.get(&details.transfer_id)
			.ok_or(ProtocolError::InvalidUpdate(ChannelError::UnknownTransfer(
				details.transfer_id,
			)))?;

		let payout = self
			.chain
			.resolve(transfer, &details.transfer_resolver, channel.network_context.chain_id)
			.await?;
		Ok(payout)
	}

	/// Build the unsigned candidate update for the given parameters,
	/// querying the chain reader where the update type requires it.
	async fn build_update(
		&self,
		params: &UpdateParams,
		channel: Option<&FullChannelState>,
		active_transfers: &TransferSet,
	) -> Result<(ChannelUpdate, Option<Balance>), ProtocolError> {
		match params {
			UpdateParams::Setup(setup) => {
				// The setup initiator becomes Bob.
				let channel_address = identifiers::channel_address(
					setup.counterparty_identifier,
					self.public_identifier,
					setup.network_context.chain_id,
					setup.network_context.channel_factory_address,
				);
				let update = self.unsigned_update(
					channel_address,
					setup.counterparty_identifier,
					SETUP_NONCE,
					Default::default(),
					UpdateDetails::Setup(SetupUpdateDetails {
						timeout: setup.timeout,
						network_context: setup.network_context.clone(),
					}),
				)?;
				Ok((update, None))
			},
			UpdateParams::Deposit(deposit) => {
				let channel = required(channel, params.update_type())?;
				let chain_id = channel.network_context.chain_id;
				let alice_record = self
					.chain
					.get_latest_deposit(
						deposit.channel_address,
						deposit.asset_id,
						chain_id,
						ChannelSide::Alice,
					)
					.await?;
				let bob_record = self
					.chain
					.get_latest_deposit(
						deposit.channel_address,
						deposit.asset_id,
						chain_id,
						ChannelSide::Bob,
					)
					.await?;

				let update = self.unsigned_update(
					deposit.channel_address,
					self.counterparty_of(channel)?,
					views::next_nonce(channel.core.nonce),
					deposit.asset_id,
					UpdateDetails::Deposit(DepositUpdateDetails {
						total_deposits_alice: alice_record.amount,
						total_deposits_bob: bob_record.amount,
					}),
				)?;
				Ok((update, None))
			},
			UpdateParams::Create(create) => {
				let channel = required(channel, params.update_type())?;
				let chain_id = channel.network_context.chain_id;

				let code = self.chain.get_code(create.transfer_definition, chain_id).await?;
				if code.0.is_empty() {
					return Err(ProtocolError::InvalidParams(format!(
						"Transfer definition `{}` is not deployed",
						create.transfer_definition
					)))
				}

				let nonce = views::next_nonce(channel.core.nonce);
				let initial_state_hash = hash_canonical_json(&create.transfer_initial_state)
					.map_err(ChannelError::Encoding)?;
				let transfer_id = identifiers::transfer_id(
					create.channel_address,
					nonce,
					create.transfer_definition,
					initial_state_hash,
				);

				let update = self.unsigned_update(
					create.channel_address,
					self.counterparty_of(channel)?,
					nonce,
					create.asset_id,
					UpdateDetails::Create(CreateUpdateDetails {
						transfer_id,
						balance: create.balance.clone(),
						transfer_definition: create.transfer_definition,
						transfer_timeout: create.transfer_timeout,
						transfer_initial_state: create.transfer_initial_state.clone(),
						state_encoding: create.state_encoding.clone(),
						resolver_encoding: create.resolver_encoding.clone(),
					}),
				)?;
				Ok((update, None))
			},
			UpdateParams::Resolve(resolve) => {
				let channel = required(channel, params.update_type())?;
				let chain_id = channel.network_context.chain_id;
				let transfer = active_transfers.get(&resolve.transfer_id).ok_or(
					ProtocolError::InvalidUpdate(ChannelError::UnknownTransfer(
						resolve.transfer_id,
					)),
				)?;

				let payout = self
					.chain
					.resolve(transfer, &resolve.transfer_resolver, chain_id)
					.await?;

				let update = self.unsigned_update(
					resolve.channel_address,
					self.counterparty_of(channel)?,
					views::next_nonce(channel.core.nonce),
					transfer.core.asset_id,
					UpdateDetails::Resolve(ResolveUpdateDetails {
						transfer_id: resolve.transfer_id,
						transfer_definition: transfer.core.transfer_definition,
						transfer_resolver: resolve.transfer_resolver.clone(),
					}),
				)?;
				Ok((update, Some(payout)))
			},
		}
	}

	/// An update skeleton from this participant, with a fresh signed
	/// identifier and no commitment signatures yet.
	fn unsigned_update(
		&self,
		channel_address: ChannelAddress,
		to_identifier: PublicIdentifier,
		nonce: Nonce,
		asset_id: AssetId,
		details: UpdateDetails,
	) -> Result<ChannelUpdate, ProtocolError> {
		Ok(ChannelUpdate {
			id: self.new_update_id()?,
			channel_address,
			from_identifier: self.public_identifier,
			to_identifier,
			nonce,
			asset_id,
			balance: Balance::default(),
			details,
			alice_signature: None,
			bob_signature: None,
		})
	}

	/// A fresh idempotency key, signed so the counterparty cannot forge an
	/// alternative update under it.
	fn new_update_id(&self) -> Result<UpdateId, ProtocolError> {
		let id = Ulid::new().to_string();
		let signature = self
			.signer
			.sign_message_bytes(id.as_bytes())
			.map_err(|e| ProtocolError::Signing(format!("{:?}", e)))?;
		Ok(UpdateId { id, signature })
	}

	/// The other participant of a channel this engine participates in.
	fn counterparty_of(
		&self,
		channel: &FullChannelState,
	) -> Result<PublicIdentifier, ProtocolError> {
		let side = views::side_of(&channel.core, self.public_identifier)
			.ok_or_else(|| ProtocolError::InvalidParams("Not a channel participant".to_owned()))?;
		Ok(views::participant_of(&channel.core, side.other()))
	}
}

/// All update types except setup address an existing channel.
fn required(
	channel: Option<&FullChannelState>,
	update_type: UpdateType,
) -> Result<&FullChannelState, ProtocolError> {
	channel.ok_or_else(|| {
		ProtocolError::InvalidParams(format!("A `{}` update requires an existing channel", update_type))
	})
}

/// The committed balance of an asset after the update applied.
fn balance_of(channel: &FullChannelState, asset_id: AssetId) -> Result<Balance, ProtocolError> {
	match views::asset_index(&channel.core, asset_id) {
		Some(index) => Ok(channel.core.balances[index].clone()),
		// Setup tracks no assets yet.
		None => Ok(Balance {
			to: [channel.core.alice, channel.core.bob],
			amount: Default::default(),
		}),
	}
}

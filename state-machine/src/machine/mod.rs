#![warn(clippy::missing_docs_in_private_items)]

/// Pure validation checks shared by both replicas.
pub mod validators;

use conduit_primitives::{
	constants::EMPTY_MERKLE_ROOT,
	hashing::hash_canonical_json,
	types::{
		Balance,
		TokenAmount,
	},
};

use crate::{
	constants::{
		INITIAL_DEFUND_NONCE,
		SETUP_NONCE,
	},
	errors::ChannelError,
	merkle::TransferSet,
	types::{
		ChannelSide,
		ChannelUpdate,
		CoreChannelState,
		CoreTransferState,
		CreateUpdateDetails,
		DepositUpdateDetails,
		FullChannelState,
		FullTransferState,
		ResolveUpdateDetails,
		SetupUpdateDetails,
		UpdateDetails,
	},
	views,
};

/// Result of applying a validated update: the next channel state, the next
/// active transfer set and, for create/resolve, the changed transfer.
#[derive(Clone, Debug)]
pub struct AppliedUpdate {
	pub channel: FullChannelState,
	pub active_transfers: TransferSet,
	pub transfer: Option<FullTransferState>,
}

/// Apply an update to the previous channel state and active transfer set.
///
/// Pure: inputs are borrowed immutably and a failure leaves no trace. For
/// resolve updates the payout computed by the transfer definition is passed
/// in as `resolved_balance`.
pub fn apply_update(
	update: &ChannelUpdate,
	channel: Option<&FullChannelState>,
	active_transfers: &TransferSet,
	resolved_balance: Option<Balance>,
) -> Result<AppliedUpdate, ChannelError> {
	match &update.details {
		UpdateDetails::Setup(details) => apply_setup(update, channel, details),
		UpdateDetails::Deposit(details) =>
			apply_deposit(update, existing(channel)?, active_transfers, details),
		UpdateDetails::Create(details) =>
			apply_create(update, existing(channel)?, active_transfers, details),
		UpdateDetails::Resolve(details) =>
			apply_resolve(update, existing(channel)?, active_transfers, details, resolved_balance),
	}
}

/// All update types except setup require an existing replica.
fn existing(channel: Option<&FullChannelState>) -> Result<&FullChannelState, ChannelError> {
	channel.ok_or(ChannelError::NoChannel)
}

/// Create the channel. The setup initiator is Bob, the counterparty Alice.
fn apply_setup(
	update: &ChannelUpdate,
	channel: Option<&FullChannelState>,
	details: &SetupUpdateDetails,
) -> Result<AppliedUpdate, ChannelError> {
	if channel.is_some() {
		return Err(ChannelError::AlreadySetup)
	}
	if update.nonce != SETUP_NONCE {
		return Err(ChannelError::InvalidNonce { expected: SETUP_NONCE, got: update.nonce })
	}

	let core = CoreChannelState {
		channel_address: update.channel_address,
		alice: update.to_identifier,
		bob: update.from_identifier,
		asset_ids: vec![],
		balances: vec![],
		processed_deposits_a: vec![],
		processed_deposits_b: vec![],
		defund_nonces: vec![],
		timeout: details.timeout,
		nonce: update.nonce,
		merkle_root: *EMPTY_MERKLE_ROOT,
	};

	Ok(AppliedUpdate {
		channel: FullChannelState {
			core,
			alice_identifier: update.to_identifier,
			bob_identifier: update.from_identifier,
			network_context: details.network_context.clone(),
			latest_update: Some(update.clone()),
			in_dispute: false,
		},
		active_transfers: TransferSet::new(),
		transfer: None,
	})
}

/// Reconcile onchain deposit totals and credit the per-side difference.
fn apply_deposit(
	update: &ChannelUpdate,
	channel: &FullChannelState,
	active_transfers: &TransferSet,
	details: &DepositUpdateDetails,
) -> Result<AppliedUpdate, ChannelError> {
	let mut core = channel.core.clone();

	let index = match views::asset_index(&core, update.asset_id) {
		Some(index) => index,
		None => {
			core.asset_ids.push(update.asset_id);
			core.balances.push(Balance {
				to: [core.alice, core.bob],
				amount: [TokenAmount::zero(), TokenAmount::zero()],
			});
			core.processed_deposits_a.push(TokenAmount::zero());
			core.processed_deposits_b.push(TokenAmount::zero());
			core.defund_nonces.push(INITIAL_DEFUND_NONCE);
			core.asset_ids.len() - 1
		},
	};

	let credit_a = details
		.total_deposits_alice
		.checked_sub(core.processed_deposits_a[index])
		.ok_or(ChannelError::DepositRegression)?;
	let credit_b = details
		.total_deposits_bob
		.checked_sub(core.processed_deposits_b[index])
		.ok_or(ChannelError::DepositRegression)?;

	let balance = &mut core.balances[index];
	balance.amount[0] =
		balance.amount[0].checked_add(credit_a).ok_or(ChannelError::AmountOverflow)?;
	balance.amount[1] =
		balance.amount[1].checked_add(credit_b).ok_or(ChannelError::AmountOverflow)?;
	core.processed_deposits_a[index] = details.total_deposits_alice;
	core.processed_deposits_b[index] = details.total_deposits_bob;
	core.nonce = views::next_nonce(core.nonce);

	let mut next = channel.clone();
	next.core = core;
	next.latest_update = Some(update.clone());

	Ok(AppliedUpdate { channel: next, active_transfers: active_transfers.clone(), transfer: None })
}

/// Debit the creator's side and install the transfer into the merkle set.
fn apply_create(
	update: &ChannelUpdate,
	channel: &FullChannelState,
	active_transfers: &TransferSet,
	details: &CreateUpdateDetails,
) -> Result<AppliedUpdate, ChannelError> {
	let mut core = channel.core.clone();

	let index =
		views::asset_index(&core, update.asset_id).ok_or(ChannelError::UnknownAsset(update.asset_id))?;
	let initiator_side = views::side_of(&core, update.from_identifier)
		.ok_or(ChannelError::InvalidParticipant(update.from_identifier))?;

	core.balances[index] =
		debit_transfer_balance(&core.balances[index], &details.balance, initiator_side)
			.map_err(|_| ChannelError::InsufficientFunds(update.asset_id))?;

	let initial_state_hash = hash_canonical_json(&details.transfer_initial_state)?;
	let transfer = FullTransferState {
		core: CoreTransferState {
			channel_address: core.channel_address,
			transfer_id: details.transfer_id,
			transfer_definition: details.transfer_definition,
			initiator: update.from_identifier,
			responder: update.to_identifier,
			asset_id: update.asset_id,
			balance: details.balance.clone(),
			transfer_timeout: details.transfer_timeout,
			initial_state_hash,
		},
		chain_id: channel.network_context.chain_id,
		channel_factory_address: channel.network_context.channel_factory_address,
		channel_nonce: update.nonce,
		transfer_state: details.transfer_initial_state.clone(),
		transfer_resolver: None,
		state_encoding: details.state_encoding.clone(),
		resolver_encoding: details.resolver_encoding.clone(),
		in_dispute: false,
	};

	let mut next_active = active_transfers.clone();
	core.merkle_root = next_active.insert(transfer.clone())?;
	core.nonce = views::next_nonce(core.nonce);

	let mut next = channel.clone();
	next.core = core;
	next.latest_update = Some(update.clone());

	Ok(AppliedUpdate { channel: next, active_transfers: next_active, transfer: Some(transfer) })
}

/// Remove the transfer and credit the resolved payout back to the channel.
fn apply_resolve(
	update: &ChannelUpdate,
	channel: &FullChannelState,
	active_transfers: &TransferSet,
	details: &ResolveUpdateDetails,
	resolved_balance: Option<Balance>,
) -> Result<AppliedUpdate, ChannelError> {
	let payout = resolved_balance.ok_or(ChannelError::MissingResolution)?;

	let mut next_active = active_transfers.clone();
	let (mut transfer, merkle_root) = next_active.remove(&details.transfer_id)?;

	let mut core = channel.core.clone();
	let index = views::asset_index(&core, transfer.core.asset_id)
		.ok_or(ChannelError::UnknownAsset(transfer.core.asset_id))?;
	let initiator_side = views::side_of(&core, transfer.core.initiator)
		.ok_or(ChannelError::InvalidParticipant(transfer.core.initiator))?;

	if payout.total() != transfer.core.balance.total() {
		return Err(ChannelError::PayoutMismatch)
	}

	core.balances[index] = credit_transfer_balance(&core.balances[index], &payout, initiator_side)?;
	core.merkle_root = merkle_root;
	core.nonce = views::next_nonce(core.nonce);

	transfer.transfer_resolver = Some(details.transfer_resolver.clone());

	let mut next = channel.clone();
	next.core = core;
	next.latest_update = Some(update.clone());

	Ok(AppliedUpdate { channel: next, active_transfers: next_active, transfer: Some(transfer) })
}

/// The channel slot a transfer balance index maps onto. Transfer balances
/// are `[initiator, responder]`-ordered.
fn channel_slot(initiator_side: ChannelSide, transfer_index: usize) -> usize {
	match initiator_side {
		ChannelSide::Alice => transfer_index,
		ChannelSide::Bob => 1 - transfer_index,
	}
}

/// Subtract a transfer balance from the channel balance.
fn debit_transfer_balance(
	channel_balance: &Balance,
	transfer_balance: &Balance,
	initiator_side: ChannelSide,
) -> Result<Balance, ChannelError> {
	let mut next = channel_balance.clone();
	for (transfer_index, amount) in transfer_balance.amount.iter().enumerate() {
		let slot = channel_slot(initiator_side, transfer_index);
		next.amount[slot] =
			next.amount[slot].checked_sub(*amount).ok_or(ChannelError::AmountOverflow)?;
	}
	Ok(next)
}

/// Add a transfer payout back onto the channel balance.
fn credit_transfer_balance(
	channel_balance: &Balance,
	transfer_balance: &Balance,
	initiator_side: ChannelSide,
) -> Result<Balance, ChannelError> {
	let mut next = channel_balance.clone();
	for (transfer_index, amount) in transfer_balance.amount.iter().enumerate() {
		let slot = channel_slot(initiator_side, transfer_index);
		next.amount[slot] =
			next.amount[slot].checked_add(*amount).ok_or(ChannelError::AmountOverflow)?;
	}
	Ok(next)
}

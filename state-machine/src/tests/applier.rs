use conduit_primitives::types::{
	Balance,
	TokenAmount,
	H256,
};

use crate::{
	errors::ChannelError,
	machine::{
		apply_update,
		validators::ensure_conservation,
	},
	merkle::TransferSet,
	tests::factories::{
		channel_with_transfer,
		create_update,
		deposit_update,
		funded_channel,
		resolve_update,
		setup_channel,
		setup_update,
		token,
		Keyring,
	},
	types::UpdateDetails,
};

#[test]
fn test_setup_creates_channel() {
	let applied = setup_channel();
	let channel = &applied.channel;

	assert_eq!(channel.core.nonce, 1);
	assert_eq!(channel.core.alice, Keyring::Alice.address());
	assert_eq!(channel.core.bob, Keyring::Bob.address());
	assert!(channel.core.asset_ids.is_empty());
	assert_eq!(channel.core.merkle_root, H256::zero());
	assert!(applied.active_transfers.is_empty());
	assert!(channel.latest_update.is_some());
}

#[test]
fn test_setup_rejects_existing_channel() {
	let applied = setup_channel();
	let result = apply_update(&setup_update(), Some(&applied.channel), &TransferSet::new(), None);

	assert!(matches!(result, Err(ChannelError::AlreadySetup)));
}

#[test]
fn test_setup_rejects_wrong_nonce() {
	let mut update = setup_update();
	update.nonce = 2;

	let result = apply_update(&update, None, &TransferSet::new(), None);
	assert!(matches!(result, Err(ChannelError::InvalidNonce { .. })));
}

#[test]
fn test_first_deposit_credits_alice() {
	let applied = funded_channel(100);
	let core = &applied.channel.core;

	assert_eq!(core.nonce, 2);
	assert_eq!(core.asset_ids, vec![token()]);
	assert_eq!(core.balances[0].amount, [TokenAmount::from(100u64), TokenAmount::zero()]);
	assert_eq!(core.processed_deposits_a, vec![TokenAmount::from(100u64)]);
	assert_eq!(core.processed_deposits_b, vec![TokenAmount::zero()]);
	ensure_conservation(core, &applied.active_transfers).expect("Conservation should hold");
}

#[test]
fn test_second_deposit_credits_delta() {
	let funded = funded_channel(100);
	let update = deposit_update(&funded.channel, token(), 100, 50);

	let applied = apply_update(&update, Some(&funded.channel), &funded.active_transfers, None)
		.expect("Deposit should apply");
	let core = &applied.channel.core;

	assert_eq!(core.nonce, 3);
	assert_eq!(core.balances[0].amount, [TokenAmount::from(100u64), TokenAmount::from(50u64)]);
	assert_eq!(core.processed_deposits_b, vec![TokenAmount::from(50u64)]);
	ensure_conservation(core, &applied.active_transfers).expect("Conservation should hold");
}

#[test]
fn test_deposit_regression_rejected() {
	let funded = funded_channel(100);
	let mut update = deposit_update(&funded.channel, token(), 100, 0);
	match &mut update.details {
		UpdateDetails::Deposit(details) => {
			details.total_deposits_alice = TokenAmount::from(50u64);
		},
		_ => unreachable!(),
	}

	let result = apply_update(&update, Some(&funded.channel), &funded.active_transfers, None);
	assert!(matches!(result, Err(ChannelError::DepositRegression)));
}

#[test]
fn test_create_installs_transfer() {
	let applied = channel_with_transfer(100, 30, b"secret");
	let core = &applied.channel.core;

	assert_eq!(core.nonce, 3);
	assert_eq!(core.balances[0].amount, [TokenAmount::from(70u64), TokenAmount::zero()]);
	assert_ne!(core.merkle_root, H256::zero());
	assert_eq!(applied.active_transfers.len(), 1);

	let transfer = applied.transfer.as_ref().expect("Create should emit the transfer");
	assert_eq!(transfer.core.initiator, Keyring::Alice.address());
	assert_eq!(transfer.core.responder, Keyring::Bob.address());
	assert_eq!(core.merkle_root, applied.active_transfers.root());
	ensure_conservation(core, &applied.active_transfers).expect("Conservation should hold");
}

#[test]
fn test_create_insufficient_funds_rejected() {
	let funded = funded_channel(10);
	let update = create_update(&funded.channel, 10, b"secret");
	// Underfund the channel after the update was built against it.
	let update = {
		let mut update = update;
		match &mut update.details {
			UpdateDetails::Create(details) => {
				details.balance.amount[0] = TokenAmount::from(11u64);
			},
			_ => unreachable!(),
		}
		update
	};

	let result = apply_update(&update, Some(&funded.channel), &funded.active_transfers, None);
	assert!(matches!(result, Err(ChannelError::InsufficientFunds(_))));
}

#[test]
fn test_duplicate_create_rejected() {
	let funded = funded_channel(100);
	let update = create_update(&funded.channel, 30, b"secret");

	let first = apply_update(&update, Some(&funded.channel), &funded.active_transfers, None)
		.expect("Create should apply");
	let result = apply_update(&update, Some(&first.channel), &first.active_transfers, None);

	assert!(matches!(result, Err(ChannelError::DuplicateTransfer(_))));
}

#[test]
fn test_resolve_clears_merkle_entry() {
	let created = channel_with_transfer(100, 30, b"secret");
	let transfer_id =
		created.transfer.as_ref().expect("Create should emit the transfer").core.transfer_id;

	let payout = Balance {
		to: [Keyring::Alice.address(), Keyring::Bob.address()],
		amount: [TokenAmount::zero(), TokenAmount::from(30u64)],
	};
	let expected_balance = Balance {
		to: [Keyring::Alice.address(), Keyring::Bob.address()],
		amount: [TokenAmount::from(70u64), TokenAmount::from(30u64)],
	};
	let update = resolve_update(&created.channel, transfer_id, b"secret", expected_balance.clone());

	let applied =
		apply_update(&update, Some(&created.channel), &created.active_transfers, Some(payout))
			.expect("Resolve should apply");
	let core = &applied.channel.core;

	assert_eq!(core.nonce, 4);
	assert_eq!(core.merkle_root, H256::zero());
	assert!(applied.active_transfers.is_empty());
	assert_eq!(core.balances[0], expected_balance);

	let transfer = applied.transfer.as_ref().expect("Resolve should emit the transfer");
	assert!(transfer.transfer_resolver.is_some());
	ensure_conservation(core, &applied.active_transfers).expect("Conservation should hold");
}

#[test]
fn test_resolve_payout_must_preserve_locked_amount() {
	let created = channel_with_transfer(100, 30, b"secret");
	let transfer_id =
		created.transfer.as_ref().expect("Create should emit the transfer").core.transfer_id;

	let short_payout = Balance {
		to: [Keyring::Alice.address(), Keyring::Bob.address()],
		amount: [TokenAmount::zero(), TokenAmount::from(20u64)],
	};
	let update = resolve_update(&created.channel, transfer_id, b"secret", Balance::default());

	let result =
		apply_update(&update, Some(&created.channel), &created.active_transfers, Some(short_payout));
	assert!(matches!(result, Err(ChannelError::PayoutMismatch)));
}

#[test]
fn test_resolve_unknown_transfer_rejected() {
	let funded = funded_channel(100);
	let update =
		resolve_update(&funded.channel, H256::repeat_byte(0x99), b"secret", Balance::default());

	let result = apply_update(
		&update,
		Some(&funded.channel),
		&funded.active_transfers,
		Some(Balance::default()),
	);
	assert!(matches!(result, Err(ChannelError::UnknownTransfer(_))));
}

#[test]
fn test_resolve_requires_payout() {
	let created = channel_with_transfer(100, 30, b"secret");
	let transfer_id =
		created.transfer.as_ref().expect("Create should emit the transfer").core.transfer_id;
	let update = resolve_update(&created.channel, transfer_id, b"secret", Balance::default());

	let result = apply_update(&update, Some(&created.channel), &created.active_transfers, None);
	assert!(matches!(result, Err(ChannelError::MissingResolution)));
}

#[test]
fn test_apply_is_idempotent_on_inputs() {
	let funded = funded_channel(100);
	let update = create_update(&funded.channel, 30, b"secret");

	let first = apply_update(&update, Some(&funded.channel), &funded.active_transfers, None)
		.expect("Create should apply");
	let second = apply_update(&update, Some(&funded.channel), &funded.active_transfers, None)
		.expect("Create should apply");

	assert_eq!(first.channel, second.channel);
	assert_eq!(first.channel.core.pack(), second.channel.core.pack());
}

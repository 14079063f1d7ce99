use conduit_primitives::{
	constants::{
		DEFAULT_CHANNEL_TIMEOUT,
		DEFAULT_TRANSFER_TIMEOUT,
	},
	hashing::{
		hash_canonical_json,
		hash_secret,
	},
	identifiers,
	signing::hash_data,
	types::{
		Address,
		AssetId,
		Balance,
		ChainID,
		NetworkContext,
		Signature,
		TokenAmount,
		TransferId,
	},
};
use ethsign::{
	PublicKey,
	SecretKey,
};
use serde_json::json;
use web3::types::Bytes;

use crate::{
	machine::{
		apply_update,
		AppliedUpdate,
	},
	merkle::TransferSet,
	types::{
		ChannelUpdate,
		CoreChannelState,
		CreateUpdateDetails,
		DepositUpdateDetails,
		FullChannelState,
		ResolveUpdateDetails,
		SetupUpdateDetails,
		UpdateDetails,
		UpdateId,
	},
	views,
};

pub const ALICE: &str = "ALICE";
pub const BOB: &str = "BOB";
pub const CHARLIE: &str = "CHARLIE";

pub enum Keyring {
	Alice,
	Bob,
	Charlie,
}

impl Keyring {
	pub fn private_key(&self) -> SecretKey {
		let mut secret: [u8; 32] = [0; 32];
		let s = match self {
			Self::Alice => ALICE.as_bytes(),
			Self::Bob => BOB.as_bytes(),
			Self::Charlie => CHARLIE.as_bytes(),
		};
		secret[..s.len()].copy_from_slice(s);
		SecretKey::from_raw(&secret).expect("Private key generation should not fail")
	}

	pub fn public_key(&self) -> PublicKey {
		self.private_key().public()
	}

	pub fn address(&self) -> Address {
		Address::from_slice(self.public_key().address())
	}
}

/// The asset used throughout the tests.
pub fn token() -> AssetId {
	Address::zero()
}

/// The registered hashlock transfer definition.
pub fn hashlock_definition() -> Address {
	Address::repeat_byte(0xdd)
}

pub const HASHLOCK_STATE_ENCODING: &str = "tuple(bytes32 lockHash, uint256 expiry)";
pub const HASHLOCK_RESOLVER_ENCODING: &str = "tuple(bytes32 preImage)";

pub fn sign_digest(data: &[u8], key: &SecretKey) -> Signature {
	let digest = hash_data(data);
	let signature = key.sign(&digest).expect("Signing should succeed");

	let mut bytes = signature.r.to_vec();
	bytes.extend_from_slice(&signature.s);
	bytes.push(signature.v + 27);
	Bytes(bytes)
}

pub fn update_id(id: &str, signer: &Keyring) -> UpdateId {
	UpdateId {
		id: id.to_owned(),
		signature: sign_digest(id.as_bytes(), &signer.private_key()),
	}
}

pub fn network_context() -> NetworkContext {
	NetworkContext {
		chain_id: ChainID::Goerli,
		channel_factory_address: Address::repeat_byte(0xfa),
		transfer_registry_address: Address::repeat_byte(0xfb),
	}
}

pub fn channel_address() -> Address {
	let context = network_context();
	identifiers::channel_address(
		Keyring::Alice.address(),
		Keyring::Bob.address(),
		context.chain_id,
		context.channel_factory_address,
	)
}

/// A setup update proposed by Bob, making the counterparty Alice.
pub fn setup_update() -> ChannelUpdate {
	ChannelUpdate {
		id: update_id("setup-1", &Keyring::Bob),
		channel_address: channel_address(),
		from_identifier: Keyring::Bob.address(),
		to_identifier: Keyring::Alice.address(),
		nonce: 1,
		asset_id: token(),
		balance: Balance::default(),
		details: UpdateDetails::Setup(SetupUpdateDetails {
			timeout: DEFAULT_CHANNEL_TIMEOUT,
			network_context: network_context(),
		}),
		alice_signature: None,
		bob_signature: None,
	}
}

pub fn setup_channel() -> AppliedUpdate {
	let update = setup_update();
	apply_update(&update, None, &TransferSet::new(), None).expect("Setup should apply")
}

/// A deposit update reconciling the given cumulative totals, initiated by
/// Alice.
pub fn deposit_update(
	channel: &FullChannelState,
	asset_id: AssetId,
	total_a: u64,
	total_b: u64,
) -> ChannelUpdate {
	let total_a = TokenAmount::from(total_a);
	let total_b = TokenAmount::from(total_b);

	let (prev_balance, prev_a, prev_b) = match views::asset_index(&channel.core, asset_id) {
		Some(index) => (
			channel.core.balances[index].clone(),
			channel.core.processed_deposits_a[index],
			channel.core.processed_deposits_b[index],
		),
		None => (
			Balance {
				to: [channel.core.alice, channel.core.bob],
				amount: [TokenAmount::zero(), TokenAmount::zero()],
			},
			TokenAmount::zero(),
			TokenAmount::zero(),
		),
	};
	let balance = Balance {
		to: prev_balance.to,
		amount: [
			prev_balance.amount[0] + (total_a - prev_a),
			prev_balance.amount[1] + (total_b - prev_b),
		],
	};
	let nonce = views::next_nonce(channel.core.nonce);

	ChannelUpdate {
		id: update_id(&format!("deposit-{}", nonce), &Keyring::Alice),
		channel_address: channel.core.channel_address,
		from_identifier: channel.alice_identifier,
		to_identifier: channel.bob_identifier,
		nonce,
		asset_id,
		balance,
		details: UpdateDetails::Deposit(DepositUpdateDetails {
			total_deposits_alice: total_a,
			total_deposits_bob: total_b,
		}),
		alice_signature: None,
		bob_signature: None,
	}
}

/// A channel at nonce 2 holding `amount_alice` of the test token on
/// Alice's side.
pub fn funded_channel(amount_alice: u64) -> AppliedUpdate {
	let setup = setup_channel();
	let update = deposit_update(&setup.channel, token(), amount_alice, 0);
	apply_update(&update, Some(&setup.channel), &setup.active_transfers, None)
		.expect("Deposit should apply")
}

/// The dynamic state of a hashlock transfer locking `preimage`.
pub fn hashlock_state(preimage: &[u8]) -> serde_json::Value {
	json!({
		"lockHash": format!("0x{}", hex::encode(hash_secret(preimage))),
		"expiry": "0",
	})
}

/// The resolver revealing `preimage`.
pub fn hashlock_resolver(preimage: &[u8]) -> serde_json::Value {
	json!({
		"preImage": format!("0x{}", hex::encode(preimage)),
	})
}

/// A create update installing a hashlock transfer of `amount` from Alice
/// towards Bob.
pub fn create_update(channel: &FullChannelState, amount: u64, preimage: &[u8]) -> ChannelUpdate {
	let amount = TokenAmount::from(amount);
	let nonce = views::next_nonce(channel.core.nonce);
	let initial_state = hashlock_state(preimage);
	let initial_state_hash =
		hash_canonical_json(&initial_state).expect("Initial state should hash");
	let transfer_id = identifiers::transfer_id(
		channel.core.channel_address,
		nonce,
		hashlock_definition(),
		initial_state_hash,
	);

	let index = views::asset_index(&channel.core, token()).expect("Asset should be known");
	let prev_balance = &channel.core.balances[index];
	let balance = Balance {
		to: prev_balance.to,
		amount: [prev_balance.amount[0] - amount, prev_balance.amount[1]],
	};

	ChannelUpdate {
		id: update_id(&format!("create-{}", nonce), &Keyring::Alice),
		channel_address: channel.core.channel_address,
		from_identifier: channel.alice_identifier,
		to_identifier: channel.bob_identifier,
		nonce,
		asset_id: token(),
		balance,
		details: UpdateDetails::Create(CreateUpdateDetails {
			transfer_id,
			balance: Balance {
				to: [channel.core.alice, channel.core.bob],
				amount: [amount, TokenAmount::zero()],
			},
			transfer_definition: hashlock_definition(),
			transfer_timeout: DEFAULT_TRANSFER_TIMEOUT,
			transfer_initial_state: initial_state,
			state_encoding: HASHLOCK_STATE_ENCODING.to_owned(),
			resolver_encoding: HASHLOCK_RESOLVER_ENCODING.to_owned(),
		}),
		alice_signature: None,
		bob_signature: None,
	}
}

/// A channel at nonce 3 with one active hashlock transfer of `amount`.
pub fn channel_with_transfer(funded: u64, amount: u64, preimage: &[u8]) -> AppliedUpdate {
	let funded = funded_channel(funded);
	let update = create_update(&funded.channel, amount, preimage);
	apply_update(&update, Some(&funded.channel), &funded.active_transfers, None)
		.expect("Create should apply")
}

/// A resolve update closing `transfer_id` with the revealed preimage,
/// initiated by Bob. `balance` is the expected post-resolution channel
/// balance for the asset.
pub fn resolve_update(
	channel: &FullChannelState,
	transfer_id: TransferId,
	preimage: &[u8],
	balance: Balance,
) -> ChannelUpdate {
	let nonce = views::next_nonce(channel.core.nonce);

	ChannelUpdate {
		id: update_id(&format!("resolve-{}", nonce), &Keyring::Bob),
		channel_address: channel.core.channel_address,
		from_identifier: channel.bob_identifier,
		to_identifier: channel.alice_identifier,
		nonce,
		asset_id: token(),
		balance,
		details: UpdateDetails::Resolve(ResolveUpdateDetails {
			transfer_id,
			transfer_definition: hashlock_definition(),
			transfer_resolver: hashlock_resolver(preimage),
		}),
		alice_signature: None,
		bob_signature: None,
	}
}

/// Attach commitment signatures over the applied state for the given
/// signers.
pub fn finalize_update(
	update: &mut ChannelUpdate,
	applied: &CoreChannelState,
	signers: &[Keyring],
) {
	let digest = applied.commitment_hash();
	for signer in signers {
		let side = views::side_of(applied, signer.address()).expect("Signer should participate");
		update.set_signature(side, sign_digest(digest.as_bytes(), &signer.private_key()));
	}
}

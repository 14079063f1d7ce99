use std::{
	collections::{
		BTreeMap,
		HashMap,
	},
	sync::Arc,
};

use async_trait::async_trait;
use conduit_blockchain::{
	errors::ChainError,
	keys::PrivateKey,
	reader::{
		ChainReader,
		DepositRecord,
	},
};
use conduit_primitives::{
	constants::{
		DEFAULT_CHANNEL_TIMEOUT,
		DEFAULT_TRANSFER_TIMEOUT,
	},
	hashing::hash_secret,
	types::{
		Address,
		AssetId,
		Balance,
		Bytes,
		ChainID,
		ChannelAddress,
		NetworkContext,
		Nonce,
		TokenAmount,
		TransferId,
	},
};
use conduit_state_machine::types::{
	ChannelSide,
	ChannelUpdate,
	CreateParams,
	DepositParams,
	FullChannelState,
	FullTransferState,
	SetupParams,
	UpdateParams,
};
use conduit_storage::{
	errors::StorageError,
	Store,
	TransferChange,
};
use conduit_transport::{
	errors::TransportError,
	messages::ProtocolReply,
	Messaging,
};
use ethsign::SecretKey;
use parking_lot::Mutex;
use serde_json::json;

use crate::{
	sync::reply_for,
	ProtocolEngine,
};

pub const ALICE: &str = "ALICE";
pub const BOB: &str = "BOB";

pub enum Keyring {
	Alice,
	Bob,
}

impl Keyring {
	pub fn private_key(&self) -> SecretKey {
		let mut secret: [u8; 32] = [0; 32];
		let s = match self {
			Self::Alice => ALICE.as_bytes(),
			Self::Bob => BOB.as_bytes(),
		};
		secret[..s.len()].copy_from_slice(s);
		SecretKey::from_raw(&secret).expect("Private key generation should not fail")
	}

	pub fn address(&self) -> Address {
		Address::from_slice(self.private_key().public().address())
	}
}

pub fn token() -> AssetId {
	Address::zero()
}

pub fn hashlock_definition() -> Address {
	Address::repeat_byte(0xdd)
}

pub fn network_context() -> NetworkContext {
	NetworkContext {
		chain_id: ChainID::Goerli,
		channel_factory_address: Address::repeat_byte(0xfa),
		transfer_registry_address: Address::repeat_byte(0xfb),
	}
}

pub fn hashlock_state(preimage: &[u8]) -> serde_json::Value {
	json!({
		"lockHash": format!("0x{}", hex::encode(hash_secret(preimage))),
		"expiry": "0",
	})
}

pub fn hashlock_resolver(preimage: &[u8]) -> serde_json::Value {
	json!({
		"preImage": format!("0x{}", hex::encode(preimage)),
	})
}

/// In-memory store double mirroring the sqlite layout.
#[derive(Default)]
pub struct MemoryStore {
	channels: Mutex<HashMap<ChannelAddress, FullChannelState>>,
	transfers: Mutex<HashMap<ChannelAddress, BTreeMap<TransferId, FullTransferState>>>,
	updates: Mutex<HashMap<(ChannelAddress, Nonce), ChannelUpdate>>,
}

impl MemoryStore {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	/// Overwrite a replica, simulating a node that missed later updates.
	pub fn force(&self, state: FullChannelState, transfers: Vec<FullTransferState>) {
		let channel_address = state.core.channel_address;
		let nonce = state.core.nonce;

		self.updates
			.lock()
			.retain(|(address, update_nonce), _| *address != channel_address || *update_nonce <= nonce);
		self.transfers.lock().insert(
			channel_address,
			transfers.into_iter().map(|t| (t.core.transfer_id, t)).collect(),
		);
		self.channels.lock().insert(channel_address, state);
	}
}

#[async_trait]
impl Store for MemoryStore {
	async fn get_channel_state(
		&self,
		channel_address: ChannelAddress,
	) -> Result<Option<FullChannelState>, StorageError> {
		Ok(self.channels.lock().get(&channel_address).cloned())
	}

	async fn get_active_transfers(
		&self,
		channel_address: ChannelAddress,
	) -> Result<Vec<FullTransferState>, StorageError> {
		Ok(self
			.transfers
			.lock()
			.get(&channel_address)
			.map(|transfers| transfers.values().cloned().collect())
			.unwrap_or_default())
	}

	async fn get_update_by_nonce(
		&self,
		channel_address: ChannelAddress,
		nonce: Nonce,
	) -> Result<Option<ChannelUpdate>, StorageError> {
		Ok(self.updates.lock().get(&(channel_address, nonce)).cloned())
	}

	async fn save_channel_state(
		&self,
		state: FullChannelState,
		transfer_change: Option<TransferChange>,
	) -> Result<(), StorageError> {
		let channel_address = state.core.channel_address;

		if let Some(latest) = &state.latest_update {
			self.updates.lock().insert((channel_address, latest.nonce), latest.clone());
		}
		match transfer_change {
			Some(TransferChange::Created(transfer)) => {
				self.transfers
					.lock()
					.entry(channel_address)
					.or_default()
					.insert(transfer.core.transfer_id, transfer);
			},
			Some(TransferChange::Resolved(transfer_id)) => {
				if let Some(transfers) = self.transfers.lock().get_mut(&channel_address) {
					transfers.remove(&transfer_id);
				}
			},
			None => {},
		}
		self.channels.lock().insert(channel_address, state);
		Ok(())
	}
}

/// Chain double: configurable deposit totals and hashlock transfer
/// semantics.
#[derive(Default)]
pub struct TestChainReader {
	deposits: Mutex<HashMap<(ChannelAddress, AssetId), (TokenAmount, TokenAmount)>>,
}

impl TestChainReader {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn set_deposits(
		&self,
		channel_address: ChannelAddress,
		asset_id: AssetId,
		total_alice: u64,
		total_bob: u64,
	) {
		self.deposits.lock().insert(
			(channel_address, asset_id),
			(TokenAmount::from(total_alice), TokenAmount::from(total_bob)),
		);
	}
}

#[async_trait]
impl ChainReader for TestChainReader {
	async fn get_code(&self, _address: Address, _chain_id: ChainID) -> Result<Bytes, ChainError> {
		// Every definition is deployed in tests.
		Ok(Bytes(vec![0x60, 0x80, 0x60, 0x40]))
	}

	async fn get_latest_deposit(
		&self,
		channel_address: Address,
		asset_id: AssetId,
		_chain_id: ChainID,
		side: ChannelSide,
	) -> Result<DepositRecord, ChainError> {
		let totals = self
			.deposits
			.lock()
			.get(&(channel_address, asset_id))
			.cloned()
			.unwrap_or((TokenAmount::zero(), TokenAmount::zero()));
		let amount = match side {
			ChannelSide::Alice => totals.0,
			ChannelSide::Bob => totals.1,
		};
		Ok(DepositRecord { nonce: 1, amount })
	}

	async fn resolve(
		&self,
		transfer: &FullTransferState,
		resolver: &serde_json::Value,
		_chain_id: ChainID,
	) -> Result<Balance, ChainError> {
		let lock_hash = transfer
			.transfer_state
			.get("lockHash")
			.and_then(|value| value.as_str())
			.ok_or(ChainError::Other("Transfer state lacks a lock hash"))?;
		let preimage = resolver
			.get("preImage")
			.and_then(|value| value.as_str())
			.ok_or(ChainError::Other("Resolver lacks a preimage"))?;
		let preimage = hex::decode(preimage.trim_start_matches("0x"))
			.map_err(|_| ChainError::Other("Preimage is not hex"))?;

		let total =
			transfer.core.balance.total().ok_or(ChainError::Other("Locked amount overflow"))?;
		let computed = format!("0x{}", hex::encode(hash_secret(&preimage)));
		let amount = if computed == lock_hash {
			// Correct preimage pays the responder.
			[TokenAmount::zero(), total]
		} else {
			[total, TokenAmount::zero()]
		};

		Ok(Balance { to: transfer.core.balance.to, amount })
	}
}

/// Messaging double delivering straight into the counterparty's `inbound`.
#[derive(Default)]
pub struct DirectMessaging {
	peer: Mutex<Option<Arc<ProtocolEngine>>>,
}

impl DirectMessaging {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn connect(&self, peer: Arc<ProtocolEngine>) {
		*self.peer.lock() = Some(peer);
	}
}

#[async_trait]
impl Messaging for DirectMessaging {
	async fn send_protocol_message(
		&self,
		update: ChannelUpdate,
		previous_update: Option<ChannelUpdate>,
	) -> Result<ProtocolReply, TransportError> {
		let peer = { self.peer.lock().clone() }.ok_or(TransportError::Closed)?;
		let result = peer.inbound(update, previous_update).await;
		Ok(reply_for("direct".to_owned(), result))
	}
}

/// Messaging double that never reaches the counterparty.
pub struct SilentMessaging;

#[async_trait]
impl Messaging for SilentMessaging {
	async fn send_protocol_message(
		&self,
		_update: ChannelUpdate,
		_previous_update: Option<ChannelUpdate>,
	) -> Result<ProtocolReply, TransportError> {
		Err(TransportError::Timeout)
	}
}

/// Messaging double answering every request with a canned reply.
pub struct CannedMessaging {
	reply: Mutex<Option<ProtocolReply>>,
}

impl CannedMessaging {
	pub fn new(reply: ProtocolReply) -> Arc<Self> {
		Arc::new(Self { reply: Mutex::new(Some(reply)) })
	}
}

#[async_trait]
impl Messaging for CannedMessaging {
	async fn send_protocol_message(
		&self,
		_update: ChannelUpdate,
		_previous_update: Option<ChannelUpdate>,
	) -> Result<ProtocolReply, TransportError> {
		self.reply.lock().take().ok_or(TransportError::Closed)
	}
}

/// One participant's engine with its collaborators exposed.
pub struct TestNode {
	pub engine: Arc<ProtocolEngine>,
	pub store: Arc<MemoryStore>,
	pub chain: Arc<TestChainReader>,
	pub messaging: Arc<DirectMessaging>,
}

/// Two engines wired to each other's `inbound`, Alice first.
pub fn connected_pair() -> (TestNode, TestNode) {
	let alice_store = MemoryStore::new();
	let bob_store = MemoryStore::new();
	let alice_chain = TestChainReader::new();
	let bob_chain = TestChainReader::new();
	let alice_messaging = DirectMessaging::new();
	let bob_messaging = DirectMessaging::new();

	let alice_engine = Arc::new(ProtocolEngine::new(
		PrivateKey::new(Keyring::Alice.private_key()),
		alice_store.clone(),
		alice_chain.clone(),
		alice_messaging.clone(),
		None,
	));
	let bob_engine = Arc::new(ProtocolEngine::new(
		PrivateKey::new(Keyring::Bob.private_key()),
		bob_store.clone(),
		bob_chain.clone(),
		bob_messaging.clone(),
		None,
	));

	alice_messaging.connect(bob_engine.clone());
	bob_messaging.connect(alice_engine.clone());

	(
		TestNode {
			engine: alice_engine,
			store: alice_store,
			chain: alice_chain,
			messaging: alice_messaging,
		},
		TestNode { engine: bob_engine, store: bob_store, chain: bob_chain, messaging: bob_messaging },
	)
}

/// Bob proposes the channel, making the counterparty Alice.
pub async fn establish_channel(alice: &TestNode, bob: &TestNode) -> FullChannelState {
	let result = bob
		.engine
		.outbound(UpdateParams::Setup(SetupParams {
			counterparty_identifier: alice.engine.public_identifier(),
			timeout: DEFAULT_CHANNEL_TIMEOUT,
			network_context: network_context(),
		}))
		.await
		.expect("Setup should apply");
	result.channel
}

/// Alice reconciles an onchain deposit of `total_alice` units.
pub async fn fund_channel(
	alice: &TestNode,
	bob: &TestNode,
	channel_address: ChannelAddress,
	total_alice: u64,
) -> FullChannelState {
	alice.chain.set_deposits(channel_address, token(), total_alice, 0);
	bob.chain.set_deposits(channel_address, token(), total_alice, 0);

	let result = alice
		.engine
		.outbound(UpdateParams::Deposit(DepositParams { channel_address, asset_id: token() }))
		.await
		.expect("Deposit should apply");
	result.channel
}

/// Parameters installing a hashlock transfer of `amount` from Alice
/// towards Bob.
pub fn create_params(
	channel_address: ChannelAddress,
	amount: u64,
	preimage: &[u8],
) -> UpdateParams {
	UpdateParams::Create(CreateParams {
		channel_address,
		asset_id: token(),
		balance: Balance {
			to: [Keyring::Alice.address(), Keyring::Bob.address()],
			amount: [TokenAmount::from(amount), TokenAmount::zero()],
		},
		transfer_definition: hashlock_definition(),
		transfer_timeout: DEFAULT_TRANSFER_TIMEOUT,
		transfer_initial_state: hashlock_state(preimage),
		state_encoding: "tuple(bytes32 lockHash, uint256 expiry)".to_owned(),
		resolver_encoding: "tuple(bytes32 preImage)".to_owned(),
	})
}

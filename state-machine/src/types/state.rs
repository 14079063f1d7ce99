#![warn(clippy::missing_docs_in_private_items)]

use conduit_primitives::{
	packing::{
		pack_balance,
		pack_transfer_state,
	},
	serializers::to_checksum_str,
	types::{
		Address,
		AssetId,
		Balance,
		Bytes,
		ChainID,
		ChannelAddress,
		ChannelTimeout,
		DefundNonce,
		MerkleRoot,
		NetworkContext,
		Nonce,
		PublicIdentifier,
		TokenAmount,
		TransferId,
		TransferTimeout,
		H256,
	},
};
use derive_more::{
	Deref,
	Display,
};
use itertools::izip;
use serde::{
	Deserialize,
	Serialize,
};
use web3::{
	ethabi::{
		encode,
		Token,
	},
	signing::keccak256,
};

use super::ChannelUpdate;

/// Participant slot within a channel. Alice is index 0, Bob is index 1;
/// the order is fixed at setup and never swaps.
#[derive(Copy, Clone, Debug, Display, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum ChannelSide {
	#[display(fmt = "alice")]
	Alice,
	#[display(fmt = "bob")]
	Bob,
}

impl ChannelSide {
	/// The balance slot of this side.
	pub fn index(&self) -> usize {
		match self {
			ChannelSide::Alice => 0,
			ChannelSide::Bob => 1,
		}
	}

	/// The counterparty's side.
	pub fn other(&self) -> ChannelSide {
		match self {
			ChannelSide::Alice => ChannelSide::Bob,
			ChannelSide::Bob => ChannelSide::Alice,
		}
	}
}

/// The onchain-relevant commitment of a channel.
///
/// Both participants sign the keccak digest of the canonical encoding of
/// this state for every update.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CoreChannelState {
	pub channel_address: ChannelAddress,
	pub alice: Address,
	pub bob: Address,
	pub asset_ids: Vec<AssetId>,
	pub balances: Vec<Balance>,
	pub processed_deposits_a: Vec<TokenAmount>,
	pub processed_deposits_b: Vec<TokenAmount>,
	pub defund_nonces: Vec<DefundNonce>,
	pub timeout: ChannelTimeout,
	pub nonce: Nonce,
	pub merkle_root: MerkleRoot,
}

impl CoreChannelState {
	/// Canonical encoding of the commitment.
	///
	/// Field order and integer widths are pinned; both participants must
	/// produce bit-identical encodings for equal states.
	pub fn pack(&self) -> Bytes {
		let mut b = vec![];

		b.extend(self.channel_address.as_bytes());
		b.extend(self.alice.as_bytes());
		b.extend(self.bob.as_bytes());
		b.extend(encode(&[Token::Uint(self.timeout.into())]));
		b.extend(encode(&[Token::Uint(self.nonce.into())]));
		b.extend(encode(&[Token::Uint(self.asset_ids.len().into())]));
		for (asset_id, balance, processed_a, processed_b, defund_nonce) in izip!(
			&self.asset_ids,
			&self.balances,
			&self.processed_deposits_a,
			&self.processed_deposits_b,
			&self.defund_nonces
		) {
			b.extend(asset_id.as_bytes());
			b.extend(pack_balance(balance).0);
			b.extend(encode(&[Token::Uint(*processed_a)]));
			b.extend(encode(&[Token::Uint(*processed_b)]));
			b.extend(encode(&[Token::Uint((*defund_nonce).into())]));
		}
		b.extend(self.merkle_root.as_bytes());

		Bytes(b)
	}

	/// The digest both participants sign for every update.
	pub fn commitment_hash(&self) -> H256 {
		H256::from_slice(&keccak256(&self.pack().0))
	}
}

/// Offchain channel state: the commitment plus replication bookkeeping.
#[derive(Clone, Debug, Deref, Eq, PartialEq, Serialize, Deserialize)]
pub struct FullChannelState {
	#[deref]
	pub core: CoreChannelState,
	#[serde(serialize_with = "to_checksum_str")]
	pub alice_identifier: PublicIdentifier,
	#[serde(serialize_with = "to_checksum_str")]
	pub bob_identifier: PublicIdentifier,
	pub network_context: NetworkContext,
	pub latest_update: Option<ChannelUpdate>,
	pub in_dispute: bool,
}

/// The onchain-relevant state of a conditional transfer; a member of the
/// active transfer set.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CoreTransferState {
	pub channel_address: ChannelAddress,
	pub transfer_id: TransferId,
	pub transfer_definition: Address,
	pub initiator: Address,
	pub responder: Address,
	pub asset_id: AssetId,
	pub balance: Balance,
	pub transfer_timeout: TransferTimeout,
	pub initial_state_hash: H256,
}

impl CoreTransferState {
	/// Canonical encoding of the transfer commitment.
	pub fn pack(&self) -> Bytes {
		pack_transfer_state(
			self.channel_address,
			self.transfer_id,
			self.transfer_definition,
			self.initiator,
			self.responder,
			self.asset_id,
			&self.balance,
			self.transfer_timeout,
			self.initial_state_hash,
		)
	}

	/// The merkle leaf hash of this transfer.
	pub fn hash(&self) -> H256 {
		H256::from_slice(&keccak256(&self.pack().0))
	}
}

/// Offchain transfer state: the commitment plus the dynamic payload the
/// transfer definition operates on.
#[derive(Clone, Debug, Deref, Eq, PartialEq, Serialize, Deserialize)]
pub struct FullTransferState {
	#[deref]
	pub core: CoreTransferState,
	pub chain_id: ChainID,
	pub channel_factory_address: Address,
	pub channel_nonce: Nonce,
	pub transfer_state: serde_json::Value,
	pub transfer_resolver: Option<serde_json::Value>,
	pub state_encoding: String,
	pub resolver_encoding: String,
	pub in_dispute: bool,
}

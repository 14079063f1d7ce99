#![warn(clippy::missing_docs_in_private_items)]

use serde::{
	Deserialize,
	Serialize,
};
pub use web3::types::{
	Address,
	Bytes,
	H160,
	H256,
	U256,
};

/// Chain identifier module.
mod chain_id;
pub use chain_id::*;

use crate::{
	deserializers::amount_pair_from_str,
	serializers::amount_pair_to_str,
};

/// Alias type for an asset identifier (the asset's onchain address).
pub type AssetId = Address;

/// Alias type for a channel address.
pub type ChannelAddress = Address;

/// Alias type for a per-asset defund counter.
pub type DefundNonce = u64;

/// Alias type for a merkle root.
pub type MerkleRoot = H256;

/// Alias type for the strictly monotonic update counter.
pub type Nonce = u64;

/// Alias type for a participant's messaging identity.
///
/// A participant is identified by the address of its signing key.
pub type PublicIdentifier = Address;

/// Alias type for a signature.
pub type Signature = Bytes;

/// Alias type for a dispute window in seconds.
pub type ChannelTimeout = u64;

/// Alias type for a token amount.
pub type TokenAmount = U256;

/// Alias type for a transfer identifier.
pub type TransferId = H256;

/// Alias type for a conditional transfer's timeout in seconds.
pub type TransferTimeout = u64;

/// A pair of payout targets and amounts.
///
/// Channel balances are `[alice, bob]`-ordered. Transfer balances are
/// `[initiator, responder]`-ordered.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Balance {
	pub to: [Address; 2],
	#[serde(serialize_with = "amount_pair_to_str", deserialize_with = "amount_pair_from_str")]
	pub amount: [TokenAmount; 2],
}

impl Balance {
	/// Sum of both sides, `None` on overflow.
	pub fn total(&self) -> Option<TokenAmount> {
		self.amount[0].checked_add(self.amount[1])
	}
}

/// The onchain context a channel lives in.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct NetworkContext {
	pub chain_id: ChainID,
	pub channel_factory_address: Address,
	pub transfer_registry_address: Address,
}

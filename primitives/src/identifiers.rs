#![warn(clippy::missing_docs_in_private_items)]

use web3::{
	ethabi::{
		encode,
		Token,
	},
	signing::keccak256,
};

use crate::types::{
	Address,
	ChainID,
	ChannelAddress,
	Nonce,
	TransferId,
	H256,
};

/// Derive the deterministic address of the channel between `alice` and
/// `bob` on `chain_id`, as created by `channel_factory_address`.
///
/// The participant order is part of the derivation and never swaps.
pub fn channel_address(
	alice: Address,
	bob: Address,
	chain_id: ChainID,
	channel_factory_address: Address,
) -> ChannelAddress {
	let mut b = vec![];

	b.extend(alice.as_bytes());
	b.extend(bob.as_bytes());
	b.extend(encode(&[Token::Uint(chain_id.into())]));
	b.extend(channel_factory_address.as_bytes());

	let hash = keccak256(&b);
	Address::from_slice(&hash[12..])
}

/// Derive a transfer identifier from the channel address, the nonce of the
/// create update and the transfer's definition and initial state.
pub fn transfer_id(
	channel_address: ChannelAddress,
	channel_nonce: Nonce,
	transfer_definition: Address,
	initial_state_hash: H256,
) -> TransferId {
	let mut b = vec![];

	b.extend(channel_address.as_bytes());
	b.extend(encode(&[Token::Uint(channel_nonce.into())]));
	b.extend(transfer_definition.as_bytes());
	b.extend(initial_state_hash.as_bytes());

	TransferId::from_slice(&keccak256(&b))
}

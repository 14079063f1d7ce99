use web3::types::{
	Address,
	H256,
};

use crate::{
	identifiers::{
		channel_address,
		transfer_id,
	},
	types::ChainID,
};

#[test]
fn test_channel_address_is_deterministic() {
	let alice = Address::repeat_byte(0x11);
	let bob = Address::repeat_byte(0x22);
	let factory = Address::repeat_byte(0x33);

	let first = channel_address(alice, bob, ChainID::Mainnet, factory);
	let second = channel_address(alice, bob, ChainID::Mainnet, factory);

	assert_eq!(first, second);
}

#[test]
fn test_channel_address_is_order_sensitive() {
	let alice = Address::repeat_byte(0x11);
	let bob = Address::repeat_byte(0x22);
	let factory = Address::repeat_byte(0x33);

	let ordered = channel_address(alice, bob, ChainID::Mainnet, factory);
	let swapped = channel_address(bob, alice, ChainID::Mainnet, factory);

	assert_ne!(ordered, swapped);
}

#[test]
fn test_channel_address_depends_on_chain() {
	let alice = Address::repeat_byte(0x11);
	let bob = Address::repeat_byte(0x22);
	let factory = Address::repeat_byte(0x33);

	let mainnet = channel_address(alice, bob, ChainID::Mainnet, factory);
	let goerli = channel_address(alice, bob, ChainID::Goerli, factory);

	assert_ne!(mainnet, goerli);
}

#[test]
fn test_transfer_id_depends_on_nonce() {
	let channel = Address::repeat_byte(0x44);
	let definition = Address::repeat_byte(0x55);
	let state_hash = H256::repeat_byte(0x66);

	let at_three = transfer_id(channel, 3, definition, state_hash);
	let at_four = transfer_id(channel, 4, definition, state_hash);

	assert_ne!(at_three, at_four);
}

#![warn(clippy::missing_docs_in_private_items)]

use web3::ethabi::{
	encode,
	Token,
};

use crate::types::{
	Address,
	AssetId,
	Balance,
	Bytes,
	TransferId,
	TransferTimeout,
	H256,
};

/// Pack a balance pair. Targets as raw address bytes, amounts as 32-byte
/// big-endian words.
pub fn pack_balance(balance: &Balance) -> Bytes {
	let mut b = vec![];

	b.extend(balance.to[0].as_bytes());
	b.extend(balance.to[1].as_bytes());
	b.extend(encode(&[Token::Uint(balance.amount[0])]));
	b.extend(encode(&[Token::Uint(balance.amount[1])]));

	Bytes(b)
}

/// Pack the onchain-relevant fields of a conditional transfer.
///
/// The field order is pinned; both participants must produce bit-identical
/// encodings for the same transfer.
pub fn pack_transfer_state(
	channel_address: Address,
	transfer_id: TransferId,
	transfer_definition: Address,
	initiator: Address,
	responder: Address,
	asset_id: AssetId,
	balance: &Balance,
	transfer_timeout: TransferTimeout,
	initial_state_hash: H256,
) -> Bytes {
	let mut b = vec![];

	b.extend(channel_address.as_bytes());
	b.extend(transfer_id.as_bytes());
	b.extend(transfer_definition.as_bytes());
	b.extend(initiator.as_bytes());
	b.extend(responder.as_bytes());
	b.extend(asset_id.as_bytes());
	b.extend(pack_balance(balance).0);
	b.extend(encode(&[Token::Uint(transfer_timeout.into())]));
	b.extend(initial_state_hash.as_bytes());

	Bytes(b)
}

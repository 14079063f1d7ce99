#![warn(clippy::missing_docs_in_private_items)]

use lazy_static::lazy_static;

use crate::types::{
	Bytes,
	MerkleRoot,
};

pub const DEFAULT_TRANSFER_TIMEOUT: u64 = 60 * 60 * 24;
pub const MINIMUM_TRANSFER_TIMEOUT: u64 = DEFAULT_TRANSFER_TIMEOUT / 2;
pub const MAXIMUM_TRANSFER_TIMEOUT: u64 = DEFAULT_TRANSFER_TIMEOUT * 2;
pub const DEFAULT_CHANNEL_TIMEOUT: u64 = DEFAULT_TRANSFER_TIMEOUT * 2;

lazy_static! {
	pub static ref EMPTY_SIGNATURE: Bytes = Bytes(vec![0; 65]);
	pub static ref EMPTY_MERKLE_ROOT: MerkleRoot = MerkleRoot::zero();
}

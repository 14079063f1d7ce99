#![warn(clippy::missing_docs_in_private_items)]

use std::collections::BTreeMap;

use conduit_primitives::types::{
	MerkleRoot,
	TransferId,
	H256,
};
use serde::{
	Deserialize,
	Serialize,
};
use web3::signing::keccak256;

use crate::{
	errors::ChannelError,
	types::FullTransferState,
};

/// The set of active transfers, committed as a merkle root over the
/// transfer commitment hashes in ascending `transfer_id` order.
///
/// Interior nodes hash the commutatively sorted pair, so membership proofs
/// verify without a position index. The empty set commits to the all-zero
/// root.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct TransferSet {
	transfers: BTreeMap<TransferId, FullTransferState>,
}

impl TransferSet {
	/// An empty set.
	pub fn new() -> Self {
		Self { transfers: BTreeMap::new() }
	}

	/// Rebuild the set from persisted transfers.
	pub fn from_transfers(transfers: Vec<FullTransferState>) -> Self {
		let transfers = transfers.into_iter().map(|t| (t.core.transfer_id, t)).collect();
		Self { transfers }
	}

	/// Install a transfer and return the new root. Duplicate installs are a
	/// protocol error.
	pub fn insert(&mut self, transfer: FullTransferState) -> Result<MerkleRoot, ChannelError> {
		let transfer_id = transfer.core.transfer_id;
		if self.transfers.contains_key(&transfer_id) {
			return Err(ChannelError::DuplicateTransfer(transfer_id))
		}
		self.transfers.insert(transfer_id, transfer);
		Ok(self.root())
	}

	/// Remove a transfer and return it together with the new root.
	pub fn remove(
		&mut self,
		transfer_id: &TransferId,
	) -> Result<(FullTransferState, MerkleRoot), ChannelError> {
		let transfer = self
			.transfers
			.remove(transfer_id)
			.ok_or(ChannelError::UnknownTransfer(*transfer_id))?;
		Ok((transfer, self.root()))
	}

	/// Look up an active transfer.
	pub fn get(&self, transfer_id: &TransferId) -> Option<&FullTransferState> {
		self.transfers.get(transfer_id)
	}

	/// True if the transfer is active.
	pub fn contains(&self, transfer_id: &TransferId) -> bool {
		self.transfers.contains_key(transfer_id)
	}

	/// Number of active transfers.
	pub fn len(&self) -> usize {
		self.transfers.len()
	}

	/// True if no transfer is active.
	pub fn is_empty(&self) -> bool {
		self.transfers.is_empty()
	}

	/// Iterate the active transfers in canonical order.
	pub fn transfers(&self) -> impl Iterator<Item = &FullTransferState> {
		self.transfers.values()
	}

	/// Consume the set into its transfers in canonical order.
	pub fn into_transfers(self) -> Vec<FullTransferState> {
		self.transfers.into_values().collect()
	}

	/// The root committing to the current set.
	pub fn root(&self) -> MerkleRoot {
		compute_root(self.leaves())
	}

	/// The sibling path proving membership of the given transfer.
	pub fn proof(&self, transfer_id: &TransferId) -> Option<Vec<H256>> {
		let mut index = self.transfers.keys().position(|id| id == transfer_id)?;
		let mut layer = self.leaves();
		let mut path = vec![];

		while layer.len() > 1 {
			let sibling = index ^ 1;
			if sibling < layer.len() {
				path.push(layer[sibling]);
			}
			layer = next_layer(&layer);
			index /= 2;
		}

		Some(path)
	}

	/// Leaf hashes in canonical order.
	fn leaves(&self) -> Vec<H256> {
		self.transfers.values().map(|transfer| transfer.core.hash()).collect()
	}
}

/// Verify a membership proof produced by [`TransferSet::proof`].
pub fn verify_proof(leaf: H256, root: MerkleRoot, proof: &[H256]) -> bool {
	let computed = proof.iter().fold(leaf, |node, sibling| hash_pair(node, *sibling));
	computed == root
}

/// Hash the commutatively sorted pair.
fn hash_pair(a: H256, b: H256) -> H256 {
	let (first, second) = if a <= b { (a, b) } else { (b, a) };
	let mut bytes = first.as_bytes().to_vec();
	bytes.extend(second.as_bytes());
	H256::from_slice(&keccak256(&bytes))
}

/// Fold one layer of the tree; an odd trailing node is promoted.
fn next_layer(layer: &[H256]) -> Vec<H256> {
	layer
		.chunks(2)
		.map(|pair| if pair.len() == 2 { hash_pair(pair[0], pair[1]) } else { pair[0] })
		.collect()
}

/// Reduce the leaves to the root.
fn compute_root(mut layer: Vec<H256>) -> MerkleRoot {
	if layer.is_empty() {
		return MerkleRoot::zero()
	}
	while layer.len() > 1 {
		layer = next_layer(&layer);
	}
	layer[0]
}

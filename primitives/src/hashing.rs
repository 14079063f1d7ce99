use serde_json::Value;
use sha2::{
	Digest,
	Sha256,
};
use web3::signing::keccak256;

use crate::types::H256;

pub fn hash_secret(secret: &[u8]) -> [u8; 32] {
	let mut hasher = Sha256::new();
	hasher.update(secret);
	hasher.finalize().into()
}

/// Keccak over the canonical JSON encoding of a dynamic payload.
///
/// `serde_json` keeps object keys sorted, so the encoding is identical
/// across participants for equal values.
pub fn hash_canonical_json(value: &Value) -> Result<H256, serde_json::Error> {
	let encoded = serde_json::to_vec(value)?;
	Ok(H256::from_slice(&keccak256(&encoded)))
}

use conduit_primitives::{
	signing::hash_data,
	traits::ToBytes,
	types::Bytes,
};
use ethsign::SecretKey;
use web3::{
	signing::{
		self,
		Key,
	},
	types::{
		Address,
		H256,
	},
};

/// The engine's signing capability: an in-memory secp256k1 key whose
/// address doubles as the participant's public identifier.
#[derive(Clone)]
pub struct PrivateKey {
	inner: SecretKey,
}

impl PrivateKey {
	pub fn new(inner: SecretKey) -> Self {
		Self { inner }
	}

	/// Sign a protocol digest (a channel commitment or an update
	/// identifier) and return the 65-byte r‖s‖v form carried in updates.
	pub fn sign_message_bytes(&self, message: &[u8]) -> Result<Bytes, signing::SigningError> {
		let signature = self.sign_message(message)?;
		Ok(Bytes(signature.to_bytes()))
	}

	/// Sign a 32-byte digest, keeping the raw recovery id.
	fn sign_digest(&self, digest: &[u8]) -> Result<ethsign::Signature, signing::SigningError> {
		self.inner.sign(digest).map_err(|_| signing::SigningError::InvalidMessage)
	}
}

impl Key for PrivateKey {
	fn sign(
		&self,
		message: &[u8],
		chain_id: Option<u64>,
	) -> Result<signing::Signature, signing::SigningError> {
		let signature = self.sign_digest(message)?;

		let v = match chain_id {
			// Replay-protected form for raw transactions.
			Some(chain_id) => signature.v as u64 + 35 + chain_id * 2,
			None => signature.v as u64 + 27,
		};
		Ok(signing::Signature { r: H256::from(signature.r), s: H256::from(signature.s), v })
	}

	fn sign_message(&self, message: &[u8]) -> Result<signing::Signature, signing::SigningError> {
		// The digest discipline must mirror `signing::recover`, which
		// prefixes the message before hashing.
		let signature = self.sign_digest(&hash_data(message))?;

		Ok(signing::Signature {
			r: H256::from(signature.r),
			s: H256::from(signature.s),
			v: signature.v as u64 + 27,
		})
	}

	fn address(&self) -> Address {
		Address::from(self.inner.public().address())
	}
}

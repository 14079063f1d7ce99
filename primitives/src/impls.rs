#![warn(clippy::missing_docs_in_private_items)]

use web3::{
	signing::{
		keccak256,
		Signature,
	},
	types::Address,
};

use crate::traits::{
	Checksum,
	ToBytes,
};

/// The 65-byte r‖s‖v form carried in updates and verified by
/// `signing::recover`.
impl ToBytes for Signature {
	fn to_bytes(&self) -> Vec<u8> {
		let mut bytes = Vec::with_capacity(65);
		bytes.extend_from_slice(self.r.as_bytes());
		bytes.extend_from_slice(self.s.as_bytes());
		// Updates carry the recovery byte in its 27/28 form.
		bytes.push(self.v as u8);
		bytes
	}
}

/// EIP-55 mixed-case encoding: a hex character is uppercased when the
/// matching nibble of the keccak digest of the lowercase address is 8 or
/// above.
impl Checksum for Address {
	fn checksum(&self) -> String {
		let hex_addr = hex::encode(self.as_bytes());
		let digest = keccak256(hex_addr.as_bytes());

		let mut encoded = String::with_capacity(2 + hex_addr.len());
		encoded.push_str("0x");
		for (position, character) in hex_addr.chars().enumerate() {
			let nibble = if position % 2 == 0 {
				digest[position / 2] >> 4
			} else {
				digest[position / 2] & 0x0f
			};
			if nibble >= 8 {
				encoded.push(character.to_ascii_uppercase());
			} else {
				encoded.push(character);
			}
		}
		encoded
	}
}

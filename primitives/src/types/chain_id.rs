#![warn(clippy::missing_docs_in_private_items)]

use std::str::FromStr;

use derive_more::Display;
use web3::types::U256;

#[repr(u8)]
#[derive(Copy, Clone, Display, Debug, Eq, Hash, PartialEq)]
pub enum ChainID {
	Mainnet = 1,
	Goerli = 5,
	Matic = 137,
	Private(U256),
}

impl From<u64> for ChainID {
	fn from(value: u64) -> Self {
		match value {
			1 => ChainID::Mainnet,
			5 => ChainID::Goerli,
			137 => ChainID::Matic,
			id => ChainID::Private(id.into()),
		}
	}
}

impl From<ChainID> for u64 {
	fn from(val: ChainID) -> Self {
		match val {
			ChainID::Mainnet => 1u64,
			ChainID::Goerli => 5u64,
			ChainID::Matic => 137u64,
			ChainID::Private(id) => id.as_u64(),
		}
	}
}

impl From<ChainID> for U256 {
	fn from(val: ChainID) -> Self {
		let chain_id: u64 = val.into();
		chain_id.into()
	}
}

impl From<U256> for ChainID {
	fn from(value: U256) -> Self {
		if value.bits() > 64 {
			return ChainID::Private(value)
		}
		value.as_u64().into()
	}
}

impl From<ChainID> for Vec<u8> {
	fn from(val: ChainID) -> Self {
		let chain_id: u64 = val.into();
		chain_id.to_be_bytes().to_vec()
	}
}

impl FromStr for ChainID {
	type Err = ();

	fn from_str(s: &str) -> Result<ChainID, ()> {
		Ok(s.parse::<u64>().map_err(|_| ())?.into())
	}
}

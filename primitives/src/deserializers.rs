#![warn(clippy::missing_docs_in_private_items)]

use std::{
	fmt,
	str::FromStr,
};

use serde::{
	de::{
		Error,
		Visitor,
	},
	Deserialize,
	Deserializer,
};
use web3::types::U256;

use crate::types::{
	ChainID,
	TokenAmount,
};

impl<'de> Deserialize<'de> for ChainID {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		/// Accepts the string form produced by our serializer as well as a
		/// plain integer.
		struct ChainIDVisitor;

		impl<'de> Visitor<'de> for ChainIDVisitor {
			type Value = ChainID;

			fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
				formatter.write_str("a chain identifier")
			}

			fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
			where
				E: Error,
			{
				ChainID::from_str(v).map_err(|_| Error::custom("Invalid chain ID"))
			}

			fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
			where
				E: Error,
			{
				Ok(v.into())
			}
		}

		deserializer.deserialize_any(ChainIDVisitor)
	}
}

/// Deserialize U256 from a decimal string.
pub fn u256_from_str<'de, D>(deserializer: D) -> Result<U256, D::Error>
where
	D: Deserializer<'de>,
{
	let s = String::deserialize(deserializer)?;
	U256::from_dec_str(&s).map_err(Error::custom)
}

/// Deserialize a pair of amounts from decimal strings.
pub fn amount_pair_from_str<'de, D>(deserializer: D) -> Result<[TokenAmount; 2], D::Error>
where
	D: Deserializer<'de>,
{
	let pair: [String; 2] = Deserialize::deserialize(deserializer)?;
	let first = U256::from_dec_str(&pair[0]).map_err(Error::custom)?;
	let second = U256::from_dec_str(&pair[1]).map_err(Error::custom)?;
	Ok([first, second])
}

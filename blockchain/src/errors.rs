use conduit_primitives::types::Address;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChainError {
	#[error("Web3 error: `{0}`")]
	Web3(#[from] web3::Error),
	#[error("ABI error: `{0}`")]
	Abi(#[from] ethabi::Error),
	#[error("Unexpected return data: `{0}`")]
	InvalidReturnData(String),
	#[error("Chain reader serves chain `{expected}`, queried for `{got}`")]
	WrongChain { expected: u64, got: u64 },
	#[error("Transfer definition `{0}` is not deployed")]
	UnknownTransferDefinition(Address),
	#[error("Resolver payload could not be encoded: `{0}`")]
	ResolverEncoding(#[from] serde_json::Error),
	#[error("`{0}`")]
	Other(&'static str),
}

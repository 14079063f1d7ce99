#![warn(clippy::missing_docs_in_private_items)]

use async_trait::async_trait;
use conduit_primitives::types::{
	Address,
	AssetId,
	Balance,
	Bytes,
	ChainID,
	TokenAmount,
};
use conduit_state_machine::types::{
	ChannelSide,
	FullTransferState,
};
use ethabi::{
	encode,
	ParamType,
	Token,
};
use web3::{
	signing::keccak256,
	types::CallRequest,
	Transport,
	Web3,
};

use crate::errors::ChainError;

/// Cumulative deposit totals recorded onchain for one side of a channel.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DepositRecord {
	pub nonce: u64,
	pub amount: TokenAmount,
}

/// Read-only chain access consumed by the protocol engine.
///
/// Queries are idempotent; the engine may retry them freely.
#[async_trait]
pub trait ChainReader: Send + Sync {
	/// Deployed bytecode at `address`, empty if none.
	async fn get_code(&self, address: Address, chain_id: ChainID) -> Result<Bytes, ChainError>;

	/// Latest cumulative deposit total for one side of the channel.
	async fn get_latest_deposit(
		&self,
		channel_address: Address,
		asset_id: AssetId,
		chain_id: ChainID,
		side: ChannelSide,
	) -> Result<DepositRecord, ChainError>;

	/// Evaluate the transfer definition against the transfer state and the
	/// given resolver, returning the final `[initiator, responder]` payout.
	async fn resolve(
		&self,
		transfer: &FullTransferState,
		resolver: &serde_json::Value,
		chain_id: ChainID,
	) -> Result<Balance, ChainError>;
}

/// A thin web3-backed reader serving a single chain.
pub struct Web3ChainReader<T: Transport> {
	web3: Web3<T>,
	chain_id: ChainID,
}

impl<T: Transport> Web3ChainReader<T> {
	pub fn new(web3: Web3<T>, chain_id: ChainID) -> Self {
		Self { web3, chain_id }
	}

	/// Queries must address the chain this reader is connected to.
	fn check_chain(&self, chain_id: ChainID) -> Result<(), ChainError> {
		if chain_id != self.chain_id {
			return Err(ChainError::WrongChain {
				expected: self.chain_id.into(),
				got: chain_id.into(),
			})
		}
		Ok(())
	}
}

/// First four bytes of the keccak of the method signature.
fn selector(signature: &str) -> [u8; 4] {
	let hash = keccak256(signature.as_bytes());
	[hash[0], hash[1], hash[2], hash[3]]
}

/// Decode the `([address, address], [uint256, uint256])` payout a transfer
/// definition returns.
fn balance_from_return(data: &[u8]) -> Result<Balance, ChainError> {
	let tokens = ethabi::decode(
		&[
			ParamType::FixedArray(Box::new(ParamType::Address), 2),
			ParamType::FixedArray(Box::new(ParamType::Uint(256)), 2),
		],
		data,
	)?;

	let mut tokens = tokens.into_iter();
	let to = match tokens.next() {
		Some(Token::FixedArray(targets)) => {
			let targets: Vec<Address> =
				targets.into_iter().filter_map(|token| token.into_address()).collect();
			match targets.as_slice() {
				[first, second] => [*first, *second],
				_ => return Err(ChainError::InvalidReturnData("payout targets".to_owned())),
			}
		},
		_ => return Err(ChainError::InvalidReturnData("payout targets".to_owned())),
	};
	let amount = match tokens.next() {
		Some(Token::FixedArray(amounts)) => {
			let amounts: Vec<TokenAmount> =
				amounts.into_iter().filter_map(|token| token.into_uint()).collect();
			match amounts.as_slice() {
				[first, second] => [*first, *second],
				_ => return Err(ChainError::InvalidReturnData("payout amounts".to_owned())),
			}
		},
		_ => return Err(ChainError::InvalidReturnData("payout amounts".to_owned())),
	};

	Ok(Balance { to, amount })
}

impl<T> Web3ChainReader<T>
where
	T: Transport + Send + Sync,
	T::Out: Send,
{
	/// Issue an `eth_call` against `to`.
	async fn call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>, ChainError> {
		let request =
			CallRequest { to: Some(to), data: Some(Bytes(data)), ..Default::default() };
		let result = self.web3.eth().call(request, None).await?;
		Ok(result.0)
	}
}

#[async_trait]
impl<T> ChainReader for Web3ChainReader<T>
where
	T: Transport + Send + Sync,
	T::Out: Send,
{
	async fn get_code(&self, address: Address, chain_id: ChainID) -> Result<Bytes, ChainError> {
		self.check_chain(chain_id)?;
		let code = self.web3.eth().code(address, None).await?;
		Ok(code)
	}

	async fn get_latest_deposit(
		&self,
		channel_address: Address,
		asset_id: AssetId,
		chain_id: ChainID,
		side: ChannelSide,
	) -> Result<DepositRecord, ChainError> {
		self.check_chain(chain_id)?;

		let method = match side {
			ChannelSide::Alice => "getLatestDepositAlice(address)",
			ChannelSide::Bob => "getLatestDepositBob(address)",
		};
		let mut data = selector(method).to_vec();
		data.extend(encode(&[Token::Address(asset_id)]));

		let result = self.call(channel_address, data).await?;
		let tokens =
			ethabi::decode(&[ParamType::Uint(256), ParamType::Uint(256)], &result)?;
		let nonce = tokens
			.get(0)
			.and_then(|token| token.clone().into_uint())
			.ok_or_else(|| ChainError::InvalidReturnData("deposit nonce".to_owned()))?;
		let amount = tokens
			.get(1)
			.and_then(|token| token.clone().into_uint())
			.ok_or_else(|| ChainError::InvalidReturnData("deposit amount".to_owned()))?;

		Ok(DepositRecord { nonce: nonce.low_u64(), amount })
	}

	async fn resolve(
		&self,
		transfer: &FullTransferState,
		resolver: &serde_json::Value,
		chain_id: ChainID,
	) -> Result<Balance, ChainError> {
		self.check_chain(chain_id)?;

		let code = self.get_code(transfer.core.transfer_definition, chain_id).await?;
		if code.0.is_empty() {
			return Err(ChainError::UnknownTransferDefinition(transfer.core.transfer_definition))
		}

		let encoded_state = serde_json::to_vec(&transfer.transfer_state)?;
		let encoded_resolver = serde_json::to_vec(resolver)?;
		let mut data = selector("resolve(bytes,bytes)").to_vec();
		data.extend(encode(&[Token::Bytes(encoded_state), Token::Bytes(encoded_resolver)]));

		let result = self.call(transfer.core.transfer_definition, data).await?;
		balance_from_return(&result)
	}
}

#![warn(clippy::missing_docs_in_private_items)]

use conduit_primitives::{
	deserializers::u256_from_str,
	hashing::hash_canonical_json,
	packing::pack_balance,
	serializers::u256_to_str,
	types::{
		Address,
		AssetId,
		Balance,
		Bytes,
		ChannelAddress,
		ChannelTimeout,
		NetworkContext,
		Nonce,
		PublicIdentifier,
		Signature,
		TokenAmount,
		TransferId,
		TransferTimeout,
		H256,
	},
};
use derive_more::Display;
use serde::{
	Deserialize,
	Serialize,
};
use web3::{
	ethabi::{
		encode,
		Token,
	},
	signing::keccak256,
};

use super::ChannelSide;

/// Variants of channel update types.
#[repr(u8)]
#[derive(Copy, Clone, Display, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateType {
	#[display(fmt = "setup")]
	Setup = 0,
	#[display(fmt = "deposit")]
	Deposit = 1,
	#[display(fmt = "create")]
	Create = 2,
	#[display(fmt = "resolve")]
	Resolve = 3,
}

/// Idempotency key of an update.
///
/// The initiator signs the identifier so the counterparty cannot forge an
/// alternative update under the same identifier; a match against the
/// committed update at a nonce slot means the operation already executed.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct UpdateId {
	pub id: String,
	pub signature: Signature,
}

/// The unit of channel progress: a numbered, signed state transition.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ChannelUpdate {
	pub id: UpdateId,
	pub channel_address: ChannelAddress,
	pub from_identifier: PublicIdentifier,
	pub to_identifier: PublicIdentifier,
	pub nonce: Nonce,
	pub asset_id: AssetId,
	pub balance: Balance,
	pub details: UpdateDetails,
	pub alice_signature: Option<Signature>,
	pub bob_signature: Option<Signature>,
}

impl ChannelUpdate {
	/// The update type tag carried by the details payload.
	pub fn update_type(&self) -> UpdateType {
		self.details.update_type()
	}

	/// True if both commitment signatures are present.
	pub fn is_double_signed(&self) -> bool {
		self.alice_signature.is_some() && self.bob_signature.is_some()
	}

	/// The commitment signature of the given side, if present.
	pub fn signature_of(&self, side: ChannelSide) -> Option<&Signature> {
		match side {
			ChannelSide::Alice => self.alice_signature.as_ref(),
			ChannelSide::Bob => self.bob_signature.as_ref(),
		}
	}

	/// Store a commitment signature into the given side's slot.
	pub fn set_signature(&mut self, side: ChannelSide, signature: Signature) {
		match side {
			ChannelSide::Alice => self.alice_signature = Some(signature),
			ChannelSide::Bob => self.bob_signature = Some(signature),
		}
	}

	/// Canonical encoding of the update content. Identifier and commitment
	/// signatures are not part of the encoding.
	pub fn pack(&self) -> Result<Bytes, serde_json::Error> {
		let mut b = vec![];

		b.extend(self.channel_address.as_bytes());
		b.extend(self.from_identifier.as_bytes());
		b.extend(self.to_identifier.as_bytes());
		b.extend(encode(&[Token::Uint((self.update_type() as u8).into())]));
		b.extend(encode(&[Token::Uint(self.nonce.into())]));
		b.extend(self.asset_id.as_bytes());
		b.extend(pack_balance(&self.balance).0);
		b.extend(self.details.pack()?.0);

		Ok(Bytes(b))
	}

	/// Keccak digest of the canonical encoding.
	pub fn hash(&self) -> Result<H256, serde_json::Error> {
		Ok(H256::from_slice(&keccak256(&self.pack()?.0)))
	}
}

/// Type-tagged payload of an update.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum UpdateDetails {
	Setup(SetupUpdateDetails),
	Deposit(DepositUpdateDetails),
	Create(CreateUpdateDetails),
	Resolve(ResolveUpdateDetails),
}

impl UpdateDetails {
	/// The type tag of this payload.
	pub fn update_type(&self) -> UpdateType {
		match self {
			UpdateDetails::Setup(_) => UpdateType::Setup,
			UpdateDetails::Deposit(_) => UpdateType::Deposit,
			UpdateDetails::Create(_) => UpdateType::Create,
			UpdateDetails::Resolve(_) => UpdateType::Resolve,
		}
	}

	/// Canonical encoding of the payload. Dynamic transfer payloads enter
	/// through their canonical JSON digest.
	pub fn pack(&self) -> Result<Bytes, serde_json::Error> {
		let mut b = vec![];

		match self {
			UpdateDetails::Setup(details) => {
				b.extend(encode(&[Token::Uint(details.timeout.into())]));
				b.extend(encode(&[Token::Uint(details.network_context.chain_id.into())]));
				b.extend(details.network_context.channel_factory_address.as_bytes());
				b.extend(details.network_context.transfer_registry_address.as_bytes());
			},
			UpdateDetails::Deposit(details) => {
				b.extend(encode(&[Token::Uint(details.total_deposits_alice)]));
				b.extend(encode(&[Token::Uint(details.total_deposits_bob)]));
			},
			UpdateDetails::Create(details) => {
				b.extend(details.transfer_id.as_bytes());
				b.extend(details.transfer_definition.as_bytes());
				b.extend(encode(&[Token::Uint(details.transfer_timeout.into())]));
				b.extend(pack_balance(&details.balance).0);
				b.extend(hash_canonical_json(&details.transfer_initial_state)?.as_bytes());
				b.extend(keccak256(details.state_encoding.as_bytes()));
				b.extend(keccak256(details.resolver_encoding.as_bytes()));
			},
			UpdateDetails::Resolve(details) => {
				b.extend(details.transfer_id.as_bytes());
				b.extend(details.transfer_definition.as_bytes());
				b.extend(hash_canonical_json(&details.transfer_resolver)?.as_bytes());
			},
		}

		Ok(Bytes(b))
	}
}

/// Payload of a setup update. The initiator of the setup becomes Bob; the
/// counterparty becomes Alice.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SetupUpdateDetails {
	pub timeout: ChannelTimeout,
	pub network_context: NetworkContext,
}

/// Payload of a deposit update: the onchain cumulative deposit totals the
/// update reconciles against.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct DepositUpdateDetails {
	#[serde(serialize_with = "u256_to_str", deserialize_with = "u256_from_str")]
	pub total_deposits_alice: TokenAmount,
	#[serde(serialize_with = "u256_to_str", deserialize_with = "u256_from_str")]
	pub total_deposits_bob: TokenAmount,
}

/// Payload of a create update: the conditional transfer being installed.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CreateUpdateDetails {
	pub transfer_id: TransferId,
	pub balance: Balance,
	pub transfer_definition: Address,
	pub transfer_timeout: TransferTimeout,
	pub transfer_initial_state: serde_json::Value,
	pub state_encoding: String,
	pub resolver_encoding: String,
}

/// Payload of a resolve update: the resolver closing an active transfer.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ResolveUpdateDetails {
	pub transfer_id: TransferId,
	pub transfer_definition: Address,
	pub transfer_resolver: serde_json::Value,
}

/// User-facing parameters driving an outbound update.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum UpdateParams {
	Setup(SetupParams),
	Deposit(DepositParams),
	Create(CreateParams),
	Resolve(ResolveParams),
}

impl UpdateParams {
	/// The update type these parameters produce.
	pub fn update_type(&self) -> UpdateType {
		match self {
			UpdateParams::Setup(_) => UpdateType::Setup,
			UpdateParams::Deposit(_) => UpdateType::Deposit,
			UpdateParams::Create(_) => UpdateType::Create,
			UpdateParams::Resolve(_) => UpdateType::Resolve,
		}
	}

	/// The channel the parameters address; `None` for setup, where the
	/// address is derived.
	pub fn channel_address(&self) -> Option<ChannelAddress> {
		match self {
			UpdateParams::Setup(_) => None,
			UpdateParams::Deposit(params) => Some(params.channel_address),
			UpdateParams::Create(params) => Some(params.channel_address),
			UpdateParams::Resolve(params) => Some(params.channel_address),
		}
	}
}

/// Parameters for proposing a new channel.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SetupParams {
	pub counterparty_identifier: PublicIdentifier,
	pub timeout: ChannelTimeout,
	pub network_context: NetworkContext,
}

/// Parameters for reconciling an onchain deposit.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct DepositParams {
	pub channel_address: ChannelAddress,
	pub asset_id: AssetId,
}

/// Parameters for installing a conditional transfer.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CreateParams {
	pub channel_address: ChannelAddress,
	pub asset_id: AssetId,
	pub balance: Balance,
	pub transfer_definition: Address,
	pub transfer_timeout: TransferTimeout,
	pub transfer_initial_state: serde_json::Value,
	pub state_encoding: String,
	pub resolver_encoding: String,
}

/// Parameters for closing an active transfer.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ResolveParams {
	pub channel_address: ChannelAddress,
	pub transfer_id: TransferId,
	pub transfer_resolver: serde_json::Value,
}

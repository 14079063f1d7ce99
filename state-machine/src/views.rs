#![warn(clippy::missing_docs_in_private_items)]

use conduit_primitives::types::{
	Address,
	AssetId,
	Nonce,
	TokenAmount,
};

use crate::{
	merkle::TransferSet,
	types::{
		ChannelSide,
		CoreChannelState,
	},
};

/// The nonce the next update must carry.
pub fn next_nonce(current: Nonce) -> Nonce {
	current + 1
}

/// Position of an asset within the channel's parallel per-asset vectors.
pub fn asset_index(channel: &CoreChannelState, asset_id: AssetId) -> Option<usize> {
	channel.asset_ids.iter().position(|known| *known == asset_id)
}

/// The side a participant occupies, if any.
pub fn side_of(channel: &CoreChannelState, participant: Address) -> Option<ChannelSide> {
	if participant == channel.alice {
		Some(ChannelSide::Alice)
	} else if participant == channel.bob {
		Some(ChannelSide::Bob)
	} else {
		None
	}
}

/// The participant address occupying a side.
pub fn participant_of(channel: &CoreChannelState, side: ChannelSide) -> Address {
	match side {
		ChannelSide::Alice => channel.alice,
		ChannelSide::Bob => channel.bob,
	}
}

/// Total amount locked in active transfers of the given asset, `None` on
/// overflow.
pub fn locked_amount(active_transfers: &TransferSet, asset_id: AssetId) -> Option<TokenAmount> {
	let mut total = TokenAmount::zero();
	for transfer in active_transfers.transfers() {
		if transfer.core.asset_id == asset_id {
			total = total.checked_add(transfer.core.balance.total()?)?;
		}
	}
	Some(total)
}

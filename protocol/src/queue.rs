#![warn(clippy::missing_docs_in_private_items)]

use std::{
	collections::HashMap,
	sync::Arc,
};

use conduit_primitives::types::ChannelAddress;
use parking_lot::Mutex;
use tokio::sync::{
	Mutex as AsyncMutex,
	OwnedMutexGuard,
};

/// Per-channel mutual exclusion.
///
/// At most one update may be in flight per channel from this replica;
/// operations on different channels proceed independently.
#[derive(Default)]
pub struct ChannelLocks {
	inner: Mutex<HashMap<ChannelAddress, Arc<AsyncMutex<()>>>>,
}

impl ChannelLocks {
	pub fn new() -> Self {
		Self { inner: Mutex::new(HashMap::new()) }
	}

	/// Acquire the channel's lock, creating it on first use. The guard is
	/// held across every suspension point of the operation.
	pub async fn acquire(&self, channel_address: ChannelAddress) -> OwnedMutexGuard<()> {
		let lock = {
			let mut locks = self.inner.lock();
			locks
				.entry(channel_address)
				.or_insert_with(|| Arc::new(AsyncMutex::new(())))
				.clone()
		};
		lock.lock_owned().await
	}
}

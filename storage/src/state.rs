use std::sync::Mutex;

use async_trait::async_trait;
use conduit_primitives::types::{
	ChannelAddress,
	Nonce,
	TransferId,
};
use conduit_state_machine::types::{
	ChannelUpdate,
	FullChannelState,
	FullTransferState,
};
use rusqlite::{
	params,
	Connection,
};

use crate::{
	errors::StorageError,
	sqlite,
	Result,
	Store,
	TransferChange,
};

/// Sqlite-backed store. A single connection guarded by a mutex serializes
/// all writes, which satisfies the exclusive-writer contract per channel.
pub struct SqliteStorage {
	conn: Mutex<Connection>,
}

impl SqliteStorage {
	pub fn new(conn: Connection) -> Self {
		Self { conn: Mutex::new(conn) }
	}

	pub fn setup_database(&self) -> Result<()> {
		let setup_db_sql = format!(
			"
			PRAGMA foreign_keys=off;
			BEGIN TRANSACTION;
			{}{}{}
			COMMIT;
			PRAGMA foreign_keys=on;
			",
			sqlite::DB_CREATE_CHANNEL_STATES,
			sqlite::DB_CREATE_ACTIVE_TRANSFERS,
			sqlite::DB_CREATE_CHANNEL_UPDATES,
		);
		self.conn
			.lock()
			.map_err(|_| StorageError::CannotLock)?
			.execute_batch(&setup_db_sql)
			.map_err(StorageError::Sql)?;

		Ok(())
	}

	/// Canonical key form of an address.
	fn address_key(channel_address: ChannelAddress) -> String {
		format!("{:#x}", channel_address)
	}

	/// Canonical key form of a transfer identifier.
	fn transfer_key(transfer_id: TransferId) -> String {
		format!("{:#x}", transfer_id)
	}
}

#[async_trait]
impl Store for SqliteStorage {
	async fn get_channel_state(
		&self,
		channel_address: ChannelAddress,
	) -> Result<Option<FullChannelState>> {
		let conn = self.conn.lock().map_err(|_| StorageError::CannotLock)?;
		let mut stmt = conn
			.prepare("SELECT data FROM channel_states WHERE channel_address = ?1")
			.map_err(StorageError::Sql)?;
		let mut rows = stmt
			.query(params![Self::address_key(channel_address)])
			.map_err(StorageError::Sql)?;

		match rows.next().map_err(StorageError::Sql)? {
			Some(row) => {
				let data: String = row.get(0).map_err(StorageError::Cast)?;
				let state =
					serde_json::from_str(&data).map_err(StorageError::SerializationError)?;
				Ok(Some(state))
			},
			None => Ok(None),
		}
	}

	async fn get_active_transfers(
		&self,
		channel_address: ChannelAddress,
	) -> Result<Vec<FullTransferState>> {
		let conn = self.conn.lock().map_err(|_| StorageError::CannotLock)?;
		let mut stmt = conn
			.prepare(
				"SELECT data FROM active_transfers WHERE channel_address = ?1 \
				 ORDER BY transfer_id",
			)
			.map_err(StorageError::Sql)?;
		let mut rows = stmt
			.query(params![Self::address_key(channel_address)])
			.map_err(StorageError::Sql)?;

		let mut transfers = vec![];
		while let Some(row) = rows.next().map_err(StorageError::Sql)? {
			let data: String = row.get(0).map_err(StorageError::Cast)?;
			let transfer =
				serde_json::from_str(&data).map_err(StorageError::SerializationError)?;
			transfers.push(transfer);
		}
		Ok(transfers)
	}

	async fn get_update_by_nonce(
		&self,
		channel_address: ChannelAddress,
		nonce: Nonce,
	) -> Result<Option<ChannelUpdate>> {
		let conn = self.conn.lock().map_err(|_| StorageError::CannotLock)?;
		let mut stmt = conn
			.prepare("SELECT data FROM channel_updates WHERE channel_address = ?1 AND nonce = ?2")
			.map_err(StorageError::Sql)?;
		let mut rows = stmt
			.query(params![Self::address_key(channel_address), nonce as i64])
			.map_err(StorageError::Sql)?;

		match rows.next().map_err(StorageError::Sql)? {
			Some(row) => {
				let data: String = row.get(0).map_err(StorageError::Cast)?;
				let update =
					serde_json::from_str(&data).map_err(StorageError::SerializationError)?;
				Ok(Some(update))
			},
			None => Ok(None),
		}
	}

	async fn save_channel_state(
		&self,
		state: FullChannelState,
		transfer_change: Option<TransferChange>,
	) -> Result<()> {
		let mut conn = self.conn.lock().map_err(|_| StorageError::CannotLock)?;
		let tx = conn.transaction().map_err(StorageError::Sql)?;

		let address = Self::address_key(state.core.channel_address);
		let data = serde_json::to_string(&state).map_err(StorageError::SerializationError)?;
		tx.execute(
			"INSERT INTO channel_states(channel_address, nonce, data) VALUES(?1, ?2, ?3) \
			 ON CONFLICT(channel_address) DO UPDATE SET nonce = ?2, data = ?3",
			params![address, state.core.nonce as i64, data],
		)
		.map_err(StorageError::Sql)?;

		if let Some(latest) = &state.latest_update {
			let update_data =
				serde_json::to_string(latest).map_err(StorageError::SerializationError)?;
			tx.execute(
				"INSERT OR REPLACE INTO channel_updates(channel_address, nonce, data) \
				 VALUES(?1, ?2, ?3)",
				params![address, latest.nonce as i64, update_data],
			)
			.map_err(StorageError::Sql)?;
		}

		match transfer_change {
			Some(TransferChange::Created(transfer)) => {
				let transfer_data =
					serde_json::to_string(&transfer).map_err(StorageError::SerializationError)?;
				tx.execute(
					"INSERT OR REPLACE INTO active_transfers(transfer_id, channel_address, data) \
					 VALUES(?1, ?2, ?3)",
					params![Self::transfer_key(transfer.core.transfer_id), address, transfer_data],
				)
				.map_err(StorageError::Sql)?;
			},
			Some(TransferChange::Resolved(transfer_id)) => {
				tx.execute(
					"DELETE FROM active_transfers WHERE transfer_id = ?1",
					params![Self::transfer_key(transfer_id)],
				)
				.map_err(StorageError::Sql)?;
			},
			None => {},
		}

		tx.commit().map_err(StorageError::Sql)
	}
}

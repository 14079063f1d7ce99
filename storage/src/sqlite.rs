#![warn(clippy::missing_docs_in_private_items)]

pub const DB_CREATE_CHANNEL_STATES: &str = "
CREATE TABLE IF NOT EXISTS channel_states (
	channel_address TEXT PRIMARY KEY,
	nonce INTEGER NOT NULL,
	data TEXT NOT NULL
);
";

pub const DB_CREATE_ACTIVE_TRANSFERS: &str = "
CREATE TABLE IF NOT EXISTS active_transfers (
	transfer_id TEXT PRIMARY KEY,
	channel_address TEXT NOT NULL,
	data TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_active_transfers_channel
	ON active_transfers(channel_address);
";

pub const DB_CREATE_CHANNEL_UPDATES: &str = "
CREATE TABLE IF NOT EXISTS channel_updates (
	channel_address TEXT NOT NULL,
	nonce INTEGER NOT NULL,
	data TEXT NOT NULL,
	PRIMARY KEY (channel_address, nonce)
);
";

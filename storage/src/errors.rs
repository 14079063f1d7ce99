use derive_more::Display;

#[derive(Display, Debug)]
pub enum StorageError {
	#[display(fmt = "Storage lock poisoned")]
	CannotLock,
	#[display(fmt = "Cannot serialize for storage {}", _0)]
	SerializationError(serde_json::Error),
	#[display(fmt = "SQL Error: {}", _0)]
	Sql(rusqlite::Error),
	#[display(fmt = "Cannot map item from storage: {}", _0)]
	Cast(rusqlite::Error),
	#[display(fmt = "Error: {}", _0)]
	Other(&'static str),
}

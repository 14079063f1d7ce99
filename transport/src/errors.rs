use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
	#[error("Timed out waiting for the counterparty's reply")]
	Timeout,
	#[error("Counterparty endpoint is gone")]
	Closed,
	#[error("Undecodable payload: `{0}`")]
	Decode(String),
}

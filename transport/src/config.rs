use std::time::Duration;

/// Messaging configuration.
#[derive(Clone, Debug)]
pub struct MessagingConfig {
	/// How long a sender waits for the counterparty's reply before the
	/// request surfaces as a retriable counterparty failure.
	pub reply_timeout: Duration,
}

impl Default for MessagingConfig {
	fn default() -> Self {
		Self { reply_timeout: Duration::from_secs(10) }
	}
}

#![warn(clippy::missing_docs_in_private_items)]

use async_trait::async_trait;
use conduit_state_machine::types::ChannelUpdate;
use tokio::{
	sync::{
		mpsc,
		oneshot,
	},
	time::timeout,
};
use ulid::Ulid;

use crate::{
	config::MessagingConfig,
	errors::TransportError,
	messages::{
		ProtocolReply,
		ProtocolRequest,
	},
	Messaging,
};

/// Capacity of each direction's request queue. The protocol is lock-step
/// per channel, so the queue only buffers across channels.
const QUEUE_SIZE: usize = 16;

/// A request in flight together with its reply slot.
struct Envelope {
	request: ProtocolRequest,
	reply_tx: oneshot::Sender<ProtocolReply>,
}

/// The sending half of an in-process transport link.
pub struct LocalEndpoint {
	config: MessagingConfig,
	outbox: mpsc::Sender<Envelope>,
}

/// The serving half: requests delivered by the counterparty's endpoint.
pub struct LocalInbox {
	inbox: mpsc::Receiver<Envelope>,
}

/// A received request. The serving side answers through [`respond`].
///
/// [`respond`]: IncomingRequest::respond
pub struct IncomingRequest {
	request: ProtocolRequest,
	reply_tx: oneshot::Sender<ProtocolReply>,
}

impl IncomingRequest {
	/// The delivered request.
	pub fn request(&self) -> &ProtocolRequest {
		&self.request
	}

	/// Send the reply back to the waiting sender.
	pub fn respond(self, mut reply: ProtocolReply) {
		// Correlate the reply with the request it answers.
		match &mut reply {
			ProtocolReply::Response(response) =>
				response.request_id = self.request.request_id.clone(),
			ProtocolReply::Error(error) => error.request_id = self.request.request_id.clone(),
		}
		// The sender may have timed out already.
		let _ = self.reply_tx.send(reply);
	}
}

impl LocalInbox {
	/// Wait for the next request; `None` once the counterparty endpoint is
	/// dropped.
	pub async fn recv(&mut self) -> Option<IncomingRequest> {
		let envelope = self.inbox.recv().await?;
		Some(IncomingRequest { request: envelope.request, reply_tx: envelope.reply_tx })
	}
}

/// A connected pair of full-duplex links between two participants.
pub fn pair(
	config: MessagingConfig,
) -> ((LocalEndpoint, LocalInbox), (LocalEndpoint, LocalInbox)) {
	let (first_tx, first_rx) = mpsc::channel(QUEUE_SIZE);
	let (second_tx, second_rx) = mpsc::channel(QUEUE_SIZE);

	(
		(LocalEndpoint { config: config.clone(), outbox: first_tx }, LocalInbox { inbox: second_rx }),
		(LocalEndpoint { config, outbox: second_tx }, LocalInbox { inbox: first_rx }),
	)
}

#[async_trait]
impl Messaging for LocalEndpoint {
	async fn send_protocol_message(
		&self,
		update: ChannelUpdate,
		previous_update: Option<ChannelUpdate>,
	) -> Result<ProtocolReply, TransportError> {
		let (reply_tx, reply_rx) = oneshot::channel();
		let request =
			ProtocolRequest { request_id: Ulid::new().to_string(), update, previous_update };

		self.outbox
			.send(Envelope { request, reply_tx })
			.await
			.map_err(|_| TransportError::Closed)?;

		match timeout(self.config.reply_timeout, reply_rx).await {
			Ok(Ok(reply)) => Ok(reply),
			Ok(Err(_)) => Err(TransportError::Closed),
			Err(_) => Err(TransportError::Timeout),
		}
	}
}

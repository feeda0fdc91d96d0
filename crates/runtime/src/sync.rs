//! Cross-context broadcast of lifecycle transitions.
//!
//! Contexts sharing one session id share one logical channel. Delivery is
//! best-effort at-most-once: lagged receivers drop messages rather than
//! block, and every context's own countdown stays authoritative for its own
//! expiry regardless of sync traffic.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use sessionkit_protocol::{SyncEnvelope, SyncMessage};
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

/// Depth of each per-session channel; a lagged receiver drops the oldest
/// messages, which the convergence model tolerates.
const CHANNEL_CAPACITY: usize = 16;

static NEXT_SENDER_TAG: AtomicU64 = AtomicU64::new(1);

/// Registry of per-session broadcast channels.
///
/// One hub per process; every manager created from it for the same session
/// id shares one channel. A real cross-context deployment substitutes its
/// own transport behind the same manager surface.
#[derive(Default)]
pub struct SyncHub {
	channels: Mutex<HashMap<String, broadcast::Sender<SyncEnvelope>>>,
}

impl SyncHub {
	/// Creates an empty hub.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns a manager attached to the channel for `session_id`.
	pub fn attach(&self, session_id: &str) -> TabSyncManager {
		let sender = {
			let mut channels = self.channels.lock();
			channels
				.entry(session_id.to_string())
				.or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
				.clone()
		};

		let tag = NEXT_SENDER_TAG.fetch_add(1, Ordering::Relaxed);
		debug!(target = "sessionkit.sync", session_id, sender_tag = tag, "attached to sync channel");
		TabSyncManager {
			session_id: session_id.to_string(),
			sender_tag: tag,
			sender,
		}
	}

	/// Drops the channel for `session_id` once no context needs it.
	pub fn release(&self, session_id: &str) {
		let mut channels = self.channels.lock();
		if let Some(sender) = channels.get(session_id)
			&& sender.receiver_count() == 0
		{
			channels.remove(session_id);
			debug!(target = "sessionkit.sync", session_id, "sync channel released");
		}
	}
}

/// One context's handle on the session-scoped sync channel.
pub struct TabSyncManager {
	session_id: String,
	sender_tag: u64,
	sender: broadcast::Sender<SyncEnvelope>,
}

impl TabSyncManager {
	/// Broadcasts a lifecycle transition to sibling contexts.
	///
	/// A send with no subscribed sibling is not an error; the message simply
	/// has no audience.
	pub fn broadcast(&self, message: SyncMessage) {
		let envelope = SyncEnvelope {
			sender: self.sender_tag,
			message,
		};
		match self.sender.send(envelope) {
			Ok(receivers) => trace!(
				target = "sessionkit.sync",
				session_id = %self.session_id,
				receivers,
				"broadcast delivered"
			),
			Err(_) => debug!(
				target = "sessionkit.sync",
				session_id = %self.session_id,
				"broadcast had no receivers"
			),
		}
	}

	/// Subscribes to sibling messages; the receiver filters out this
	/// manager's own broadcasts.
	pub fn subscribe(&self) -> SyncReceiver {
		SyncReceiver {
			session_id: self.session_id.clone(),
			own_tag: self.sender_tag,
			receiver: self.sender.subscribe(),
		}
	}

	/// Session id this manager is scoped to.
	pub fn session_id(&self) -> &str {
		&self.session_id
	}
}

/// Receiving side of the sync channel, with echo filtering.
pub struct SyncReceiver {
	session_id: String,
	own_tag: u64,
	receiver: broadcast::Receiver<SyncEnvelope>,
}

impl SyncReceiver {
	/// Waits for the next sibling message.
	///
	/// Returns `None` once every sender for the channel is gone. A lag is
	/// logged and skipped; missed messages are tolerated by design.
	pub async fn recv(&mut self) -> Option<SyncMessage> {
		loop {
			match self.receiver.recv().await {
				Ok(envelope) if envelope.sender == self.own_tag => continue,
				Ok(envelope) => return Some(envelope.message),
				Err(broadcast::error::RecvError::Lagged(missed)) => {
					warn!(
						target = "sessionkit.sync",
						session_id = %self.session_id,
						missed,
						"sync receiver lagged; messages dropped"
					);
				}
				Err(broadcast::error::RecvError::Closed) => return None,
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn siblings_receive_each_others_messages() {
		let hub = SyncHub::new();
		let a = hub.attach("sess-1");
		let b = hub.attach("sess-1");
		let mut b_rx = b.subscribe();

		a.broadcast(SyncMessage::Extend { new_expires_at: 42 });
		assert_eq!(b_rx.recv().await, Some(SyncMessage::Extend { new_expires_at: 42 }));
	}

	#[tokio::test]
	async fn own_broadcasts_are_filtered() {
		let hub = SyncHub::new();
		let a = hub.attach("sess-1");
		let b = hub.attach("sess-1");
		let mut a_rx = a.subscribe();

		a.broadcast(SyncMessage::End);
		b.broadcast(SyncMessage::Extend { new_expires_at: 7 });

		// Own `End` is skipped; the sibling's message is the first delivery.
		assert_eq!(a_rx.recv().await, Some(SyncMessage::Extend { new_expires_at: 7 }));
	}

	#[tokio::test]
	async fn channels_are_scoped_by_session_id() {
		let hub = SyncHub::new();
		let a = hub.attach("sess-1");
		let other = hub.attach("sess-2");
		let mut other_rx = other.subscribe();

		a.broadcast(SyncMessage::End);
		drop(a);
		drop(other);
		drop(hub);

		// The sess-2 channel never saw the sess-1 broadcast; with every
		// sender dropped the receiver reports closure, not a message.
		assert_eq!(other_rx.recv().await, None);
	}

	#[tokio::test]
	async fn broadcast_without_receivers_is_a_noop() {
		let hub = SyncHub::new();
		let a = hub.attach("sess-1");
		a.broadcast(SyncMessage::End);
	}
}

//! Cross-context sync messages as they appear on the shared channel.

use serde::{Deserialize, Serialize};

/// Lifecycle transition broadcast between contexts sharing one session.
///
/// Delivery is best-effort and at-most-once; receivers treat these as
/// advisory convergence signals, never as the source of truth for their own
/// expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SyncMessage {
	/// Another context extended the session; carries the backend-confirmed
	/// absolute expiry in epoch seconds.
	Extend { new_expires_at: i64 },
	/// Another context ended the session.
	End,
}

/// Envelope pairing a message with the sender tag used to filter echoes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncEnvelope {
	/// Unique per-manager tag; a context ignores envelopes carrying its own.
	pub sender: u64,
	/// The broadcast payload.
	pub message: SyncMessage,
}

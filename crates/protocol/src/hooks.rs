//! Context payloads handed to host-supplied lifecycle hooks.
//!
//! One struct per hook, passed by value and never mutated after
//! construction.

use serde::{Deserialize, Serialize};

use crate::state::EndReason;

/// Recognized lifecycle hook names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookName {
	SessionStart,
	SessionEnd,
	SessionExtend,
	SessionWarning,
}

impl std::fmt::Display for HookName {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let name = match self {
			Self::SessionStart => "on_session_start",
			Self::SessionEnd => "on_session_end",
			Self::SessionExtend => "on_session_extend",
			Self::SessionWarning => "on_session_warning",
		};
		f.write_str(name)
	}
}

/// Payload for `on_session_start`, the one strict hook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStartContext {
	pub session_id: String,
	pub user_id: String,
	pub email: Option<String>,
	pub organization_id: String,
	pub application_id: String,
	pub duration_minutes: u64,
	pub expires_at: i64,
	/// The original signed token, for hosts that forward it onward.
	pub token: String,
}

/// Payload for `on_session_end`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEndContext {
	pub session_id: String,
	pub user_id: String,
	pub reason: EndReason,
	/// Whole minutes the session was managed for, when known.
	pub actual_duration_minutes: Option<u64>,
}

/// Payload for `on_session_extend`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionExtendContext {
	pub session_id: String,
	pub user_id: String,
	pub additional_minutes: u64,
	/// Backend-confirmed absolute expiry, epoch seconds.
	pub new_expires_at: i64,
}

/// Payload for `on_session_warning`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionWarningContext {
	pub session_id: String,
	pub user_id: String,
	pub remaining_seconds: u64,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn hook_names_render_snake_case() {
		assert_eq!(HookName::SessionStart.to_string(), "on_session_start");
		assert_eq!(HookName::SessionWarning.to_string(), "on_session_warning");
	}

	#[test]
	fn end_context_carries_reason() {
		let ctx = SessionEndContext {
			session_id: "s".into(),
			user_id: "u".into(),
			reason: EndReason::Expired,
			actual_duration_minutes: Some(42),
		};
		let json = serde_json::to_value(&ctx).unwrap();
		assert_eq!(json["reason"], "expired");
		assert_eq!(json["actual_duration_minutes"], 42);
	}
}

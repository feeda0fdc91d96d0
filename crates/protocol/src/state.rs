//! Lifecycle phases and the runtime state snapshot owned by the orchestrator.

use serde::{Deserialize, Serialize};

use crate::claims::SessionClaims;

/// Phase of the session state machine.
///
/// `Ended` and `Failed` are terminal; the warning condition is a flag on the
/// runtime state, not a phase of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecyclePhase {
	Uninitialized,
	Validating,
	Active,
	Ending,
	Ended,
	Failed,
}

impl LifecyclePhase {
	/// Returns `true` for phases that accept no further transitions.
	pub fn is_terminal(self) -> bool {
		matches!(self, Self::Ended | Self::Failed)
	}
}

impl std::fmt::Display for LifecyclePhase {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let name = match self {
			Self::Uninitialized => "uninitialized",
			Self::Validating => "validating",
			Self::Active => "active",
			Self::Ending => "ending",
			Self::Ended => "ended",
			Self::Failed => "failed",
		};
		f.write_str(name)
	}
}

/// Why a session reached a terminal phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
	Expired,
	Manual,
	Error,
}

impl std::fmt::Display for EndReason {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let name = match self {
			Self::Expired => "expired",
			Self::Manual => "manual",
			Self::Error => "error",
		};
		f.write_str(name)
	}
}

/// Mutable session state, owned exclusively by the orchestrator.
///
/// Leaf units never touch this directly; they emit events the orchestrator
/// interprets. Snapshots of it are handed to the host application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRuntimeState {
	/// Verified claims the session was started from.
	pub claims: SessionClaims,
	/// Epoch seconds the orchestrator began managing the session.
	///
	/// May differ from `claims.issued_at` when the token was minted earlier
	/// and handed off.
	pub started_at: i64,
	/// Current phase of the state machine.
	pub phase: LifecyclePhase,
	/// Terminal reason; meaningful only once the phase is terminal.
	pub end_reason: Option<EndReason>,
	/// Whether the one-per-session warning has already been issued.
	pub warning_issued: bool,
}

impl SessionRuntimeState {
	/// Creates the state for a freshly verified session.
	pub fn new(claims: SessionClaims, started_at: i64) -> Self {
		Self {
			claims,
			started_at,
			phase: LifecyclePhase::Validating,
			end_reason: None,
			warning_issued: false,
		}
	}

	/// Whole minutes the session was actually managed for, once terminal.
	pub fn actual_duration_minutes(&self, now: i64) -> Option<u64> {
		let elapsed = now.checked_sub(self.started_at)?;
		if elapsed < 0 {
			return None;
		}
		Some((elapsed / 60) as u64)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::claims::RawClaims;

	fn claims() -> SessionClaims {
		SessionClaims::try_from(RawClaims {
			sid: "sess-1".into(),
			sub: "user-1".into(),
			org: "org-1".into(),
			app: "app-1".into(),
			dur: 30,
			iat: 100,
			exp: 1_900,
			email: None,
		})
		.unwrap()
	}

	#[test]
	fn only_ended_and_failed_are_terminal() {
		assert!(LifecyclePhase::Ended.is_terminal());
		assert!(LifecyclePhase::Failed.is_terminal());
		assert!(!LifecyclePhase::Active.is_terminal());
		assert!(!LifecyclePhase::Ending.is_terminal());
	}

	#[test]
	fn fresh_state_starts_validating() {
		let state = SessionRuntimeState::new(claims(), 120);
		assert_eq!(state.phase, LifecyclePhase::Validating);
		assert!(state.end_reason.is_none());
		assert!(!state.warning_issued);
	}

	#[test]
	fn actual_duration_rounds_down_to_minutes() {
		let state = SessionRuntimeState::new(claims(), 100);
		assert_eq!(state.actual_duration_minutes(100 + 119), Some(1));
		assert_eq!(state.actual_duration_minutes(100 + 59), Some(0));
	}

	#[test]
	fn phase_serializes_snake_case() {
		let json = serde_json::to_string(&LifecyclePhase::Uninitialized).unwrap();
		assert_eq!(json, r#""uninitialized""#);
	}
}

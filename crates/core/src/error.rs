//! Error taxonomy for the session lifecycle engine.

use sessionkit_protocol::LifecyclePhase;
use sessionkit_runtime::HookFailure;
use thiserror::Error;

/// Failures surfaced by the engine's public API.
///
/// Verification failures and strict-hook failures are fatal to
/// `initialize()`; lenient-hook failures never reach this type — they are
/// logged at the executor boundary.
#[derive(Debug, Error)]
pub enum SessionError {
	/// Bad signature or malformed payload.
	#[error("token invalid: {0}")]
	TokenInvalid(String),

	/// Valid signature, expiry already in the past.
	#[error("token expired")]
	TokenExpired,

	/// Signing key set could not be fetched.
	#[error("key set unavailable: {0}")]
	KeySetUnavailable(String),

	/// A strict hook timed out or failed, aborting its transition.
	#[error(transparent)]
	Hook(#[from] HookFailure),

	/// Backend declined the requested extension; the session keeps its
	/// prior expiry.
	#[error("extension rejected: {0}")]
	ExtensionRejected(String),

	/// Extension requests must ask for at least one minute.
	#[error("additional minutes must be greater than zero")]
	InvalidExtension,

	/// Operation invoked outside the `Active` phase.
	#[error("session not active (phase: {0})")]
	SessionNotActive(LifecyclePhase),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, SessionError>;

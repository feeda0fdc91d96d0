//! Client-resident session lifecycle engine.
//!
//! One [`SessionOrchestrator`] per embedding context owns the session state
//! machine and wires together the leaf units from `sessionkit-runtime`:
//! countdown timer, heartbeat, tab sync, and hook execution. Cryptographic
//! verification, the warning UI, and the backend are external collaborators
//! reached through the traits in [`verifier`], [`presenter`], and
//! [`backend`].

/// Backend collaborator contract and default HTTP client.
pub mod backend;
/// Wall-clock helpers.
pub mod clock;
/// Engine configuration and hook registration.
pub mod config;
/// Error taxonomy and crate-wide `Result`.
pub mod error;
/// Session state machine root.
pub mod orchestrator;
/// Warning/ending UI collaborator contract.
pub mod presenter;
/// Token verification adapter over an external signature validator.
pub mod verifier;

pub use backend::{BackendClient, HttpBackendClient};
pub use config::{HookConfiguration, SessionConfig};
pub use error::{Result, SessionError};
pub use orchestrator::{OrchestratorOptions, SessionEvent, SessionOrchestrator};
pub use presenter::{NullPresenter, WarningPresenter};
pub use sessionkit_protocol::{
	EndReason, HookName, LifecyclePhase, RawClaims, SessionClaims, SessionEndContext,
	SessionExtendContext, SessionRuntimeState, SessionStartContext, SessionWarningContext,
	SyncMessage,
};
pub use sessionkit_runtime::{Hook, HookFailure, SyncHub};
pub use verifier::{HttpKeySetFetcher, KeySet, KeySetFetcher, SignatureValidator, TokenVerifier};

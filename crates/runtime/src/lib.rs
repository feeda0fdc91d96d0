//! Leaf units of the session lifecycle engine.
//!
//! Each unit here is owned and wired together by the orchestrator in the
//! `sessionkit` crate. None of them touch session state directly; they only
//! emit events or run callbacks handed to them.

/// Periodic liveness signal on its own interval.
pub mod heartbeat;
/// Deadline-raced execution of host lifecycle hooks.
pub mod hooks;
/// Cross-context broadcast of lifecycle transitions.
pub mod sync;
/// Single countdown with warning/expiry callbacks.
pub mod timer;

pub use heartbeat::{HeartbeatManager, HeartbeatTick};
pub use hooks::{FailurePolicy, Hook, HookExecutor, HookFailure};
pub use sync::{SyncHub, SyncReceiver, TabSyncManager};
pub use timer::{TimerCallbacks, TimerManager};

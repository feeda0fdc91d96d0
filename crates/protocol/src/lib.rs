//! Data types for the session lifecycle engine.
//!
//! This crate contains the serde-serializable types shared by the runtime
//! units and the orchestrator: verified claims, lifecycle phases, hook
//! contexts, and the cross-context sync messages as they appear on the wire.
//!
//! Types in this crate are pure data: no behavior beyond construction,
//! validation helpers, and serialization. The engine proper lives in
//! `sessionkit-runtime` and `sessionkit`.

pub mod claims;
pub mod hooks;
pub mod state;
pub mod sync;

pub use claims::*;
pub use hooks::*;
pub use state::*;
pub use sync::*;

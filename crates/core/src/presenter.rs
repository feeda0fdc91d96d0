//! Warning UI collaborator contract.
//!
//! The engine never renders anything itself; it calls these presentation
//! hooks and moves on. Presenter misbehavior cannot block a lifecycle
//! transition.

use std::time::Duration;

use async_trait::async_trait;

/// Presentation hooks for the expiry warning and ending message.
#[async_trait]
pub trait WarningPresenter: Send + Sync {
	/// Shows the expiry warning with the seconds left.
	async fn show_warning(&self, remaining_seconds: u64);

	/// Shows the session-ending message, lingering for `delay` before the
	/// host's redirect/cleanup continues.
	async fn show_ending_message(&self, delay: Duration);
}

/// Presenter that renders nothing; the default for headless hosts.
pub struct NullPresenter;

#[async_trait]
impl WarningPresenter for NullPresenter {
	async fn show_warning(&self, _remaining_seconds: u64) {}

	async fn show_ending_message(&self, _delay: Duration) {}
}

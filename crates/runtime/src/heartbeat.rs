//! Periodic liveness signal, independent of the countdown timer.
//!
//! A failed tick is a liveness-signal gap, not a correctness violation, so
//! tick failures are logged and the loop keeps going. Only `stop` (or drop)
//! terminates it.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, warn};

/// Async tick callback; typically a fire-and-forget backend ping.
pub type HeartbeatTick = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Emits a liveness tick on a fixed cadence.
#[derive(Default)]
pub struct HeartbeatManager {
	task: Mutex<Option<JoinHandle<()>>>,
}

impl HeartbeatManager {
	/// Creates a stopped heartbeat.
	pub fn new() -> Self {
		Self::default()
	}

	/// Starts ticking every `every`; replaces any previous loop.
	pub fn start(&self, every: Duration, on_tick: HeartbeatTick) {
		self.stop();

		let handle = tokio::spawn(async move {
			let mut ticker = interval(every);
			// The immediate first tick would double as a liveness ping before
			// the session has done anything; skip it.
			ticker.tick().await;

			loop {
				ticker.tick().await;
				match on_tick().await {
					Ok(()) => debug!(target = "sessionkit.heartbeat", "tick delivered"),
					Err(err) => warn!(
						target = "sessionkit.heartbeat",
						error = %err,
						"tick failed; heartbeat continues"
					),
				}
			}
		});

		*self.task.lock() = Some(handle);
	}

	/// Returns `true` while the tick loop is running.
	pub fn is_running(&self) -> bool {
		self.task.lock().as_ref().is_some_and(|handle| !handle.is_finished())
	}

	/// Stops the tick loop; idempotent.
	pub fn stop(&self) {
		if let Some(handle) = self.task.lock().take() {
			handle.abort();
		}
	}
}

impl Drop for HeartbeatManager {
	fn drop(&mut self) {
		self.stop();
	}
}

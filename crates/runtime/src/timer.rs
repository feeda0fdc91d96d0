//! Countdown timer driving the session's warning and expiry callbacks.
//!
//! Remaining time is always recomputed from a wall-clock deadline rather
//! than from tick counts, so a throttled or suspended tick loop cannot
//! drift the countdown. Warning and expiry each fire at most once per
//! session lifetime, regardless of pause/resume cycles.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval};
use tracing::{debug, trace};

/// Callbacks fired by the countdown task.
pub struct TimerCallbacks {
	/// Fired once when remaining time crosses the warning threshold.
	pub on_warning: Box<dyn Fn(u64) + Send + Sync>,
	/// Fired once when remaining time reaches zero.
	pub on_expire: Box<dyn Fn() + Send + Sync>,
}

struct TimerState {
	/// Absolute deadline while running; `None` while paused or stopped.
	deadline: Option<Instant>,
	/// Remaining time captured at pause, restored on resume.
	paused_remaining: Option<Duration>,
	warning_threshold: u64,
	warning_fired: bool,
	expired: bool,
}

impl TimerState {
	fn remaining(&self) -> Option<Duration> {
		if let Some(deadline) = self.deadline {
			return Some(deadline.saturating_duration_since(Instant::now()));
		}
		self.paused_remaining
	}
}

/// Drives a single countdown on a one-second cadence.
pub struct TimerManager {
	state: Arc<Mutex<TimerState>>,
	task: Mutex<Option<JoinHandle<()>>>,
}

impl Default for TimerManager {
	fn default() -> Self {
		Self::new()
	}
}

impl TimerManager {
	/// Creates a stopped timer.
	pub fn new() -> Self {
		Self {
			state: Arc::new(Mutex::new(TimerState {
				deadline: None,
				paused_remaining: None,
				warning_threshold: 0,
				warning_fired: false,
				expired: false,
			})),
			task: Mutex::new(None),
		}
	}

	/// Starts the countdown from `remaining_seconds`.
	///
	/// A threshold at or above the full remaining time suppresses the
	/// warning entirely; the session is already inside the warning window
	/// when it starts, and a warning that precedes the session is noise.
	pub fn start(&self, remaining_seconds: u64, warning_threshold: u64, callbacks: TimerCallbacks) {
		self.stop();

		{
			let mut state = self.state.lock();
			state.deadline = Some(Instant::now() + Duration::from_secs(remaining_seconds));
			state.paused_remaining = None;
			state.warning_threshold = warning_threshold;
			state.warning_fired = warning_threshold >= remaining_seconds;
			state.expired = false;

			if state.warning_fired {
				debug!(
					target = "sessionkit.timer",
					remaining_seconds,
					warning_threshold,
					"warning threshold covers whole countdown; warning suppressed"
				);
			}
		}

		let state = Arc::clone(&self.state);
		let handle = tokio::spawn(async move {
			let mut ticker = interval(Duration::from_secs(1));
			// Skip the interval's immediate first tick so the countdown is
			// observed on whole-second boundaries.
			ticker.tick().await;

			loop {
				ticker.tick().await;

				let fire = {
					let mut state = state.lock();
					let Some(remaining) = state.remaining() else {
						// Paused; the deadline is recomputed on resume.
						continue;
					};
					if state.deadline.is_none() {
						continue;
					}

					let remaining_seconds = remaining.as_secs();
					trace!(target = "sessionkit.timer", remaining_seconds, "tick");

					if remaining_seconds == 0 {
						if state.expired {
							return;
						}
						state.expired = true;
						state.deadline = None;
						TickAction::Expire
					} else if !state.warning_fired && remaining_seconds <= state.warning_threshold {
						state.warning_fired = true;
						TickAction::Warn(remaining_seconds)
					} else {
						TickAction::Nothing
					}
				};

				match fire {
					TickAction::Nothing => {}
					TickAction::Warn(remaining_seconds) => {
						debug!(target = "sessionkit.timer", remaining_seconds, "warning threshold crossed");
						(callbacks.on_warning)(remaining_seconds);
					}
					TickAction::Expire => {
						debug!(target = "sessionkit.timer", "countdown expired");
						(callbacks.on_expire)();
						return;
					}
				}
			}
		});

		*self.task.lock() = Some(handle);
	}

	/// Suspends the countdown, capturing the remaining time.
	pub fn pause(&self) {
		let mut state = self.state.lock();
		if let Some(deadline) = state.deadline.take() {
			let remaining = deadline.saturating_duration_since(Instant::now());
			state.paused_remaining = Some(remaining);
			debug!(
				target = "sessionkit.timer",
				remaining_seconds = remaining.as_secs(),
				"countdown paused"
			);
		}
	}

	/// Resumes a paused countdown from a freshly derived deadline.
	pub fn resume(&self) {
		let mut state = self.state.lock();
		if let Some(remaining) = state.paused_remaining.take() {
			state.deadline = Some(Instant::now() + remaining);
			debug!(
				target = "sessionkit.timer",
				remaining_seconds = remaining.as_secs(),
				"countdown resumed"
			);
		}
	}

	/// Moves the deadline to `remaining_seconds` from now.
	///
	/// Used when a session extension is confirmed; the warning latch is not
	/// re-armed, warning fires at most once per session.
	pub fn set_remaining(&self, remaining_seconds: u64) {
		let mut state = self.state.lock();
		if state.expired {
			return;
		}
		let remaining = Duration::from_secs(remaining_seconds);
		if state.deadline.is_some() {
			state.deadline = Some(Instant::now() + remaining);
		} else if state.paused_remaining.is_some() {
			state.paused_remaining = Some(remaining);
		}
	}

	/// Remaining whole seconds, if the countdown is running or paused.
	pub fn remaining_seconds(&self) -> Option<u64> {
		self.state.lock().remaining().map(|d| d.as_secs())
	}

	/// Stops the countdown; idempotent and safe after expiry.
	pub fn stop(&self) {
		if let Some(handle) = self.task.lock().take() {
			handle.abort();
		}
		let mut state = self.state.lock();
		state.deadline = None;
		state.paused_remaining = None;
	}
}

enum TickAction {
	Nothing,
	Warn(u64),
	Expire,
}

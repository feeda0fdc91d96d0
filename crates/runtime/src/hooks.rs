//! Deadline-raced execution of host-supplied lifecycle hooks.
//!
//! Every hook invocation races against a single configured deadline. What a
//! failure means is decided per call site: a strict site propagates it and
//! aborts the transition it gates; a lenient site logs it and proceeds as if
//! the hook had succeeded. The policy assignment lives with the caller so
//! the strict/lenient contract stays centrally auditable.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use sessionkit_protocol::HookName;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Host-supplied async lifecycle hook over a context payload `C`.
pub type Hook<C> = Arc<dyn Fn(C) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// What a hook failure does to the transition that triggered it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
	/// Failure propagates and aborts the in-progress transition.
	Strict,
	/// Failure is logged; the transition proceeds.
	Lenient,
}

/// Failure of a single hook invocation.
#[derive(Debug, Error)]
pub enum HookFailure {
	#[error("hook `{hook}` timed out after {timeout:?}")]
	Timeout { hook: HookName, timeout: Duration },
	#[error("hook `{hook}` failed: {message}")]
	Failed { hook: HookName, message: String },
}

/// Executes hooks under one uniform deadline.
#[derive(Debug, Clone, Copy)]
pub struct HookExecutor {
	deadline: Duration,
}

impl HookExecutor {
	/// Creates an executor applying `deadline` to every invocation.
	pub fn new(deadline: Duration) -> Self {
		Self { deadline }
	}

	/// Runs `hook` with `context` under the configured deadline and policy.
	///
	/// An absent hook is an immediate success. A hook that resolves after
	/// the deadline is dropped at the race; its late result cannot affect a
	/// transition that already completed.
	pub async fn execute<C>(
		&self,
		name: HookName,
		hook: Option<&Hook<C>>,
		context: C,
		policy: FailurePolicy,
	) -> Result<(), HookFailure> {
		let Some(hook) = hook else {
			return Ok(());
		};

		let outcome = match timeout(self.deadline, hook(context)).await {
			Ok(Ok(())) => {
				debug!(target = "sessionkit.hooks", hook = %name, "hook completed");
				return Ok(());
			}
			Ok(Err(err)) => HookFailure::Failed {
				hook: name,
				message: err.to_string(),
			},
			Err(_) => HookFailure::Timeout {
				hook: name,
				timeout: self.deadline,
			},
		};

		match policy {
			FailurePolicy::Strict => Err(outcome),
			FailurePolicy::Lenient => {
				warn!(
					target = "sessionkit.hooks",
					hook = %name,
					error = %outcome,
					"lenient hook failed; transition proceeds"
				);
				Ok(())
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicBool, Ordering};

	use tokio::time::{Instant, sleep};

	use super::*;

	fn succeeding() -> Hook<u32> {
		Arc::new(|_| Box::pin(async { Ok(()) }))
	}

	fn failing() -> Hook<u32> {
		Arc::new(|_| Box::pin(async { anyhow::bail!("host refused") }))
	}

	fn slow(delay: Duration) -> Hook<u32> {
		Arc::new(move |_| {
			Box::pin(async move {
				sleep(delay).await;
				Ok(())
			})
		})
	}

	#[tokio::test]
	async fn absent_hook_is_immediate_success() {
		let executor = HookExecutor::new(Duration::from_secs(5));
		let result = executor
			.execute(HookName::SessionStart, None::<&Hook<u32>>, 1, FailurePolicy::Strict)
			.await;
		assert!(result.is_ok());
	}

	#[tokio::test]
	async fn strict_failure_propagates() {
		let executor = HookExecutor::new(Duration::from_secs(5));
		let hook = failing();
		let err = executor
			.execute(HookName::SessionStart, Some(&hook), 1, FailurePolicy::Strict)
			.await
			.unwrap_err();
		assert!(matches!(err, HookFailure::Failed { hook: HookName::SessionStart, .. }));
	}

	#[tokio::test]
	async fn lenient_failure_is_swallowed() {
		let executor = HookExecutor::new(Duration::from_secs(5));
		let hook = failing();
		let result = executor
			.execute(HookName::SessionEnd, Some(&hook), 1, FailurePolicy::Lenient)
			.await;
		assert!(result.is_ok());
	}

	#[tokio::test(start_paused = true)]
	async fn strict_timeout_fires_at_the_deadline_not_hook_completion() {
		let executor = HookExecutor::new(Duration::from_secs(5));
		let hook = slow(Duration::from_secs(10));
		let started = Instant::now();
		let err = executor
			.execute(HookName::SessionStart, Some(&hook), 1, FailurePolicy::Strict)
			.await
			.unwrap_err();
		assert!(matches!(err, HookFailure::Timeout { .. }));
		assert_eq!(started.elapsed(), Duration::from_secs(5));
	}

	#[tokio::test(start_paused = true)]
	async fn lenient_timeout_is_swallowed() {
		let executor = HookExecutor::new(Duration::from_millis(50));
		let hook = slow(Duration::from_secs(60));
		let result = executor
			.execute(HookName::SessionWarning, Some(&hook), 1, FailurePolicy::Lenient)
			.await;
		assert!(result.is_ok());
	}

	#[tokio::test]
	async fn successful_hook_sees_its_context() {
		let executor = HookExecutor::new(Duration::from_secs(5));
		let seen = Arc::new(AtomicBool::new(false));
		let flag = Arc::clone(&seen);
		let hook: Hook<u32> = Arc::new(move |value| {
			let flag = Arc::clone(&flag);
			Box::pin(async move {
				flag.store(value == 7, Ordering::SeqCst);
				Ok(())
			})
		});
		executor
			.execute(HookName::SessionExtend, Some(&hook), 7, FailurePolicy::Strict)
			.await
			.unwrap();
		assert!(seen.load(Ordering::SeqCst));
	}

	#[tokio::test]
	async fn ok_hook_returns_before_deadline() {
		let executor = HookExecutor::new(Duration::from_secs(5));
		let hook = succeeding();
		assert!(
			executor
				.execute(HookName::SessionEnd, Some(&hook), 1, FailurePolicy::Lenient)
				.await
				.is_ok()
		);
	}
}

//! Session orchestrator: owns the state machine and wires the leaf units.
//!
//! One orchestrator per embedding context. Leaf units (timer, heartbeat,
//! tab sync) deliver events over an internal signal channel; the
//! orchestrator is the only code that mutates [`SessionRuntimeState`].
//! Hooks for a transition always complete (or time out) before the state
//! mutation and broadcast they gate.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use sessionkit_protocol::{
	EndReason, HookName, LifecyclePhase, SessionEndContext, SessionExtendContext,
	SessionRuntimeState, SessionStartContext, SessionWarningContext, SyncMessage,
};
use sessionkit_runtime::heartbeat::HeartbeatTick;
use sessionkit_runtime::{
	FailurePolicy, HeartbeatManager, HookExecutor, SyncHub, TabSyncManager, TimerCallbacks,
	TimerManager,
};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::backend::BackendClient;
use crate::clock::now_ts;
use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::presenter::WarningPresenter;
use crate::verifier::{KeySetFetcher, SignatureValidator, TokenVerifier};

/// How long the ending message lingers before host cleanup continues.
const ENDING_MESSAGE_DELAY: Duration = Duration::from_millis(1500);

/// Fire-and-forget notifications for host subscribers.
///
/// Distinct from the gating hook contract: subscribers cannot block or
/// abort a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
	/// The warning threshold was crossed.
	Warning { remaining_seconds: u64 },
	/// The session reached its terminal phase.
	Ended { reason: EndReason },
}

/// Collaborators and configuration for one orchestrator.
pub struct OrchestratorOptions {
	/// Opaque signed token received at construction.
	pub token: String,
	/// Inbound host configuration.
	pub config: SessionConfig,
	/// Key-set retrieval collaborator.
	pub key_sets: Arc<dyn KeySetFetcher>,
	/// External signature validation collaborator.
	pub validator: Arc<dyn SignatureValidator>,
	/// Extension/heartbeat backend collaborator.
	pub backend: Arc<dyn BackendClient>,
	/// Warning UI collaborator.
	pub presenter: Arc<dyn WarningPresenter>,
	/// Hub for cross-context sync; `None` disables sync regardless of
	/// configuration.
	pub sync_hub: Option<Arc<SyncHub>>,
}

enum Signal {
	Warning(u64),
	Expired,
	Sync(SyncMessage),
}

enum EndTrigger {
	/// Local expiry or an explicit `end_session` call; broadcasts to
	/// siblings.
	Local,
	/// A sibling already broadcast the end; cleanup only, no re-broadcast.
	Sibling,
}

/// Root of the session lifecycle engine.
pub struct SessionOrchestrator {
	/// Self-reference handed to the spawned signal driver.
	weak: Weak<Self>,
	token: String,
	config: SessionConfig,
	verifier: TokenVerifier,
	backend: Arc<dyn BackendClient>,
	presenter: Arc<dyn WarningPresenter>,
	sync_hub: Option<Arc<SyncHub>>,
	executor: HookExecutor,
	timer: TimerManager,
	heartbeat: HeartbeatManager,
	sync: Mutex<Option<TabSyncManager>>,
	sync_task: Mutex<Option<JoinHandle<()>>>,
	phase: Mutex<LifecyclePhase>,
	state: Mutex<Option<SessionRuntimeState>>,
	signals: Mutex<Option<mpsc::UnboundedSender<Signal>>>,
	events: broadcast::Sender<SessionEvent>,
}

impl SessionOrchestrator {
	/// Creates an orchestrator from its collaborators.
	pub fn with_options(options: OrchestratorOptions) -> Arc<Self> {
		let executor = HookExecutor::new(options.config.hook_timeout);
		let verifier = TokenVerifier::new(
			options.config.key_set_uri.clone(),
			options.key_sets,
			options.validator,
		);
		let (events, _) = broadcast::channel(16);

		Arc::new_cyclic(|weak| Self {
			weak: weak.clone(),
			token: options.token,
			config: options.config,
			verifier,
			backend: options.backend,
			presenter: options.presenter,
			sync_hub: options.sync_hub,
			executor,
			timer: TimerManager::new(),
			heartbeat: HeartbeatManager::new(),
			sync: Mutex::new(None),
			sync_task: Mutex::new(None),
			phase: Mutex::new(LifecyclePhase::Uninitialized),
			state: Mutex::new(None),
			signals: Mutex::new(None),
			events,
		})
	}

	/// Current phase of the state machine.
	pub fn phase(&self) -> LifecyclePhase {
		*self.phase.lock()
	}

	/// Snapshot of the runtime state, once one exists.
	pub fn state(&self) -> Option<SessionRuntimeState> {
		self.state.lock().clone()
	}

	/// Subscribes to fire-and-forget lifecycle notifications.
	pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
		self.events.subscribe()
	}

	/// Verifies the token and activates the session.
	///
	/// On any failure the engine lands in `Failed` with no partial state:
	/// no timer, no heartbeat, no broadcast.
	pub async fn initialize(&self) -> Result<SessionRuntimeState> {
		{
			let mut phase = self.phase.lock();
			if *phase != LifecyclePhase::Uninitialized {
				return Err(SessionError::SessionNotActive(*phase));
			}
			*phase = LifecyclePhase::Validating;
		}

		let claims = match self.verifier.verify(&self.token).await {
			Ok(claims) => claims,
			Err(err) => {
				warn!(target = "sessionkit.session", error = %err, "token verification failed");
				*self.phase.lock() = LifecyclePhase::Failed;
				return Err(err);
			}
		};

		let started_at = now_ts();
		let start_ctx = SessionStartContext {
			session_id: claims.session_id.clone(),
			user_id: claims.user_id.clone(),
			email: claims.email.clone(),
			organization_id: claims.organization_id.clone(),
			application_id: claims.application_id.clone(),
			duration_minutes: claims.duration_minutes,
			expires_at: claims.expires_at,
			token: self.token.clone(),
		};

		// Strict: the host's own login step gates activation. A session
		// must not silently grant access when that step fails.
		if let Err(err) = self
			.executor
			.execute(
				HookName::SessionStart,
				self.config.hooks.on_session_start.as_ref(),
				start_ctx,
				FailurePolicy::Strict,
			)
			.await
		{
			warn!(target = "sessionkit.session", error = %err, "session start hook aborted activation");
			*self.phase.lock() = LifecyclePhase::Failed;
			return Err(err.into());
		}

		let mut state = SessionRuntimeState::new(claims.clone(), started_at);
		state.phase = LifecyclePhase::Active;
		let snapshot = state.clone();
		{
			let mut phase = self.phase.lock();
			*phase = LifecyclePhase::Active;
			*self.state.lock() = Some(state);
		}

		let (tx, rx) = mpsc::unbounded_channel();
		*self.signals.lock() = Some(tx.clone());

		let remaining = claims.expires_at.saturating_sub(started_at).max(0) as u64;
		let warn_tx = tx.clone();
		let expire_tx = tx.clone();
		self.timer.start(
			remaining,
			self.config.warning_threshold_seconds,
			TimerCallbacks {
				on_warning: Box::new(move |remaining_seconds| {
					let _ = warn_tx.send(Signal::Warning(remaining_seconds));
				}),
				on_expire: Box::new(move || {
					let _ = expire_tx.send(Signal::Expired);
				}),
			},
		);

		if self.config.enable_heartbeat {
			let backend = Arc::clone(&self.backend);
			let session_id = claims.session_id.clone();
			let tick: HeartbeatTick = Arc::new(move || {
				let backend = Arc::clone(&backend);
				let session_id = session_id.clone();
				Box::pin(async move { backend.heartbeat(&session_id).await })
			});
			self.heartbeat.start(self.config.heartbeat_interval, tick);
		}

		if self.config.enable_tab_sync
			&& let Some(hub) = self.sync_hub.as_ref()
		{
			let manager = hub.attach(&claims.session_id);
			let mut sync_rx = manager.subscribe();
			*self.sync.lock() = Some(manager);

			let forward_tx = tx.clone();
			let forward = tokio::spawn(async move {
				while let Some(message) = sync_rx.recv().await {
					if forward_tx.send(Signal::Sync(message)).is_err() {
						break;
					}
				}
			});
			*self.sync_task.lock() = Some(forward);
		}

		if let Some(this) = self.weak.upgrade() {
			tokio::spawn(async move {
				this.drive(rx).await;
			});
		}

		info!(
			target = "sessionkit.session",
			session_id = %claims.session_id,
			remaining_seconds = remaining,
			"session active"
		);
		Ok(snapshot)
	}

	/// Requests more time from the backend and applies the confirmed expiry.
	///
	/// The backend-confirmed absolute expiry is authoritative, never a
	/// client-computed sum; concurrent extensions from sibling contexts
	/// resolve at the backend.
	pub async fn extend_session(&self, additional_minutes: u64) -> Result<()> {
		if additional_minutes == 0 {
			return Err(SessionError::InvalidExtension);
		}

		let (session_id, user_id) = {
			let phase = self.phase.lock();
			if *phase != LifecyclePhase::Active {
				return Err(SessionError::SessionNotActive(*phase));
			}
			let state = self.state.lock();
			let Some(state) = state.as_ref() else {
				return Err(SessionError::SessionNotActive(*phase));
			};
			(state.claims.session_id.clone(), state.claims.user_id.clone())
		};

		let new_expires_at = self
			.backend
			.extend(&session_id, additional_minutes)
			.await
			.map_err(|err| {
				warn!(
					target = "sessionkit.session",
					session_id = %session_id,
					error = %err,
					"backend declined extension"
				);
				SessionError::ExtensionRejected(err.to_string())
			})?;

		let extend_ctx = SessionExtendContext {
			session_id: session_id.clone(),
			user_id,
			additional_minutes,
			new_expires_at,
		};
		let _ = self
			.executor
			.execute(
				HookName::SessionExtend,
				self.config.hooks.on_session_extend.as_ref(),
				extend_ctx,
				FailurePolicy::Lenient,
			)
			.await;

		let remaining = new_expires_at.saturating_sub(now_ts()).max(0) as u64;
		self.timer.set_remaining(remaining);
		if let Some(sync) = self.sync.lock().as_ref() {
			sync.broadcast(SyncMessage::Extend { new_expires_at });
		}

		info!(
			target = "sessionkit.session",
			session_id = %session_id,
			additional_minutes,
			new_expires_at,
			"session extended"
		);
		Ok(())
	}

	/// Ends the session; never fails, safe to call repeatedly.
	///
	/// Every teardown step is individually fault-isolated so one failing
	/// step cannot prevent the others from running.
	pub async fn end_session(&self) {
		self.finish(EndTrigger::Local).await;
	}

	/// Suspends the countdown while the embedding context is hidden.
	pub fn pause_timer(&self) {
		self.timer.pause();
	}

	/// Resumes the countdown from a wall-clock-derived deadline.
	pub fn resume_timer(&self) {
		self.timer.resume();
	}

	/// Remaining whole seconds on the countdown, while one is running.
	pub fn remaining_seconds(&self) -> Option<u64> {
		self.timer.remaining_seconds()
	}

	async fn drive(self: Arc<Self>, mut rx: mpsc::UnboundedReceiver<Signal>) {
		while let Some(signal) = rx.recv().await {
			match signal {
				Signal::Warning(remaining_seconds) => self.handle_warning(remaining_seconds).await,
				Signal::Expired => {
					self.handle_expiry().await;
					break;
				}
				Signal::Sync(SyncMessage::Extend { new_expires_at }) => {
					self.apply_sibling_extend(new_expires_at);
				}
				Signal::Sync(SyncMessage::End) => {
					self.finish(EndTrigger::Sibling).await;
					break;
				}
			}
		}
	}

	async fn handle_warning(&self, remaining_seconds: u64) {
		let warning_ctx = {
			let mut state = self.state.lock();
			let Some(state) = state.as_mut() else {
				return;
			};
			if state.phase != LifecyclePhase::Active {
				return;
			}
			state.warning_issued = true;
			SessionWarningContext {
				session_id: state.claims.session_id.clone(),
				user_id: state.claims.user_id.clone(),
				remaining_seconds,
			}
		};

		let _ = self
			.executor
			.execute(
				HookName::SessionWarning,
				self.config.hooks.on_session_warning.as_ref(),
				warning_ctx,
				FailurePolicy::Lenient,
			)
			.await;
		let _ = self.events.send(SessionEvent::Warning { remaining_seconds });
		self.presenter.show_warning(remaining_seconds).await;
	}

	async fn handle_expiry(&self) {
		{
			let mut state = self.state.lock();
			if let Some(state) = state.as_mut()
				&& state.end_reason.is_none()
			{
				state.end_reason = Some(EndReason::Expired);
			}
		}
		self.finish(EndTrigger::Local).await;
	}

	/// Applies a sibling's backend-confirmed expiry to the local countdown.
	/// The network-facing extend path is never re-entered here.
	fn apply_sibling_extend(&self, new_expires_at: i64) {
		if self.phase() != LifecyclePhase::Active {
			return;
		}
		let remaining = new_expires_at.saturating_sub(now_ts()).max(0) as u64;
		self.timer.set_remaining(remaining);
		debug!(
			target = "sessionkit.session",
			new_expires_at,
			remaining_seconds = remaining,
			"sibling extension applied"
		);
	}

	async fn finish(&self, trigger: EndTrigger) {
		let (end_ctx, reason) = {
			let mut phase = self.phase.lock();
			if phase.is_terminal() || *phase == LifecyclePhase::Ending {
				return;
			}
			let mut state = self.state.lock();
			let Some(state) = state.as_mut() else {
				// Never activated; nothing to tear down.
				*phase = LifecyclePhase::Ended;
				return;
			};
			*phase = LifecyclePhase::Ending;
			state.phase = LifecyclePhase::Ending;
			if state.end_reason.is_none() {
				state.end_reason = Some(EndReason::Manual);
			}
			let reason = state.end_reason.unwrap_or(EndReason::Manual);
			let end_ctx = SessionEndContext {
				session_id: state.claims.session_id.clone(),
				user_id: state.claims.user_id.clone(),
				reason,
				actual_duration_minutes: state.actual_duration_minutes(now_ts()),
			};
			(end_ctx, reason)
		};
		let session_id = end_ctx.session_id.clone();

		// Lenient: the session must always be able to terminate and release
		// resources even when the host's logout step fails.
		let _ = self
			.executor
			.execute(
				HookName::SessionEnd,
				self.config.hooks.on_session_end.as_ref(),
				end_ctx,
				FailurePolicy::Lenient,
			)
			.await;

		self.timer.stop();
		self.heartbeat.stop();

		if let Some(sync) = self.sync.lock().take() {
			if matches!(trigger, EndTrigger::Local) {
				sync.broadcast(SyncMessage::End);
			}
		}
		if let Some(task) = self.sync_task.lock().take() {
			task.abort();
		}
		if let Some(hub) = self.sync_hub.as_ref() {
			hub.release(&session_id);
		}
		self.signals.lock().take();

		{
			let mut phase = self.phase.lock();
			*phase = LifecyclePhase::Ended;
			if let Some(state) = self.state.lock().as_mut() {
				state.phase = LifecyclePhase::Ended;
			}
		}

		let _ = self.events.send(SessionEvent::Ended { reason });
		info!(
			target = "sessionkit.session",
			session_id = %session_id,
			%reason,
			"session ended"
		);
		self.presenter.show_ending_message(ENDING_MESSAGE_DELAY).await;
	}
}

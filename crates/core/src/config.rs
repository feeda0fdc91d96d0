//! Engine configuration supplied by the host application at construction.

use std::time::Duration;

use sessionkit_protocol::{
	SessionEndContext, SessionExtendContext, SessionStartContext, SessionWarningContext,
};
use sessionkit_runtime::Hook;

/// Default seconds-remaining threshold for the expiry warning.
pub const DEFAULT_WARNING_THRESHOLD_SECONDS: u64 = 300;
/// Default deadline applied uniformly to every hook invocation.
pub const DEFAULT_HOOK_TIMEOUT: Duration = Duration::from_secs(5);
/// Default heartbeat cadence when heartbeat is enabled.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(60);

/// Optional lifecycle hooks registered by the host.
///
/// All four are optional; the engine behaves identically whether zero or
/// four are supplied. The strict/lenient policy per hook is fixed by the
/// orchestrator, not configurable here.
#[derive(Clone, Default)]
pub struct HookConfiguration {
	/// Strict; gates activation.
	pub on_session_start: Option<Hook<SessionStartContext>>,
	/// Lenient; runs during teardown.
	pub on_session_end: Option<Hook<SessionEndContext>>,
	/// Lenient; runs on confirmed extension.
	pub on_session_extend: Option<Hook<SessionExtendContext>>,
	/// Lenient; runs when the warning threshold is crossed.
	pub on_session_warning: Option<Hook<SessionWarningContext>>,
}

impl HookConfiguration {
	/// Registers the strict session-start hook.
	pub fn with_on_session_start(mut self, hook: Hook<SessionStartContext>) -> Self {
		self.on_session_start = Some(hook);
		self
	}

	/// Registers the lenient session-end hook.
	pub fn with_on_session_end(mut self, hook: Hook<SessionEndContext>) -> Self {
		self.on_session_end = Some(hook);
		self
	}

	/// Registers the lenient session-extend hook.
	pub fn with_on_session_extend(mut self, hook: Hook<SessionExtendContext>) -> Self {
		self.on_session_extend = Some(hook);
		self
	}

	/// Registers the lenient session-warning hook.
	pub fn with_on_session_warning(mut self, hook: Hook<SessionWarningContext>) -> Self {
		self.on_session_warning = Some(hook);
		self
	}
}

impl std::fmt::Debug for HookConfiguration {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("HookConfiguration")
			.field("on_session_start", &self.on_session_start.is_some())
			.field("on_session_end", &self.on_session_end.is_some())
			.field("on_session_extend", &self.on_session_extend.is_some())
			.field("on_session_warning", &self.on_session_warning.is_some())
			.finish()
	}
}

/// Inbound configuration for one engine instance.
#[derive(Clone, Debug)]
pub struct SessionConfig {
	/// Endpoint serving the verifier's public key set.
	pub key_set_uri: String,
	/// Base URL for the extend/heartbeat backend.
	pub api_base_url: String,
	/// Seconds remaining at which the one-shot warning fires.
	pub warning_threshold_seconds: u64,
	/// Uniform deadline for every hook invocation.
	pub hook_timeout: Duration,
	/// Whether the heartbeat loop runs.
	pub enable_heartbeat: bool,
	/// Heartbeat cadence when enabled.
	pub heartbeat_interval: Duration,
	/// Whether lifecycle transitions are broadcast to sibling contexts.
	pub enable_tab_sync: bool,
	/// Whether the host intends to pause the countdown while hidden.
	pub pause_on_hidden: bool,
	/// Registered lifecycle hooks.
	pub hooks: HookConfiguration,
}

impl SessionConfig {
	/// Creates a configuration with default thresholds for the given endpoints.
	pub fn new(key_set_uri: impl Into<String>, api_base_url: impl Into<String>) -> Self {
		Self {
			key_set_uri: key_set_uri.into(),
			api_base_url: api_base_url.into(),
			warning_threshold_seconds: DEFAULT_WARNING_THRESHOLD_SECONDS,
			hook_timeout: DEFAULT_HOOK_TIMEOUT,
			enable_heartbeat: false,
			heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
			enable_tab_sync: false,
			pause_on_hidden: false,
			hooks: HookConfiguration::default(),
		}
	}

	/// Sets the warning threshold in seconds remaining.
	pub fn with_warning_threshold_seconds(mut self, seconds: u64) -> Self {
		self.warning_threshold_seconds = seconds;
		self
	}

	/// Sets the uniform hook deadline.
	pub fn with_hook_timeout(mut self, timeout: Duration) -> Self {
		self.hook_timeout = timeout;
		self
	}

	/// Enables the heartbeat loop at the given cadence.
	pub fn with_heartbeat(mut self, interval: Duration) -> Self {
		self.enable_heartbeat = true;
		self.heartbeat_interval = interval;
		self
	}

	/// Enables cross-context sync.
	pub fn with_tab_sync(mut self, enabled: bool) -> Self {
		self.enable_tab_sync = enabled;
		self
	}

	/// Declares that the host pauses the countdown while hidden.
	pub fn with_pause_on_hidden(mut self, enabled: bool) -> Self {
		self.pause_on_hidden = enabled;
		self
	}

	/// Sets the hook registration map.
	pub fn with_hooks(mut self, hooks: HookConfiguration) -> Self {
		self.hooks = hooks;
		self
	}
}

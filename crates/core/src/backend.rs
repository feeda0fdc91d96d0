//! Backend collaborator contract for extension and heartbeat.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Backend endpoints the engine calls, specified at the contract boundary.
#[async_trait]
pub trait BackendClient: Send + Sync {
	/// Requests `additional_minutes` more for the session and returns the
	/// backend-confirmed absolute expiry in epoch seconds.
	///
	/// The returned expiry is authoritative; concurrent extensions from
	/// sibling contexts are resolved by the backend, never the client.
	async fn extend(&self, session_id: &str, additional_minutes: u64) -> anyhow::Result<i64>;

	/// Fire-and-forget liveness ping keyed by session id.
	async fn heartbeat(&self, session_id: &str) -> anyhow::Result<()>;
}

#[derive(Serialize)]
struct ExtendRequest {
	additional_minutes: u64,
}

#[derive(Deserialize)]
struct ExtendResponse {
	expires_at: i64,
}

/// Default HTTP backend client.
pub struct HttpBackendClient {
	base_url: String,
	client: reqwest::Client,
}

impl HttpBackendClient {
	/// Creates a client for the given API base URL.
	pub fn new(base_url: impl Into<String>) -> Self {
		Self {
			base_url: base_url.into(),
			client: reqwest::Client::new(),
		}
	}
}

#[async_trait]
impl BackendClient for HttpBackendClient {
	async fn extend(&self, session_id: &str, additional_minutes: u64) -> anyhow::Result<i64> {
		let url = format!("{}/sessions/{}/extend", self.base_url, session_id);
		let response = self
			.client
			.post(&url)
			.json(&ExtendRequest { additional_minutes })
			.send()
			.await?
			.error_for_status()?;
		let body = response.json::<ExtendResponse>().await?;
		debug!(
			target = "sessionkit.backend",
			session_id,
			expires_at = body.expires_at,
			"extension confirmed"
		);
		Ok(body.expires_at)
	}

	async fn heartbeat(&self, session_id: &str) -> anyhow::Result<()> {
		let url = format!("{}/sessions/{}/heartbeat", self.base_url, session_id);
		self.client.post(&url).send().await?.error_for_status()?;
		Ok(())
	}
}

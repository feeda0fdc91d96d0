//! Token verification adapter.
//!
//! Cryptography stays outside the engine: the [`SignatureValidator`] trait
//! is the seam to the external signature library, and [`KeySetFetcher`]
//! retrieves its public keys. This module owns the process-lifetime key-set
//! cache, the expiry check, and the mapping from raw payload to
//! [`SessionClaims`].

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use sessionkit_protocol::{RawClaims, SessionClaims};
use tracing::{debug, warn};

use crate::clock::now_ts;
use crate::error::{Result, SessionError};

/// Opaque signing key set as served by the key-set endpoint.
#[derive(Debug, Clone)]
pub struct KeySet(pub serde_json::Value);

/// Retrieves the signing key set from a key-set URI.
#[async_trait]
pub trait KeySetFetcher: Send + Sync {
	/// Fetches the key set; failures map to `KeySetUnavailable`.
	async fn fetch(&self, uri: &str) -> anyhow::Result<KeySet>;
}

/// External signature validation library boundary.
#[async_trait]
pub trait SignatureValidator: Send + Sync {
	/// Checks the token's signature against `keys` and returns the raw
	/// payload; failures map to `TokenInvalid`.
	async fn check(&self, token: &str, keys: &KeySet) -> anyhow::Result<RawClaims>;
}

/// HTTP key-set fetcher; the response body is cached by [`TokenVerifier`]
/// for the process lifetime, so this fetches at most once per engine.
pub struct HttpKeySetFetcher {
	client: reqwest::Client,
}

impl Default for HttpKeySetFetcher {
	fn default() -> Self {
		Self::new()
	}
}

impl HttpKeySetFetcher {
	/// Creates a fetcher with a fresh HTTP client.
	pub fn new() -> Self {
		Self { client: reqwest::Client::new() }
	}
}

#[async_trait]
impl KeySetFetcher for HttpKeySetFetcher {
	async fn fetch(&self, uri: &str) -> anyhow::Result<KeySet> {
		let response = self.client.get(uri).send().await?.error_for_status()?;
		let body = response.json::<serde_json::Value>().await?;
		Ok(KeySet(body))
	}
}

/// Turns an opaque signed token into verified [`SessionClaims`].
pub struct TokenVerifier {
	key_set_uri: String,
	fetcher: Arc<dyn KeySetFetcher>,
	validator: Arc<dyn SignatureValidator>,
	cache: Mutex<Option<Arc<KeySet>>>,
}

impl TokenVerifier {
	/// Creates a verifier over the given collaborators.
	pub fn new(
		key_set_uri: impl Into<String>,
		fetcher: Arc<dyn KeySetFetcher>,
		validator: Arc<dyn SignatureValidator>,
	) -> Self {
		Self {
			key_set_uri: key_set_uri.into(),
			fetcher,
			validator,
			cache: Mutex::new(None),
		}
	}

	/// Verifies `token` and maps its payload into claims.
	pub async fn verify(&self, token: &str) -> Result<SessionClaims> {
		let keys = self.key_set().await?;

		let raw = self
			.validator
			.check(token, &keys)
			.await
			.map_err(|err| {
				warn!(target = "sessionkit.verifier", error = %err, "signature check failed");
				SessionError::TokenInvalid(err.to_string())
			})?;

		let claims = SessionClaims::try_from(raw)
			.map_err(|err| SessionError::TokenInvalid(err.to_string()))?;

		if claims.expires_at <= now_ts() {
			return Err(SessionError::TokenExpired);
		}

		debug!(
			target = "sessionkit.verifier",
			session_id = %claims.session_id,
			expires_at = claims.expires_at,
			"token verified"
		);
		Ok(claims)
	}

	async fn key_set(&self) -> Result<Arc<KeySet>> {
		if let Some(keys) = self.cache.lock().clone() {
			return Ok(keys);
		}

		let keys = self
			.fetcher
			.fetch(&self.key_set_uri)
			.await
			.map(Arc::new)
			.map_err(|err| SessionError::KeySetUnavailable(err.to_string()))?;

		*self.cache.lock() = Some(Arc::clone(&keys));
		debug!(target = "sessionkit.verifier", uri = %self.key_set_uri, "key set cached");
		Ok(keys)
	}
}

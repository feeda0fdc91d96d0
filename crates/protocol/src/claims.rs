//! Verified session claims and the raw token payload they are mapped from.

use serde::{Deserialize, Serialize};

/// Immutable claim set produced once by token verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
	/// Opaque identifier, unique per session.
	pub session_id: String,
	/// Subject the session was granted to.
	pub user_id: String,
	/// Organization the session is scoped to.
	pub organization_id: String,
	/// Application the session was issued for.
	pub application_id: String,
	/// Granted session length in minutes, always greater than zero.
	pub duration_minutes: u64,
	/// Epoch seconds the token was issued at.
	pub issued_at: i64,
	/// Epoch seconds the session expires at; always after `issued_at`.
	pub expires_at: i64,
	/// Subject email when the issuer included one.
	pub email: Option<String>,
}

/// Raw token payload as it appears inside the signed token.
///
/// Field names match the wire shape; mapping into [`SessionClaims`] is where
/// the shape and range invariants are enforced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawClaims {
	/// Session identifier (`sid`).
	pub sid: String,
	/// Subject (`sub`).
	pub sub: String,
	/// Organization identifier (`org`).
	pub org: String,
	/// Application identifier (`app`).
	pub app: String,
	/// Granted duration in minutes (`dur`).
	pub dur: u64,
	/// Issued-at epoch seconds (`iat`).
	pub iat: i64,
	/// Expiry epoch seconds (`exp`).
	pub exp: i64,
	/// Optional subject email.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
}

/// Reasons a raw payload fails to map into [`SessionClaims`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimsShapeError {
	/// `dur` was zero.
	ZeroDuration,
	/// `exp` was not after `iat`.
	ExpiryBeforeIssue,
	/// A required identifier field was empty.
	EmptyField(&'static str),
}

impl std::fmt::Display for ClaimsShapeError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::ZeroDuration => write!(f, "duration_minutes must be greater than zero"),
			Self::ExpiryBeforeIssue => write!(f, "expires_at must be after issued_at"),
			Self::EmptyField(name) => write!(f, "claim field `{name}` is empty"),
		}
	}
}

impl std::error::Error for ClaimsShapeError {}

impl TryFrom<RawClaims> for SessionClaims {
	type Error = ClaimsShapeError;

	fn try_from(raw: RawClaims) -> Result<Self, Self::Error> {
		if raw.sid.is_empty() {
			return Err(ClaimsShapeError::EmptyField("sid"));
		}
		if raw.sub.is_empty() {
			return Err(ClaimsShapeError::EmptyField("sub"));
		}
		if raw.dur == 0 {
			return Err(ClaimsShapeError::ZeroDuration);
		}
		if raw.exp <= raw.iat {
			return Err(ClaimsShapeError::ExpiryBeforeIssue);
		}

		Ok(Self {
			session_id: raw.sid,
			user_id: raw.sub,
			organization_id: raw.org,
			application_id: raw.app,
			duration_minutes: raw.dur,
			issued_at: raw.iat,
			expires_at: raw.exp,
			email: raw.email,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn raw() -> RawClaims {
		RawClaims {
			sid: "sess-1".into(),
			sub: "user-1".into(),
			org: "org-1".into(),
			app: "app-1".into(),
			dur: 30,
			iat: 1_700_000_000,
			exp: 1_700_001_800,
			email: Some("user@example.com".into()),
		}
	}

	#[test]
	fn valid_payload_maps_to_claims() {
		let claims = SessionClaims::try_from(raw()).unwrap();
		assert_eq!(claims.session_id, "sess-1");
		assert_eq!(claims.duration_minutes, 30);
		assert!(claims.expires_at > claims.issued_at);
	}

	#[test]
	fn zero_duration_is_rejected() {
		let mut payload = raw();
		payload.dur = 0;
		assert_eq!(SessionClaims::try_from(payload).unwrap_err(), ClaimsShapeError::ZeroDuration);
	}

	#[test]
	fn expiry_before_issue_is_rejected() {
		let mut payload = raw();
		payload.exp = payload.iat;
		assert_eq!(SessionClaims::try_from(payload).unwrap_err(), ClaimsShapeError::ExpiryBeforeIssue);
	}

	#[test]
	fn empty_session_id_is_rejected() {
		let mut payload = raw();
		payload.sid = String::new();
		assert_eq!(SessionClaims::try_from(payload).unwrap_err(), ClaimsShapeError::EmptyField("sid"));
	}

	#[test]
	fn email_is_optional_on_the_wire() {
		let json = r#"{"sid":"s","sub":"u","org":"o","app":"a","dur":5,"iat":10,"exp":310}"#;
		let payload: RawClaims = serde_json::from_str(json).unwrap();
		assert!(payload.email.is_none());
		assert!(SessionClaims::try_from(payload).is_ok());
	}
}

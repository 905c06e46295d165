//! Cached access-token record and its validity states.

// self
use crate::{_prelude::*, token::TokenSecret};

/// Validity of the cached token at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenState {
	/// No token has been obtained yet.
	Absent,
	/// Token is usable and outside the refresh margin.
	Valid,
	/// Token is still usable but inside the refresh margin.
	NearExpiry,
	/// Token reached its expiry instant.
	Expired,
}
impl TokenState {
	/// Computes the state of an optional token at `now` given the refresh `margin`.
	pub fn of(token: Option<&AccessToken>, now: OffsetDateTime, margin: Duration) -> Self {
		match token {
			None => TokenState::Absent,
			Some(token) => token.state_at(now, margin),
		}
	}

	/// Returns `true` when a refresh must happen before the token is handed out.
	pub fn needs_refresh(self) -> bool {
		!matches!(self, TokenState::Valid)
	}
}

/// Bearer token issued by the partner token endpoint.
///
/// Replaced only by a successful refresh; `expires_at` is strictly after `issued_at`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessToken {
	/// Bearer value; callers must avoid logging it.
	pub value: TokenSecret,
	/// Token type reported by the partner (usually `Bearer`).
	pub token_type: String,
	/// Scope granted by the partner, when reported.
	pub scope: Option<String>,
	/// Instant the exchange was issued.
	pub issued_at: OffsetDateTime,
	/// Expiry instant derived from `issued_at + expires_in`.
	pub expires_at: OffsetDateTime,
}
impl AccessToken {
	/// Creates a bearer token valid for `lifetime` from `issued_at`.
	///
	/// Returns `None` when the expiry instant is not representable.
	pub fn new(
		value: impl Into<TokenSecret>,
		issued_at: OffsetDateTime,
		lifetime: Duration,
	) -> Option<Self> {
		Some(Self {
			value: value.into(),
			token_type: "Bearer".into(),
			scope: None,
			issued_at,
			expires_at: issued_at.checked_add(lifetime)?,
		})
	}

	/// Computes the validity state at `now`.
	pub fn state_at(&self, now: OffsetDateTime, margin: Duration) -> TokenState {
		if now >= self.expires_at {
			TokenState::Expired
		} else if now >= self.expires_at - margin {
			TokenState::NearExpiry
		} else {
			TokenState::Valid
		}
	}

	/// Returns `true` while the token has not reached its expiry instant.
	pub fn is_unexpired_at(&self, now: OffsetDateTime) -> bool {
		now < self.expires_at
	}

	/// Renders the `Authorization` header value.
	pub fn bearer_header(&self) -> String {
		format!("Bearer {}", self.value.expose())
	}
}

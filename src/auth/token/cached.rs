//! Immutable cached token values, renewal checks, and builders.

// crates.io
use oauth2::http::HeaderValue;
// self
use crate::{_prelude::*, auth::token::secret::TokenSecret};

/// Token type assumed when the endpoint omits `token_type`.
pub const DEFAULT_TOKEN_TYPE: &str = "Bearer";

/// Freshness of a cached token relative to an instant and a renewal buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenFreshness {
	/// Token outlives `now + renewal_buffer`; safe to reuse.
	Fresh,
	/// Token is still valid but expires within the renewal buffer.
	RenewalDue,
	/// Token reached its expiry instant.
	Expired,
}

/// Errors produced by [`CachedTokenBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum CachedTokenBuilderError {
	/// Issued when no (or an empty) access token value was provided.
	#[error("Access token is required.")]
	MissingAccessToken,
	/// Issued when no expiry (absolute or relative) was configured.
	#[error("Expiry must be supplied via expires_at or expires_in.")]
	MissingExpiry,
	/// Relative expiry does not fit the supported time range.
	#[error("Expiry is outside the supported time range.")]
	ExpiryOutOfRange,
	/// `<token_type> <access_token>` is not a valid HTTP header value.
	#[error("Token cannot be represented as an Authorization header value.")]
	InvalidHeaderValue,
}

/// Token issued by the authorization server and shared by every caller of a cache entry.
///
/// Values are never mutated after construction; renewal replaces the whole entry.
#[derive(Clone)]
pub struct CachedToken {
	access_token: TokenSecret,
	token_type: String,
	issued_at: OffsetDateTime,
	expires_at: OffsetDateTime,
	authorization: HeaderValue,
}
impl CachedToken {
	/// Returns a builder for constructing cached tokens.
	pub fn builder() -> CachedTokenBuilder {
		CachedTokenBuilder::default()
	}

	/// Access token secret; callers must avoid logging it.
	pub fn access_token(&self) -> &TokenSecret {
		&self.access_token
	}

	/// Token type used as the `Authorization` scheme (defaults to `Bearer`).
	pub fn token_type(&self) -> &str {
		&self.token_type
	}

	/// Instant the token was received.
	pub fn issued_at(&self) -> OffsetDateTime {
		self.issued_at
	}

	/// Absolute expiry instant.
	pub fn expires_at(&self) -> OffsetDateTime {
		self.expires_at
	}

	/// Pre-rendered `<token_type> <access_token>` header value, flagged as sensitive.
	pub fn authorization(&self) -> &HeaderValue {
		&self.authorization
	}

	/// Classifies the token at `now` with the provided renewal buffer.
	pub fn freshness_at(&self, now: OffsetDateTime, renewal_buffer: Duration) -> TokenFreshness {
		if now >= self.expires_at {
			return TokenFreshness::Expired;
		}

		match now.checked_add(renewal_buffer) {
			Some(horizon) if horizon < self.expires_at => TokenFreshness::Fresh,
			_ => TokenFreshness::RenewalDue,
		}
	}

	/// Returns `true` unless `now + renewal_buffer` is strictly before the expiry instant.
	pub fn needs_renewal_at(&self, now: OffsetDateTime, renewal_buffer: Duration) -> bool {
		!matches!(self.freshness_at(now, renewal_buffer), TokenFreshness::Fresh)
	}

	/// Returns `true` if the token has expired at the provided instant.
	pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
		now >= self.expires_at
	}
}
impl Debug for CachedToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CachedToken")
			.field("access_token", &"<redacted>")
			.field("token_type", &self.token_type)
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Builder for [`CachedToken`].
#[derive(Clone, Debug, Default)]
pub struct CachedTokenBuilder {
	access_token: Option<TokenSecret>,
	token_type: Option<String>,
	issued_at: Option<OffsetDateTime>,
	expires_at: Option<OffsetDateTime>,
	expires_in: Option<Duration>,
}
impl CachedTokenBuilder {
	/// Provides the access token value.
	pub fn access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(TokenSecret::new(token));

		self
	}

	/// Provides the token type; blank values fall back to [`DEFAULT_TOKEN_TYPE`].
	pub fn token_type(mut self, token_type: impl Into<String>) -> Self {
		self.token_type = Some(token_type.into());

		self
	}

	/// Sets the issued-at instant.
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Sets an absolute expiry instant.
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets a relative expiry duration from the issued instant.
	pub fn expires_in(mut self, duration: Duration) -> Self {
		self.expires_in = Some(duration);

		self
	}

	/// Consumes the builder and produces a [`CachedToken`].
	pub fn build(self) -> Result<CachedToken, CachedTokenBuilderError> {
		let access_token = self
			.access_token
			.filter(|token| !token.is_blank())
			.ok_or(CachedTokenBuilderError::MissingAccessToken)?;
		let token_type = self
			.token_type
			.map(|value| value.trim().to_owned())
			.filter(|value| !value.is_empty())
			.unwrap_or_else(|| DEFAULT_TOKEN_TYPE.to_owned());
		let issued_at = self.issued_at.unwrap_or_else(OffsetDateTime::now_utc);
		let expires_at = match (self.expires_at, self.expires_in) {
			(Some(instant), _) => instant,
			(None, Some(delta)) =>
				issued_at.checked_add(delta).ok_or(CachedTokenBuilderError::ExpiryOutOfRange)?,
			(None, None) => return Err(CachedTokenBuilderError::MissingExpiry),
		};
		let mut authorization =
			HeaderValue::from_str(&format!("{token_type} {}", access_token.expose()))
				.map_err(|_| CachedTokenBuilderError::InvalidHeaderValue)?;

		authorization.set_sensitive(true);

		Ok(CachedToken { access_token, token_type, issued_at, expires_at, authorization })
	}
}

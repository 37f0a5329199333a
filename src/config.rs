//! Credential configuration consumed by the broker.
//!
//! A [`CredentialConfig`] describes one authorization server + client identity + grant, plus the
//! renewal policy applied to tokens cached under it. Values are validated once at construction
//! and never mutated afterwards; build a new value to change anything. Construction goes either
//! through [`CredentialConfig::builder`] or through [`CredentialConfig::load`], which resolves
//! each field through the layered [`ConfigSources`] chain.

/// Builder API for assembling credential configurations.
pub mod builder;
/// Grant types the broker can perform.
pub mod grant;
/// Layered settings sources (overrides, environment, TOML, defaults).
pub mod source;

pub use builder::*;
pub use grant::*;
pub use source::*;

// self
use crate::{_prelude::*, auth::TokenSecret, error::ConfigError};

/// Property keys understood by [`CredentialConfig::load`].
pub mod keys {
	/// Master switch; when false the broker is a pass-through.
	pub const ENABLED: &str = "oauth.enabled";
	/// Absolute URL of the token endpoint.
	pub const TOKEN_ENDPOINT: &str = "oauth.token.endpoint";
	/// OAuth client identifier.
	pub const CLIENT_ID: &str = "oauth.client.id";
	/// OAuth client secret.
	pub const CLIENT_SECRET: &str = "oauth.client.secret";
	/// Raw scope string sent with every exchange.
	pub const SCOPE: &str = "oauth.scope";
	/// `client_credentials` or `password`.
	pub const GRANT_TYPE: &str = "oauth.grant.type";
	/// Resource-owner username (password grant).
	pub const USERNAME: &str = "oauth.username";
	/// Resource-owner password (password grant).
	pub const PASSWORD: &str = "oauth.password";
	/// Seconds before expiry at which a cached token is renewed.
	pub const RENEWAL_BUFFER: &str = "oauth.token.refresh.buffer";
	/// Seconds allowed for one token exchange.
	pub const REQUEST_TIMEOUT: &str = "oauth.token.timeout";
}

/// Immutable description of an authorization server, client identity, grant, and renewal policy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CredentialConfig {
	pub(crate) enabled: bool,
	pub(crate) token_endpoint: Option<Url>,
	pub(crate) client_id: String,
	pub(crate) client_secret: TokenSecret,
	pub(crate) scope: String,
	pub(crate) grant_type: GrantType,
	pub(crate) username: Option<String>,
	pub(crate) password: Option<TokenSecret>,
	pub(crate) renewal_buffer: Duration,
	pub(crate) request_timeout: Duration,
}
impl CredentialConfig {
	/// Default renewal buffer (5 minutes).
	pub const DEFAULT_RENEWAL_BUFFER: Duration = Duration::seconds(300);
	/// Default timeout for one token exchange.
	pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::seconds(30);

	/// Creates a new builder seeded with the built-in defaults.
	pub fn builder() -> CredentialConfigBuilder {
		CredentialConfigBuilder::default()
	}

	/// Resolves every field through `sources`, falling back to built-in defaults.
	///
	/// Boolean and numeric values that fail to parse are treated as absent. A malformed token
	/// endpoint or an unknown grant type is an error, as is any validation failure of the
	/// resolved values.
	pub fn load(sources: &ConfigSources) -> Result<Self, ConfigError> {
		let mut builder = Self::builder();

		if let Some(enabled) = sources.resolve_parsed(keys::ENABLED, parse_flag) {
			builder = builder.enabled(enabled);
		}
		if let Some(raw) = sources.resolve(keys::TOKEN_ENDPOINT).map(str::trim)
			&& !raw.is_empty()
		{
			let url = Url::parse(raw).map_err(|source| ConfigError::InvalidTokenEndpoint {
				value: raw.to_owned(),
				source,
			})?;

			builder = builder.token_endpoint(url);
		}
		if let Some(client_id) = sources.resolve(keys::CLIENT_ID) {
			builder = builder.client_id(client_id);
		}
		if let Some(client_secret) = sources.resolve(keys::CLIENT_SECRET) {
			builder = builder.client_secret(client_secret);
		}
		if let Some(scope) = sources.resolve(keys::SCOPE) {
			builder = builder.scope(scope);
		}
		if let Some(raw) = sources.resolve(keys::GRANT_TYPE).map(str::trim)
			&& !raw.is_empty()
		{
			builder = builder.grant_type(raw.parse()?);
		}
		if let Some(username) = sources.resolve(keys::USERNAME) {
			builder = builder.username(username);
		}
		if let Some(password) = sources.resolve(keys::PASSWORD) {
			builder = builder.password(password);
		}
		if let Some(buffer) = sources.resolve_parsed(keys::RENEWAL_BUFFER, parse_seconds) {
			builder = builder.renewal_buffer(buffer);
		}
		if let Some(timeout) = sources
			.resolve_parsed(keys::REQUEST_TIMEOUT, |raw| parse_seconds(raw).filter(|d| d.is_positive()))
		{
			builder = builder.request_timeout(timeout);
		}

		builder.build()
	}

	/// Loads the configuration from `OAUTH_*` environment variables over built-in defaults.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::load(&ConfigSources::new().with_env())
	}

	/// When false, every broker operation is a no-op returning no token.
	pub fn enabled(&self) -> bool {
		self.enabled
	}

	/// Token endpoint; always present when [`enabled`](Self::enabled) is true.
	pub fn token_endpoint(&self) -> Option<&Url> {
		self.token_endpoint.as_ref()
	}

	/// OAuth client identifier.
	pub fn client_id(&self) -> &str {
		&self.client_id
	}

	/// OAuth client secret.
	pub fn client_secret(&self) -> &TokenSecret {
		&self.client_secret
	}

	/// Raw scope string.
	pub fn scope(&self) -> &str {
		&self.scope
	}

	/// Grant performed by [`Broker::acquire`](crate::flows::Broker::acquire).
	pub fn grant_type(&self) -> GrantType {
		self.grant_type
	}

	/// Resource-owner username (password grant only).
	pub fn username(&self) -> Option<&str> {
		self.username.as_deref()
	}

	/// Resource-owner password (password grant only).
	pub fn password(&self) -> Option<&TokenSecret> {
		self.password.as_ref()
	}

	/// How long before expiry a cached token stops being reused.
	pub fn renewal_buffer(&self) -> Duration {
		self.renewal_buffer
	}

	/// Upper bound for one token exchange.
	pub fn request_timeout(&self) -> Duration {
		self.request_timeout
	}
}

fn parse_flag(raw: &str) -> Option<bool> {
	match raw.trim().to_ascii_lowercase().as_str() {
		"true" | "1" | "yes" | "on" => Some(true),
		"false" | "0" | "no" | "off" => Some(false),
		_ => None,
	}
}

fn parse_seconds(raw: &str) -> Option<Duration> {
	let secs = raw.trim().parse::<u32>().ok()?;

	Some(Duration::seconds(i64::from(secs)))
}

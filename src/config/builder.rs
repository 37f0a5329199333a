// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	config::{CredentialConfig, GrantType, keys},
	error::ConfigError,
};

/// Builder for [`CredentialConfig`] values.
///
/// Defaults mirror the property defaults: disabled, empty scope, `client_credentials`, a
/// 300 second renewal buffer, and a 30 second exchange timeout.
#[derive(Debug)]
pub struct CredentialConfigBuilder {
	enabled: bool,
	token_endpoint: Option<Url>,
	client_id: String,
	client_secret: TokenSecret,
	scope: String,
	grant_type: GrantType,
	username: Option<String>,
	password: Option<TokenSecret>,
	renewal_buffer: Duration,
	request_timeout: Duration,
}
impl Default for CredentialConfigBuilder {
	fn default() -> Self {
		Self {
			enabled: false,
			token_endpoint: None,
			client_id: String::new(),
			client_secret: TokenSecret::default(),
			scope: String::new(),
			grant_type: GrantType::default(),
			username: None,
			password: None,
			renewal_buffer: CredentialConfig::DEFAULT_RENEWAL_BUFFER,
			request_timeout: CredentialConfig::DEFAULT_REQUEST_TIMEOUT,
		}
	}
}
impl CredentialConfigBuilder {
	/// Turns the broker on or off for this configuration.
	pub fn enabled(mut self, enabled: bool) -> Self {
		self.enabled = enabled;

		self
	}

	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Sets the client identifier.
	pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
		self.client_id = client_id.into();

		self
	}

	/// Sets the client secret.
	pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
		self.client_secret = TokenSecret::new(secret);

		self
	}

	/// Sets the raw scope string.
	pub fn scope(mut self, scope: impl Into<String>) -> Self {
		self.scope = scope.into();

		self
	}

	/// Selects the grant performed by [`Broker::acquire`](crate::flows::Broker::acquire).
	pub fn grant_type(mut self, grant: GrantType) -> Self {
		self.grant_type = grant;

		self
	}

	/// Sets the resource-owner username.
	pub fn username(mut self, username: impl Into<String>) -> Self {
		self.username = Some(username.into());

		self
	}

	/// Sets the resource-owner password.
	pub fn password(mut self, password: impl Into<String>) -> Self {
		self.password = Some(TokenSecret::new(password));

		self
	}

	/// Overrides the renewal buffer; negative values clamp to zero.
	pub fn renewal_buffer(mut self, buffer: Duration) -> Self {
		self.renewal_buffer = if buffer.is_negative() { Duration::ZERO } else { buffer };

		self
	}

	/// Overrides the exchange timeout; non-positive values keep the default.
	pub fn request_timeout(mut self, timeout: Duration) -> Self {
		if timeout.is_positive() {
			self.request_timeout = timeout;
		}

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<CredentialConfig, ConfigError> {
		let config = CredentialConfig {
			enabled: self.enabled,
			token_endpoint: self.token_endpoint,
			client_id: self.client_id,
			client_secret: self.client_secret,
			scope: self.scope,
			grant_type: self.grant_type,
			username: self.username,
			password: self.password,
			renewal_buffer: self.renewal_buffer,
			request_timeout: self.request_timeout,
		};

		config.validate()?;

		Ok(config)
	}
}

impl CredentialConfig {
	/// Validates invariants for the configuration.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.enabled {
			if self.token_endpoint.is_none() {
				return Err(ConfigError::MissingField { field: keys::TOKEN_ENDPOINT });
			}
			if self.client_id.trim().is_empty() {
				return Err(ConfigError::MissingField { field: keys::CLIENT_ID });
			}
			if self.client_secret.is_blank() {
				return Err(ConfigError::MissingField { field: keys::CLIENT_SECRET });
			}
		}
		if self.grant_type == GrantType::Password {
			self.ensure_password_credentials()?;
		}

		Ok(())
	}

	/// Checks the resource-owner credentials required by the password grant.
	pub(crate) fn ensure_password_credentials(&self) -> Result<(&str, &TokenSecret), ConfigError> {
		let username = self
			.username
			.as_deref()
			.filter(|value| !value.trim().is_empty())
			.ok_or(ConfigError::MissingPasswordCredential { field: keys::USERNAME })?;
		let password = self
			.password
			.as_ref()
			.filter(|value| !value.is_blank())
			.ok_or(ConfigError::MissingPasswordCredential { field: keys::PASSWORD })?;

		Ok((username, password))
	}
}

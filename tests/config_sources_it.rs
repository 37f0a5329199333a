// self
use oauth2_token_broker::{
	_preludet::*,
	config::{ConfigSources, CredentialConfig, GrantType, keys},
	error::ConfigError,
};

const SETTINGS: &str = r#"
[oauth]
enabled = true
scope = "read"

[oauth.token]
endpoint = "https://auth.test/token"
refresh.buffer = 120

[oauth.client]
id = "file-client"
secret = "file-secret"
"#;

#[test]
fn layers_resolve_in_priority_order() {
	let sources = ConfigSources::new()
		.with_overrides([(keys::SCOPE, "override-scope")])
		.with_env_vars([("OAUTH_CLIENT_ID", "env-client"), ("PATH", "/usr/bin")])
		.with_toml_str(SETTINGS)
		.expect("Settings fixture should parse.");
	let config = CredentialConfig::load(&sources).expect("Layered configuration should load.");

	assert!(config.enabled());
	assert_eq!(config.scope(), "override-scope");
	assert_eq!(config.client_id(), "env-client");
	assert_eq!(config.client_secret().expose(), "file-secret");
	assert_eq!(
		config.token_endpoint().map(Url::as_str),
		Some("https://auth.test/token")
	);
	assert_eq!(config.renewal_buffer(), Duration::seconds(120));
	assert_eq!(config.grant_type(), GrantType::ClientCredentials);
	assert_eq!(config.request_timeout(), CredentialConfig::DEFAULT_REQUEST_TIMEOUT);
}

#[test]
fn malformed_numbers_and_flags_fall_back() {
	let sources = ConfigSources::new()
		.with_overrides([
			(keys::RENEWAL_BUFFER, "five minutes"),
			(keys::REQUEST_TIMEOUT, "-3"),
			(keys::ENABLED, "perhaps"),
		])
		.with_toml_str(SETTINGS)
		.expect("Settings fixture should parse.");
	let config = CredentialConfig::load(&sources).expect("Malformed values must not be fatal.");

	assert!(config.enabled());
	assert_eq!(config.renewal_buffer(), Duration::seconds(120));
	assert_eq!(config.request_timeout(), CredentialConfig::DEFAULT_REQUEST_TIMEOUT);

	let only_malformed =
		ConfigSources::new().with_overrides([(keys::RENEWAL_BUFFER, "x"), (keys::ENABLED, "?")]);
	let config =
		CredentialConfig::load(&only_malformed).expect("Malformed values must not be fatal.");

	assert!(!config.enabled());
	assert_eq!(config.renewal_buffer(), CredentialConfig::DEFAULT_RENEWAL_BUFFER);
}

#[test]
fn empty_sources_yield_a_disabled_default_configuration() {
	let config = CredentialConfig::load(&ConfigSources::new()).expect("Defaults should load.");

	assert!(!config.enabled());
	assert!(config.token_endpoint().is_none());
	assert_eq!(config.scope(), "");
	assert_eq!(config.renewal_buffer(), Duration::seconds(300));
}

#[test]
fn unknown_grant_type_is_rejected() {
	let sources = ConfigSources::new()
		.with_overrides([(keys::GRANT_TYPE, "authorization_code")])
		.with_toml_str(SETTINGS)
		.expect("Settings fixture should parse.");
	let err = CredentialConfig::load(&sources).expect_err("Unknown grant must be rejected.");

	assert!(matches!(err, ConfigError::UnsupportedGrantType { value } if value == "authorization_code"));
}

#[test]
fn password_grant_from_settings_requires_owner_credentials() {
	let sources = ConfigSources::new()
		.with_overrides([(keys::GRANT_TYPE, "password"), (keys::USERNAME, "")])
		.with_toml_str(SETTINGS)
		.expect("Settings fixture should parse.");
	let err = CredentialConfig::load(&sources).expect_err("Empty username must be rejected.");

	assert!(matches!(err, ConfigError::MissingPasswordCredential { field: keys::USERNAME }));

	let sources = ConfigSources::new()
		.with_overrides([
			(keys::GRANT_TYPE, "PASSWORD"),
			(keys::USERNAME, "alice"),
			(keys::PASSWORD, "wonderland"),
		])
		.with_toml_str(SETTINGS)
		.expect("Settings fixture should parse.");
	let config = CredentialConfig::load(&sources).expect("Complete password settings should load.");

	assert_eq!(config.grant_type(), GrantType::Password);
	assert_eq!(config.username(), Some("alice"));
}

#[test]
fn invalid_endpoint_is_a_configuration_error() {
	let sources = ConfigSources::new()
		.with_overrides([(keys::TOKEN_ENDPOINT, "not a url")])
		.with_toml_str(SETTINGS)
		.expect("Settings fixture should parse.");
	let err = CredentialConfig::load(&sources).expect_err("Invalid endpoint must be rejected.");

	assert!(matches!(err, ConfigError::InvalidTokenEndpoint { .. }));
}

#[test]
fn missing_settings_file_is_reported() {
	let err = ConfigSources::new()
		.with_toml_file("/nonexistent/oauth2-token-broker/settings.toml")
		.expect_err("Missing settings file must be reported.");

	assert!(matches!(err, ConfigError::SettingsRead { .. }));
}

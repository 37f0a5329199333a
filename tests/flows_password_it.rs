// crates.io
use httpmock::prelude::*;
// self
use oauth2_token_broker::{
	_preludet::*,
	config::{CredentialConfig, GrantType, keys},
	error::ConfigError,
};

const CLIENT_ID: &str = "c1";
const CLIENT_SECRET: &str = "s1";
// base64("c1:s1")
const BASIC_CREDENTIALS: &str = "Basic YzE6czE=";

fn build_password_config(server: &MockServer) -> CredentialConfig {
	enabled_config_builder(&server.url("/token"), CLIENT_ID, CLIENT_SECRET, "read")
		.grant_type(GrantType::Password)
		.username("alice")
		.password("wonderland")
		.build()
		.expect("Password configuration should build successfully.")
}

#[tokio::test]
async fn password_grant_authenticates_client_with_basic_auth() {
	let server = MockServer::start_async().await;
	let (broker, _store) = build_reqwest_test_broker();
	let config = build_password_config(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/token")
				.header("authorization", BASIC_CREDENTIALS)
				.header("content-type", "application/x-www-form-urlencoded");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"owner-token\",\"expires_in\":3600,\"token_type\":\"Bearer\"}");
		})
		.await;
	let acquisition = broker.acquire(&config).await.expect("Password grant should succeed.");

	assert_eq!(
		acquisition.authorization().expect("Password grant should yield a token."),
		"Bearer owner-token"
	);

	broker.password(&config).await.expect("Second call should hit the cache.");
	mock.assert_async().await;
}

#[tokio::test]
async fn password_grant_without_owner_credentials_fails_before_any_request() {
	let server = MockServer::start_async().await;
	let (broker, _store) = build_reqwest_test_broker();
	let config = enabled_config_builder(&server.url("/token"), CLIENT_ID, CLIENT_SECRET, "read")
		.build()
		.expect("Client credentials configuration should build successfully.");
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"unexpected\"}");
		})
		.await;
	let err = broker.password(&config).await.expect_err("Missing username should fail.");

	assert!(matches!(
		err,
		Error::Config(ConfigError::MissingPasswordCredential { field: keys::USERNAME })
	));

	mock.assert_calls_async(0).await;
}

#[test]
fn password_configuration_with_empty_username_is_rejected() {
	let err = CredentialConfig::builder()
		.enabled(true)
		.token_endpoint(Url::parse("https://auth.test/token").expect("Fixture URL should parse."))
		.client_id(CLIENT_ID)
		.client_secret(CLIENT_SECRET)
		.grant_type(GrantType::Password)
		.username("")
		.password("wonderland")
		.build()
		.expect_err("Empty username must fail validation.");

	assert!(matches!(err, ConfigError::MissingPasswordCredential { field: keys::USERNAME }));
}

#[tokio::test]
async fn grants_sharing_endpoint_client_and_scope_share_one_entry() {
	let server = MockServer::start_async().await;
	let (broker, store) = build_reqwest_test_broker();
	let client_config = enabled_config_builder(&server.url("/token"), CLIENT_ID, CLIENT_SECRET, "read")
		.build()
		.expect("Client credentials configuration should build successfully.");
	let password_config = build_password_config(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"shared\",\"expires_in\":3600}");
		})
		.await;
	let client_token = broker
		.acquire(&client_config)
		.await
		.expect("Client credentials grant should succeed.")
		.into_token()
		.expect("Client credentials grant should yield a token.");
	let password_token = broker
		.acquire(&password_config)
		.await
		.expect("Password grant should succeed.")
		.into_token()
		.expect("Password grant should yield a token.");

	assert!(Arc::ptr_eq(&client_token, &password_token));
	assert_eq!(store.len(), 1);

	mock.assert_calls_async(1).await;
}

//! Token endpoint wire codec.
//!
//! Builds `application/x-www-form-urlencoded` grant requests, runs them through a
//! [`TokenHttpClient`] under the configured timeout, and turns responses into
//! [`CachedToken`] values or classified errors. Parsing is deliberately lenient about optional
//! fields so that an unusual but successful response never crashes the broker.

pub use oauth2;

// crates.io
use base64::{Engine, engine::general_purpose::STANDARD};
use oauth2::{
	AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse,
	http::{
		HeaderValue, Method, StatusCode,
		header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
	},
};
use serde_json::Value;
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	auth::{CachedToken, CachedTokenBuilderError},
	config::{CredentialConfig, GrantType, keys},
	error::{ConfigError, ProtocolError, ResponseError, TransportError},
	http::{self, TokenHttpClient},
};

/// Lifetime assumed when the endpoint omits `expires_in` or sends something unusable.
pub const DEFAULT_EXPIRES_IN: Duration = Duration::seconds(3600);

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const JSON_ACCEPT: &str = "application/json";

/// Maps HTTP transport failures into broker [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a broker error.
	fn map_transport_error(&self, grant: GrantType, error: HttpClientError<E>) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(&self, _grant: GrantType, err: HttpClientError<ReqwestError>) -> Error {
		match err {
			HttpClientError::Reqwest(inner) if inner.is_builder() => ConfigError::from(*inner).into(),
			HttpClientError::Reqwest(inner) => TransportError::from(*inner).into(),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			HttpClientError::Other(message) =>
				TransportError::network(std::io::Error::other(message)).into(),
			_ => TransportError::network(std::io::Error::other(
				"HTTP client error occurred while calling the token endpoint",
			))
			.into(),
		}
	}
}

/// Builds the token request for `grant` against the configured endpoint.
///
/// `scope` is always sent, even when empty. The password grant authenticates the client with
/// HTTP Basic and sends the resource-owner credentials in the form; client credentials travel
/// in the form body.
pub(crate) fn token_request(config: &CredentialConfig, grant: GrantType) -> Result<HttpRequest> {
	let endpoint = config
		.token_endpoint()
		.ok_or(ConfigError::MissingField { field: keys::TOKEN_ENDPOINT })?;
	let mut form = form_urlencoded::Serializer::new(String::new());
	let mut builder = oauth2::http::Request::builder()
		.method(Method::POST)
		.uri(endpoint.as_str())
		.header(CONTENT_TYPE, FORM_CONTENT_TYPE)
		.header(ACCEPT, JSON_ACCEPT);

	form.append_pair("grant_type", grant.as_str());

	match grant {
		GrantType::ClientCredentials => {
			form.append_pair("client_id", config.client_id());
			form.append_pair("client_secret", config.client_secret().expose());
		},
		GrantType::Password => {
			let (username, password) = config.ensure_password_credentials()?;

			builder = builder.header(AUTHORIZATION, basic_authorization(config)?);
			form.append_pair("username", username);
			form.append_pair("password", password.expose());
		},
	}

	form.append_pair("scope", config.scope());

	let request = builder.body(form.finish().into_bytes()).map_err(ConfigError::from)?;

	Ok(request)
}

fn basic_authorization(config: &CredentialConfig) -> Result<HeaderValue, ConfigError> {
	let credentials =
		STANDARD.encode(format!("{}:{}", config.client_id(), config.client_secret().expose()));
	let mut value = HeaderValue::from_str(&format!("Basic {credentials}"))
		.map_err(|e| ConfigError::from(oauth2::http::Error::from(e)))?;

	value.set_sensitive(true);

	Ok(value)
}

/// Sends `request` through `http_client`, bounded by `timeout`, and parses the answer.
pub(crate) async fn exchange<C, M>(
	http_client: &C,
	mapper: &M,
	grant: GrantType,
	request: HttpRequest,
	timeout: Duration,
) -> Result<CachedToken>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	let handle = http_client.handle();
	let response = match tokio::time::timeout(timeout.unsigned_abs(), handle.call(request)).await
	{
		Ok(Ok(response)) => response,
		Ok(Err(err)) => return Err(mapper.map_transport_error(grant, err)),
		Err(_) => return Err(TransportError::Timeout { after: timeout }.into()),
	};

	parse_token_response(&response, OffsetDateTime::now_utc())
}

#[derive(Debug, Deserialize)]
struct TokenResponseBody {
	#[serde(default)]
	access_token: Value,
	#[serde(default)]
	token_type: Value,
	#[serde(default)]
	expires_in: Value,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorResponseBody {
	error: Option<String>,
	error_description: Option<String>,
}

/// Turns a token endpoint response received at `now` into a token or a classified error.
pub(crate) fn parse_token_response(
	response: &HttpResponse,
	now: OffsetDateTime,
) -> Result<CachedToken> {
	let status = response.status().as_u16();

	if response.status() != StatusCode::OK {
		let body =
			serde_json::from_slice::<ErrorResponseBody>(response.body()).unwrap_or_default();

		return Err(ProtocolError {
			status,
			oauth_error: body.error,
			error_description: body.error_description,
			retry_after: http::retry_after(response),
		}
		.into());
	}

	let mut deserializer = serde_json::Deserializer::from_slice(response.body());
	let body: TokenResponseBody = serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| ResponseError::Parse { source, status })?;
	let access_token = body
		.access_token
		.as_str()
		.filter(|token| !token.is_empty())
		.ok_or(ResponseError::MissingAccessToken { status })?;
	let expires_at = expires_in_seconds(&body.expires_in)
		.and_then(|secs| now.checked_add(Duration::seconds(secs)))
		.unwrap_or_else(|| now.saturating_add(DEFAULT_EXPIRES_IN));
	let mut builder =
		CachedToken::builder().access_token(access_token).issued_at(now).expires_at(expires_at);

	if let Some(token_type) = body.token_type.as_str() {
		builder = builder.token_type(token_type);
	}

	builder.build().map_err(|source| match source {
		CachedTokenBuilderError::MissingAccessToken => ResponseError::MissingAccessToken { status },
		source => ResponseError::InvalidToken { source, status },
	}
	.into())
}

fn expires_in_seconds(value: &Value) -> Option<i64> {
	match value {
		Value::Number(number) => number.as_i64(),
		Value::String(text) => text.trim().parse().ok(),
		_ => None,
	}
}

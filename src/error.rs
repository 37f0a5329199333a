//! Broker-level error types shared across configuration, transport, and token flows.

// self
use crate::_prelude::*;

/// Broker-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical broker error exposed by public APIs.
///
/// A disabled configuration never produces any of these; it yields
/// [`Acquisition::Unauthenticated`](crate::flows::Acquisition::Unauthenticated) instead.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Cache-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Token endpoint answered with a non-200 status.
	#[error(transparent)]
	Protocol(#[from] ProtocolError),
	/// Token endpoint answered 200 but the body is unusable.
	#[error(transparent)]
	MalformedResponse(#[from] ResponseError),
}
impl Error {
	/// Returns the HTTP status reported by the token endpoint, when one was received.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Protocol(err) => Some(err.status),
			Self::MalformedResponse(err) => err.status(),
			_ => None,
		}
	}

	/// Returns `true` for connection failures and timeouts.
	pub fn is_transport(&self) -> bool {
		matches!(self, Self::Transport(_))
	}
}

/// Configuration and validation failures raised by the broker.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// A field required by an enabled configuration is empty.
	#[error("Configuration field `{field}` is required when OAuth is enabled.")]
	MissingField {
		/// Property key of the missing field.
		field: &'static str,
	},
	/// The password grant was selected without its resource-owner credentials.
	#[error("Configuration field `{field}` is required by the password grant.")]
	MissingPasswordCredential {
		/// Property key of the missing field.
		field: &'static str,
	},
	/// Token endpoint cannot be parsed as an absolute URL.
	#[error("Token endpoint `{value}` is not a valid URL.")]
	InvalidTokenEndpoint {
		/// Raw configured value.
		value: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Grant type is not one the broker knows how to perform.
	#[error("Grant type `{value}` is not supported; expected `client_credentials` or `password`.")]
	UnsupportedGrantType {
		/// Raw configured value.
		value: String,
	},
	/// HTTP method is not accepted by the authorized request helper.
	#[error("HTTP method `{method}` is not supported.")]
	UnsupportedMethod {
		/// Raw method name.
		method: String,
	},
	/// Settings file could not be read.
	#[error("Settings file `{path}` could not be read.")]
	SettingsRead {
		/// Path that failed to load.
		path: String,
		/// Underlying IO failure.
		#[source]
		source: std::io::Error,
	},
	/// Settings file is not valid TOML.
	#[error("Settings are not valid TOML.")]
	SettingsParse(#[from] toml::de::Error),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO, timeout).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the token endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The exchange did not complete within the configured timeout.
	#[error("Token endpoint did not respond within {after}.")]
	Timeout {
		/// Timeout that elapsed.
		after: Duration,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the token endpoint.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Non-200 answer from the token endpoint (e.g. `401` for bad client credentials).
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Token endpoint rejected the request with HTTP {status}{}.", describe_oauth_error(.oauth_error.as_deref(), .error_description.as_deref()))]
pub struct ProtocolError {
	/// HTTP status code.
	pub status: u16,
	/// OAuth `error` field, when the body carried one.
	pub oauth_error: Option<String>,
	/// OAuth `error_description` field, when the body carried one.
	pub error_description: Option<String>,
	/// Retry-After hint from upstream, if supplied.
	pub retry_after: Option<Duration>,
}

/// `200` answer whose body does not describe a usable token.
#[derive(Debug, ThisError)]
pub enum ResponseError {
	/// Body parsed but `access_token` is absent, empty, or not a string.
	#[error("Token endpoint response is missing access_token.")]
	MissingAccessToken {
		/// HTTP status code.
		status: u16,
	},
	/// Body is not a JSON object.
	#[error("Token endpoint returned malformed JSON.")]
	Parse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// HTTP status code.
		status: u16,
	},
	/// Token fields cannot form a usable cached token (e.g. not a valid header value).
	#[error("Token endpoint issued an unusable token.")]
	InvalidToken {
		/// Validation failure reported by the token builder.
		#[source]
		source: crate::auth::CachedTokenBuilderError,
		/// HTTP status code.
		status: u16,
	},
}
impl ResponseError {
	/// HTTP status code of the offending response.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::MissingAccessToken { status }
			| Self::Parse { status, .. }
			| Self::InvalidToken { status, .. } => Some(*status),
		}
	}
}

fn describe_oauth_error(error: Option<&str>, description: Option<&str>) -> String {
	match (error, description) {
		(Some(error), Some(description)) => format!(" ({error}: {description})"),
		(Some(error), None) => format!(" ({error})"),
		(None, Some(description)) => format!(" ({description})"),
		(None, None) => String::new(),
	}
}

//! Header injection for `http` requests and reqwest builders.

// crates.io
use oauth2::http::{HeaderValue, Request, header::AUTHORIZATION};
// self
use crate::flows::Acquisition;
#[cfg(feature = "reqwest")]
use crate::{_prelude::*, error::ConfigError};

/// Requests that can carry an `Authorization` header.
///
/// Implemented for [`http::Request`](oauth2::http::Request) and, with the `reqwest` feature,
/// for [`reqwest::RequestBuilder`]. Implement it for other client types to use [`decorate`]
/// with them.
pub trait SignRequest
where
	Self: Sized,
{
	/// Returns the request with `Authorization` set to `value`, replacing any previous value.
	fn with_authorization(self, value: HeaderValue) -> Self;
}
impl<B> SignRequest for Request<B> {
	fn with_authorization(mut self, value: HeaderValue) -> Self {
		self.headers_mut().insert(AUTHORIZATION, value);

		self
	}
}
#[cfg(feature = "reqwest")]
impl SignRequest for reqwest::RequestBuilder {
	fn with_authorization(self, value: HeaderValue) -> Self {
		// `header` appends; `headers` replaces existing entries for the same name.
		self.headers(reqwest::header::HeaderMap::from_iter([(AUTHORIZATION, value)]))
	}
}

/// Attaches `Authorization: <token_type> <access_token>` when `acquisition` holds a token;
/// returns `request` untouched for [`Acquisition::Unauthenticated`].
pub fn decorate<R>(request: R, acquisition: &Acquisition) -> R
where
	R: SignRequest,
{
	match acquisition.authorization() {
		Some(value) => request.with_authorization(value.clone()),
		None => request,
	}
}

/// Builds a decorated reqwest request for `GET`, `POST`, `PUT`, `DELETE`, or `PATCH`.
///
/// The method name is matched case-insensitively; anything else is rejected.
#[cfg(feature = "reqwest")]
pub fn authorized_request(
	client: &ReqwestClient,
	method: &str,
	url: Url,
	acquisition: &Acquisition,
) -> Result<reqwest::RequestBuilder, ConfigError> {
	let method = match method.trim().to_ascii_uppercase().as_str() {
		"GET" => reqwest::Method::GET,
		"POST" => reqwest::Method::POST,
		"PUT" => reqwest::Method::PUT,
		"DELETE" => reqwest::Method::DELETE,
		"PATCH" => reqwest::Method::PATCH,
		_ => return Err(ConfigError::UnsupportedMethod { method: method.to_owned() }),
	};

	Ok(decorate(client.request(method, url), acquisition))
}

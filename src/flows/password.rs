//! Resource-owner `password` grant.
//!
//! The client authenticates with HTTP Basic (`client_id:client_secret`) and forwards the
//! configured username and password in the form body.

// self
use crate::{
	_prelude::*,
	config::{CredentialConfig, GrantType},
	flows::{Acquisition, Broker, common},
	http::TokenHttpClient,
	oauth::TransportErrorMapper,
};

impl<C, M> Broker<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Performs the `password` grant, reusing the cached token while it outlives the renewal
	/// buffer.
	///
	/// Fails with [`ConfigError::MissingPasswordCredential`] when `config` lacks a username or
	/// password, even if a token is cached under the same key. Returns
	/// [`Acquisition::Unauthenticated`] without any I/O when `config` is disabled.
	///
	/// # Panics
	///
	/// Panics when polled outside a tokio runtime with the time driver enabled; see
	/// [`Broker::acquire`].
	///
	/// [`ConfigError::MissingPasswordCredential`]: crate::error::ConfigError::MissingPasswordCredential
	pub async fn password(&self, config: &CredentialConfig) -> Result<Acquisition> {
		common::acquire_with_grant(self, config, GrantType::Password).await
	}
}

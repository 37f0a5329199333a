//! `client_credentials` grant: the client authenticates with its own id and secret, sent as
//! form parameters, and receives a token for the configured scope.

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
	/// Performs the `client_credentials` grant, reusing the cached token while it outlives the
	/// renewal buffer.
	///
	/// Returns [`Acquisition::Unauthenticated`] without any I/O when `config` is disabled.
	///
	/// # Panics
	///
	/// Panics when polled outside a tokio runtime with the time driver enabled; see
	/// [`Broker::acquire`].
	pub async fn client_credentials(&self, config: &CredentialConfig) -> Result<Acquisition> {
		common::acquire_with_grant(self, config, GrantType::ClientCredentials).await
	}
}

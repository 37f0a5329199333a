//! Token acquisition orchestrated by the broker.

pub mod common;

mod client_credentials;
mod password;

pub use common::*;

// crates.io
use oauth2::http::HeaderValue;
// self
use crate::{
	_prelude::*,
	auth::{CacheKey, CachedToken},
	config::{CredentialConfig, GrantType},
	http::TokenHttpClient,
	oauth::TransportErrorMapper,
	store::BrokerStore,
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

#[cfg(feature = "reqwest")]
/// Broker specialized for the crate's default reqwest transport stack.
pub type ReqwestBroker = Broker<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Outcome of an acquisition.
///
/// `Unauthenticated` means OAuth is disabled for the configuration; callers must send their
/// request without an `Authorization` header. It is never used to signal a failure.
#[derive(Clone, Debug)]
pub enum Acquisition {
	/// A token valid beyond the renewal buffer.
	Authenticated(Arc<CachedToken>),
	/// OAuth is disabled; proceed without credentials.
	Unauthenticated,
}
impl Acquisition {
	/// Returns `true` when a token was produced.
	pub fn is_authenticated(&self) -> bool {
		matches!(self, Self::Authenticated(_))
	}

	/// Borrows the token, if any.
	pub fn token(&self) -> Option<&Arc<CachedToken>> {
		match self {
			Self::Authenticated(token) => Some(token),
			Self::Unauthenticated => None,
		}
	}

	/// Consumes the acquisition and returns the token, if any.
	pub fn into_token(self) -> Option<Arc<CachedToken>> {
		match self {
			Self::Authenticated(token) => Some(token),
			Self::Unauthenticated => None,
		}
	}

	/// `Authorization` header value to attach, if any.
	pub fn authorization(&self) -> Option<&HeaderValue> {
		self.token().map(|token| token.authorization())
	}
}

/// Owns the token cache shared by every caller and performs token exchanges on demand.
///
/// One broker is meant to live for the whole process (or test run) and be shared by all
/// concurrent callers. Lookups and exchanges for different cache keys never wait on each other.
///
/// By default concurrent misses on the same key are not coalesced: each caller that observes a
/// missing or stale entry performs its own exchange and the last completed write wins. Enable
/// [`with_singleflight`](Self::with_singleflight) to serialize misses per key so at most one
/// exchange runs at a time and waiting callers reuse its result.
pub struct Broker<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client wrapper used for every token exchange.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Token cache.
	pub store: Arc<dyn BrokerStore>,
	singleflight: bool,
	flow_guards: Arc<Mutex<HashMap<CacheKey, Arc<AsyncMutex<()>>>>>,
}
impl<C, M> Broker<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a broker that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		store: Arc<dyn BrokerStore>,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			store,
			singleflight: false,
			flow_guards: Default::default(),
		}
	}

	/// Serializes concurrent cache misses per key when `enabled`.
	///
	/// A key's guard lives only while callers hold or wait on it.
	pub fn with_singleflight(mut self, enabled: bool) -> Self {
		self.singleflight = enabled;

		self
	}

	/// Returns `true` when concurrent misses are coalesced per key.
	pub fn singleflight(&self) -> bool {
		self.singleflight
	}

	/// Acquires a token with the grant selected by `config`.
	///
	/// # Panics
	///
	/// The exchange is bounded by `tokio::time::timeout`, which panics unless polled inside a
	/// tokio runtime with the time driver enabled.
	pub async fn acquire(&self, config: &CredentialConfig) -> Result<Acquisition> {
		match config.grant_type() {
			GrantType::ClientCredentials => self.client_credentials(config).await,
			GrantType::Password => self.password(config).await,
		}
	}

	/// Returns the cache entry for `config` without contacting the token endpoint.
	///
	/// The entry is returned even when it is due for renewal; use [`should_renew`] to judge it.
	pub async fn cached(&self, config: &CredentialConfig) -> Result<Option<Arc<CachedToken>>> {
		if !config.enabled() {
			return Ok(None);
		}

		let Some(key) = CacheKey::from_config(config) else { return Ok(None) };

		Ok(self.store.fetch(&key).await?)
	}

	/// Drops every cached token.
	pub async fn clear_cache(&self) -> Result<()> {
		self.store.clear().await?;
		self.flow_guards.lock().clear();

		Ok(())
	}
}
#[cfg(feature = "reqwest")]
impl Broker<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a broker backed by a default reqwest client.
	///
	/// Use [`Broker::with_http_client`] with [`ReqwestHttpClient::new`] for a client that refuses
	/// redirects, or with a preconfigured client (proxies, custom roots, ...).
	pub fn new(store: Arc<dyn BrokerStore>) -> Self {
		Self::with_http_client(
			store,
			ReqwestHttpClient::default(),
			Arc::new(ReqwestTransportErrorMapper),
		)
	}
}
impl<C, M> Clone for Broker<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			transport_mapper: self.transport_mapper.clone(),
			store: self.store.clone(),
			singleflight: self.singleflight,
			flow_guards: self.flow_guards.clone(),
		}
	}
}
impl<C, M> Debug for Broker<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Broker")
			.field("singleflight", &self.singleflight)
			.field("guarded_keys", &self.flow_guards.lock().len())
			.finish()
	}
}

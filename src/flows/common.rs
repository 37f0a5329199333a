//! Shared acquisition pipeline (cache check, exchange, store) and the renewal decision.

// self
use crate::{
	_prelude::*,
	auth::{CacheKey, CachedToken},
	config::{CredentialConfig, GrantType, keys},
	error::ConfigError,
	flows::{Acquisition, Broker},
	http::TokenHttpClient,
	oauth::{self, TransportErrorMapper},
	obs::{self, FlowOutcome, FlowSpan},
};

/// Decides whether a cache entry must be replaced at `now`.
///
/// Renewal is required unless an entry exists and `now + renewal_buffer` is strictly before
/// its expiry. An entry whose lifetime is shorter than the buffer is therefore renewed on every
/// call.
pub fn should_renew(
	cached: Option<&CachedToken>,
	renewal_buffer: Duration,
	now: OffsetDateTime,
) -> bool {
	cached.is_none_or(|token| token.needs_renewal_at(now, renewal_buffer))
}

/// Returns (and creates on demand) the singleflight guard for a cache key.
pub(crate) fn flow_guard<C, M>(broker: &Broker<C, M>, key: &CacheKey) -> Arc<AsyncMutex<()>>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	let mut guards = broker.flow_guards.lock();

	guards.entry(key.clone()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
}

/// Drops the guard for `key` once no other caller holds or waits on it.
pub(crate) fn release_flow_guard<C, M>(
	broker: &Broker<C, M>,
	key: &CacheKey,
	guard: Arc<AsyncMutex<()>>,
) where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	let mut guards = broker.flow_guards.lock();

	// Only the map entry and `guard` remain.
	if guards.get(key).is_some_and(|current| Arc::ptr_eq(current, &guard))
		&& Arc::strong_count(&guard) == 2
	{
		guards.remove(key);
	}
}

/// Runs one acquisition for `grant`, recording spans and outcome counters.
pub(crate) async fn acquire_with_grant<C, M>(
	broker: &Broker<C, M>,
	config: &CredentialConfig,
	grant: GrantType,
) -> Result<Acquisition>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	if !config.enabled() {
		obs::record_flow_outcome(grant, FlowOutcome::Disabled);

		return Ok(Acquisition::Unauthenticated);
	}

	let key = CacheKey::from_config(config);
	let span = FlowSpan::new(grant, key.as_ref());

	obs::record_flow_outcome(grant, FlowOutcome::Attempt);

	let result = span.instrument(acquire_enabled(broker, config, grant, key)).await;

	match &result {
		Ok(_) => obs::record_flow_outcome(grant, FlowOutcome::Success),
		Err(err) => {
			obs::trace_failure(err);
			obs::record_flow_outcome(grant, FlowOutcome::Failure);
		},
	}

	result
}

async fn acquire_enabled<C, M>(
	broker: &Broker<C, M>,
	config: &CredentialConfig,
	grant: GrantType,
	key: Option<CacheKey>,
) -> Result<Acquisition>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	let key = key.ok_or(ConfigError::MissingField { field: keys::TOKEN_ENDPOINT })?;

	// Entries are shared across grants, so check owner credentials before touching the cache.
	if grant == GrantType::Password {
		config.ensure_password_credentials()?;
	}

	let guard = broker.singleflight.then(|| flow_guard(broker, &key));
	let result = match &guard {
		Some(guard) => {
			let _held = guard.lock().await;

			fetch_or_exchange(broker, config, grant, &key).await
		},
		None => fetch_or_exchange(broker, config, grant, &key).await,
	};

	if let Some(guard) = guard {
		release_flow_guard(broker, &key, guard);
	}

	result
}

async fn fetch_or_exchange<C, M>(
	broker: &Broker<C, M>,
	config: &CredentialConfig,
	grant: GrantType,
	key: &CacheKey,
) -> Result<Acquisition>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	let cached = broker.store.fetch(key).await?;

	if let Some(token) = cached
		&& !should_renew(Some(&token), config.renewal_buffer(), OffsetDateTime::now_utc())
	{
		obs::trace_cache_lookup(true);
		obs::record_flow_outcome(grant, FlowOutcome::CacheHit);

		return Ok(Acquisition::Authenticated(token));
	}

	obs::trace_cache_lookup(false);
	obs::record_flow_outcome(grant, FlowOutcome::Exchange);

	let request = oauth::token_request(config, grant)?;
	let token = oauth::exchange(
		broker.http_client.as_ref(),
		broker.transport_mapper.as_ref(),
		grant,
		request,
		config.request_timeout(),
	)
	.await?;
	let token = Arc::new(token);

	broker.store.save(key.clone(), token.clone()).await?;
	obs::trace_token_stored(token.expires_at());

	Ok(Acquisition::Authenticated(token))
}

// self
use crate::{_prelude::*, auth::CacheKey, config::GrantType};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// A span builder used by broker acquisitions.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the grant and, when known, the cache key fingerprint.
	pub fn new(grant: GrantType, key: Option<&CacheKey>) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"oauth2_token_broker.acquire",
				grant = grant.as_str(),
				cache_key = key.map(CacheKey::fingerprint),
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (grant, key);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a debug event for a cache lookup.
pub fn trace_cache_lookup(hit: bool) {
	#[cfg(feature = "tracing")]
	{
		if hit {
			tracing::debug!("cached token reused");
		} else {
			tracing::debug!("cached token missing or due for renewal");
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = hit;
	}
}

/// Emits a debug event once a new token is stored.
pub fn trace_token_stored(expires_at: OffsetDateTime) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(%expires_at, "token exchanged and cached");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = expires_at;
	}
}

/// Emits a warn event for a failed acquisition.
pub fn trace_failure(err: &Error) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(error = %err, status = err.status(), "token acquisition failed");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = err;
	}
}

/// Emits a warn event for a settings value that could not be parsed and was skipped.
pub fn warn_rejected_setting(layer: &'static str, key: &str) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(layer, key, "ignoring unparseable setting");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (layer, key);
	}
}

//! Optional observability helpers for broker flows.
//!
//! # Feature Flags
//!
//! - `tracing` (default) emits a span named `oauth2_token_broker.acquire` with `grant` and
//!   `cache_key` (fingerprint) fields, debug events for cache hits/misses, and warn events for
//!   rejected settings values.
//! - `metrics` increments the `oauth2_token_broker_acquire_total` counter labeled by `grant` +
//!   `outcome`.

mod meter;
mod trace;

pub use meter::*;
pub use trace::*;

// self
use crate::_prelude::*;

/// Outcome labels recorded for each acquisition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a broker acquisition.
	Attempt,
	/// Configuration disabled; no token produced.
	Disabled,
	/// Served from the cache without contacting the endpoint.
	CacheHit,
	/// Token endpoint contacted.
	Exchange,
	/// Token returned to the caller.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Disabled => "disabled",
			FlowOutcome::CacheHit => "cache_hit",
			FlowOutcome::Exchange => "exchange",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

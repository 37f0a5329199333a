// self
use crate::{config::GrantType, obs::FlowOutcome};

/// Records an acquisition outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(grant: GrantType, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"oauth2_token_broker_acquire_total",
			"grant" => grant.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (grant, outcome);
	}
}

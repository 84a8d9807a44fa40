// self
use crate::obs::{FlowKind, FlowOutcome};

/// Counts one `outcome` for `kind` on the installed `metrics` recorder; a no-op without the
/// `metrics` feature.
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"admin_session_flow_total",
			"flow" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

// self
use crate::{
	_prelude::*,
	obs::FlowKind,
	session::{RequestState, SessionExpiredReason},
};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// A span builder used by session flows.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the provided flow kind + stage.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("admin_session.flow", flow = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

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

/// Emits an event for the terminal retry state of a request.
pub fn record_request_state(method: &::http::Method, path: &str, status: u16, state: RequestState) {
	#[cfg(feature = "tracing")]
	{
		match state {
			RequestState::RetriedFailed => tracing::warn!(
				method = method.as_str(),
				path,
				status,
				state = state.as_str(),
				"request failed after token refresh"
			),
			_ => tracing::debug!(
				method = method.as_str(),
				path,
				status,
				state = state.as_str(),
				"request completed"
			),
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (method, path, status, state);
	}
}

/// Emits an event when the session is terminated.
pub fn record_session_expired(reason: &SessionExpiredReason) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(reason = %reason, "session expired; stored credentials cleared");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = reason;
	}
}

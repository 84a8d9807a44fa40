//! Session telemetry: spans around sends, refreshes and logins, plus retry and expiry events.
//!
//! Everything here compiles to no-ops unless a feature turns it on:
//!
//! - `tracing` wraps each flow in an `admin_session.flow` span (`flow`, `stage`) and logs the
//!   terminal retry state of every request and every session termination.
//! - `metrics` bumps `admin_session_flow_total{flow, outcome}` once on entry and once on exit.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Which client operation a span or counter belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Authenticated request through [`SessionClient::send`](crate::session::SessionClient::send).
	Send,
	/// Call to the refresh endpoint.
	Refresh,
	/// Credential login.
	Login,
}
impl FlowKind {
	/// Label used for the `flow` field.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Send => "send",
			FlowKind::Refresh => "refresh",
			FlowKind::Login => "login",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Where a flow stands when it is counted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// The operation was entered.
	Attempt,
	/// The caller received `Ok` (or a refreshed credential).
	Success,
	/// The caller received an error (or a refresh failure).
	Failure,
}
impl FlowOutcome {
	/// Label used for the `outcome` field.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
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

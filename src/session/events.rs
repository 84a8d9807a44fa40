//! Session-expired signal emitted to UI-layer listeners.

// self
use crate::{_prelude::*, auth::RefreshFailure, http::ApiResponse, store::StoreError};

/// Callback invoked whenever the client terminates the session.
pub type SessionListener = Arc<dyn Fn(&SessionExpired) + Send + Sync>;

/// Why a session was terminated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionExpiredReason {
	/// The refresh endpoint did not produce a usable credential.
	RefreshFailed(RefreshFailure),
	/// The retried request reported an expired token again.
	ExpiredAfterRetry,
	/// A concurrent request already terminated the session while this one waited.
	ClearedElsewhere,
	/// The caller logged out explicitly.
	LoggedOut,
}
impl Display for SessionExpiredReason {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::RefreshFailed(failure) => write!(f, "token refresh failed: {failure}"),
			Self::ExpiredAfterRetry => f.write_str("token expired again after refresh"),
			Self::ClearedElsewhere => f.write_str("session terminated by a concurrent request"),
			Self::LoggedOut => f.write_str("logged out"),
		}
	}
}

/// Unrecoverable session failure; stored credentials have already been cleared.
///
/// Listeners typically navigate to [`SessionExpired::login_path`]; the client itself never does.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Session expired ({reason}).")]
pub struct SessionExpired {
	/// Why the session ended.
	pub reason: SessionExpiredReason,
	/// Login entry point the UI should navigate to.
	pub login_path: String,
	/// Final backend response, when the failure was observed on one.
	pub response: Option<Box<ApiResponse>>,
	/// Store failure hit while clearing credentials; they may still be on disk.
	pub cleanup_error: Option<StoreError>,
}
impl SessionExpired {
	/// Creates a new signal.
	pub fn new(reason: SessionExpiredReason, login_path: impl Into<String>) -> Self {
		Self { reason, login_path: login_path.into(), response: None, cleanup_error: None }
	}

	/// Attaches the final backend response.
	pub fn with_response(mut self, response: ApiResponse) -> Self {
		self.response = Some(Box::new(response));

		self
	}

	/// Attaches the error raised while clearing stored credentials.
	pub fn with_cleanup_error(mut self, error: StoreError) -> Self {
		self.cleanup_error = Some(error);

		self
	}
}

/// Registered [`SessionListener`]s.
#[derive(Clone, Default)]
pub(crate) struct Listeners(Arc<RwLock<Vec<SessionListener>>>);
impl Listeners {
	pub(crate) fn push(&self, listener: SessionListener) {
		self.0.write().push(listener);
	}

	pub(crate) fn notify(&self, event: &SessionExpired) {
		let snapshot = self.0.read().clone();

		for listener in snapshot {
			listener(event);
		}
	}
}
impl Debug for Listeners {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Listeners({})", self.0.read().len())
	}
}

#![cfg(feature = "reqwest")]

mod common;

// std
use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};
// crates.io
use admin_session::{
	auth::{Credential, RefreshFailure},
	error::Error,
	session::SessionExpiredReason,
};
use httpmock::prelude::*;
use time::Duration;

const RESOURCE: &str = "/admin/api/resource";

fn expired_body() -> serde_json::Value {
	serde_json::json!({ "success": false, "message": "jwt expired" })
}

#[tokio::test]
async fn expired_token_is_refreshed_once_and_the_request_retried() -> color_eyre::Result<()> {
	let server = MockServer::start_async().await;
	let (client, store) = common::reqwest_client(
		common::config_for(&server.base_url()),
		Some(Credential::new("expired-token")),
	);
	let rejected = server
		.mock_async(|when, then| {
			when.method(POST).path(RESOURCE).header("authorization", "Bearer expired-token");
			then.status(401).json_body(expired_body());
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/admin/refresh");
			then.status(200).json_body(serde_json::json!({ "data": { "accessToken": "new-token" } }));
		})
		.await;
	let accepted = server
		.mock_async(|when, then| {
			when.method(POST).path(RESOURCE).header("authorization", "Bearer new-token");
			then.status(200).json_body(serde_json::json!({ "success": true, "data": { "id": 7 } }));
		})
		.await;
	let response =
		client.post_json(RESOURCE, &serde_json::json!({ "name": "Deep clean" })).await?;
	let id: serde_json::Value = response.data()?;

	assert_eq!(id, serde_json::json!({ "id": 7 }));
	assert_eq!(
		store.snapshot().map(|c| c.access_token.expose().to_owned()).as_deref(),
		Some("new-token")
	);
	assert_eq!(client.refresh_metrics.attempts(), 1);
	assert_eq!(client.refresh_metrics.successes(), 1);

	rejected.assert_calls_async(1).await;
	refresh.assert_calls_async(1).await;
	accepted.assert_calls_async(1).await;

	Ok(())
}

#[tokio::test]
async fn refresh_failure_clears_credentials_and_notifies_listeners() {
	let server = MockServer::start_async().await;
	let (client, store) = common::reqwest_client(
		common::config_for(&server.base_url()),
		Some(Credential::new("expired-token").with_refresh_token("stale-refresh")),
	);
	let notified = Arc::new(AtomicUsize::new(0));
	let counter = notified.clone();

	client.on_session_expired(move |expired| {
		assert_eq!(expired.login_path, "/login");
		counter.fetch_add(1, Ordering::SeqCst);
	});

	let rejected = server
		.mock_async(|when, then| {
			when.method(GET).path(RESOURCE);
			then.status(401).json_body(expired_body());
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/admin/refresh");
			then.status(401).json_body(serde_json::json!({ "message": "refresh token revoked" }));
		})
		.await;
	let err = client.get(RESOURCE).await.expect_err("Failed refresh should end the session.");
	let Error::SessionExpired(expired) = err else {
		panic!("Expected a session-expired error, got {err:?}.");
	};

	assert_eq!(
		expired.reason,
		SessionExpiredReason::RefreshFailed(RefreshFailure::Status {
			status: 401,
			message: "refresh token revoked".into(),
		})
	);
	assert!(store.snapshot().is_none());
	assert_eq!(store.raw("authToken"), None);
	assert_eq!(store.raw("refreshToken"), None);
	assert_eq!(notified.load(Ordering::SeqCst), 1);
	assert_eq!(client.refresh_metrics.failures(), 1);

	rejected.assert_calls_async(1).await;
	refresh.assert_calls_async(1).await;
}

#[tokio::test]
async fn other_unauthorized_messages_pass_through_untouched() {
	let server = MockServer::start_async().await;
	let (client, store) = common::reqwest_client(
		common::config_for(&server.base_url()),
		Some(Credential::new("tampered-token")),
	);
	let rejected = server
		.mock_async(|when, then| {
			when.method(GET).path(RESOURCE);
			then.status(401).json_body(serde_json::json!({ "message": "invalid signature" }));
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/admin/refresh");
			then.status(200).json_body(serde_json::json!({ "data": { "accessToken": "unused" } }));
		})
		.await;
	let err = client.get(RESOURCE).await.expect_err("Plain 401 should surface to the caller.");
	let Error::Api { response } = err else {
		panic!("Expected the backend response, got {err:?}.");
	};

	assert_eq!(response.status.as_u16(), 401);
	assert_eq!(response.message().as_deref(), Some("invalid signature"));
	assert_eq!(
		store.snapshot().map(|c| c.access_token.expose().to_owned()).as_deref(),
		Some("tampered-token")
	);

	rejected.assert_calls_async(1).await;
	refresh.assert_calls_async(0).await;
}

#[tokio::test]
async fn server_errors_pass_through_without_refresh() {
	let server = MockServer::start_async().await;
	let (client, _) = common::reqwest_client(
		common::config_for(&server.base_url()),
		Some(Credential::new("valid-token")),
	);
	let failing = server
		.mock_async(|when, then| {
			when.method(DELETE).path("/admin/api/category/3");
			then.status(500).body("upstream unavailable");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/admin/refresh");
			then.status(200);
		})
		.await;
	let err =
		client.delete("/admin/api/category/3").await.expect_err("Server error should surface.");

	assert_eq!(err.status(), Some(500));

	let Error::Api { response } = err else {
		panic!("Expected the backend response, got {err:?}.");
	};

	assert_eq!(response.text(), "upstream unavailable");

	failing.assert_calls_async(1).await;
	refresh.assert_calls_async(0).await;
}

#[tokio::test]
async fn expiry_after_retry_ends_the_session_without_a_second_refresh() {
	let server = MockServer::start_async().await;
	let (client, store) = common::reqwest_client(
		common::config_for(&server.base_url()),
		Some(Credential::new("expired-token")),
	);
	let rejected = server
		.mock_async(|when, then| {
			when.method(GET).path(RESOURCE);
			then.status(401).json_body(expired_body());
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/admin/refresh");
			then.status(200)
				.json_body(serde_json::json!({ "data": { "accessToken": "short-lived-token" } }));
		})
		.await;
	let err = client.get(RESOURCE).await.expect_err("Second expiry should end the session.");

	assert!(err.is_session_expired());
	assert_eq!(err.status(), Some(401));

	let Error::SessionExpired(expired) = err else {
		panic!("Expected a session-expired error.");
	};

	assert_eq!(expired.reason, SessionExpiredReason::ExpiredAfterRetry);
	assert!(store.snapshot().is_none());

	rejected.assert_calls_async(2).await;
	refresh.assert_calls_async(1).await;
}

#[tokio::test]
async fn concurrent_expiries_share_one_refresh() -> color_eyre::Result<()> {
	let server = MockServer::start_async().await;
	let (client, store) = common::reqwest_client(
		common::config_for(&server.base_url()),
		Some(Credential::new("expired-token")),
	);
	let rejected = server
		.mock_async(|when, then| {
			when.method(GET).path(RESOURCE).header("authorization", "Bearer expired-token");
			then.status(401).json_body(expired_body());
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/admin/refresh");
			then.status(200)
				.delay(std::time::Duration::from_millis(200))
				.json_body(serde_json::json!({ "data": { "accessToken": "shared-token" } }));
		})
		.await;
	let accepted = server
		.mock_async(|when, then| {
			when.method(GET).path(RESOURCE).header("authorization", "Bearer shared-token");
			then.status(200).json_body(serde_json::json!({ "success": true, "data": [] }));
		})
		.await;
	let (first, second) = tokio::join!(client.get(RESOURCE), client.get(RESOURCE));

	assert!(first?.is_success());
	assert!(second?.is_success());
	assert_eq!(
		store.snapshot().map(|c| c.access_token.expose().to_owned()).as_deref(),
		Some("shared-token")
	);
	assert_eq!(client.refresh_metrics.attempts(), 1);
	assert_eq!(client.refresh_metrics.coalesced(), 1);

	rejected.assert_calls_async(2).await;
	refresh.assert_calls_async(1).await;
	accepted.assert_calls_async(2).await;

	Ok(())
}

#[tokio::test]
async fn waiters_behind_a_failed_refresh_fail_without_refreshing_again() {
	let server = MockServer::start_async().await;
	let (client, store) = common::reqwest_client(
		common::config_for(&server.base_url()),
		Some(Credential::new("expired-token")),
	);
	let notified = Arc::new(AtomicUsize::new(0));
	let counter = notified.clone();

	client.on_session_expired(move |_| {
		counter.fetch_add(1, Ordering::SeqCst);
	});

	let rejected = server
		.mock_async(|when, then| {
			when.method(GET).path(RESOURCE);
			then.status(401).json_body(expired_body());
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/admin/refresh");
			then.status(401)
				.delay(std::time::Duration::from_millis(200))
				.json_body(serde_json::json!({ "message": "refresh token revoked" }));
		})
		.await;
	let (first, second) = tokio::join!(client.get(RESOURCE), client.get(RESOURCE));
	let mut reasons = [first, second]
		.into_iter()
		.map(|result| match result {
			Err(Error::SessionExpired(expired)) => expired.reason,
			other => panic!("Expected a session-expired error, got {other:?}."),
		})
		.collect::<Vec<_>>();

	reasons.sort_by_key(|reason| matches!(reason, SessionExpiredReason::ClearedElsewhere));

	assert!(matches!(reasons[0], SessionExpiredReason::RefreshFailed(RefreshFailure::Status {
		status: 401,
		..
	})));
	assert_eq!(reasons[1], SessionExpiredReason::ClearedElsewhere);
	assert!(store.snapshot().is_none());
	assert_eq!(notified.load(Ordering::SeqCst), 1);
	assert_eq!(client.refresh_metrics.attempts(), 1);
	assert_eq!(client.refresh_metrics.failures(), 1);
	assert_eq!(client.refresh_metrics.coalesced(), 0);

	rejected.assert_calls_async(2).await;
	refresh.assert_calls_async(1).await;
}

#[tokio::test]
async fn timeouts_surface_as_transport_errors_without_refresh() {
	let server = MockServer::start_async().await;
	let config = admin_session::config::ClientConfig::builder(
		server.base_url().parse().expect("Mock server URL should parse."),
	)
	.timeout(Duration::milliseconds(200))
	.build()
	.expect("Timeout config should build.");
	let (client, store) = common::reqwest_client(config, Some(Credential::new("valid-token")));
	let slow = server
		.mock_async(|when, then| {
			when.method(GET).path(RESOURCE);
			then.status(200).delay(std::time::Duration::from_secs(2));
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/admin/refresh");
			then.status(200);
		})
		.await;
	let err = client.get(RESOURCE).await.expect_err("Slow backend should time out.");
	let Error::Transport(transport) = err else {
		panic!("Expected a transport error, got {err:?}.");
	};

	assert!(transport.is_timeout());
	assert!(store.snapshot().is_some());

	slow.assert_calls_async(1).await;
	refresh.assert_calls_async(0).await;
}

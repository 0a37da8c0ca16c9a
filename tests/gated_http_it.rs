#![cfg(feature = "reqwest")]

// crates.io
use color_eyre::Result as EyreResult;
use httpmock::prelude::*;
// self
use request_gate::{
	_preludet::*,
	failure::{ErrorCodeSource, FailurePayload},
	http::{GatedHttpClient, HttpRequest, ReqwestGatedClient},
};

#[derive(Debug, PartialEq, Eq, Deserialize)]
struct Decision {
	id: u32,
	child: String,
}

fn get(server: &MockServer, path: &str) -> HttpRequest {
	request("GET", server.url(path))
}

fn build_client(capacity: usize, cooldown_ms: i64) -> (ReqwestGatedClient, RecordingSink) {
	let (gate, sink) = build_recording_gate(test_config(capacity, 1_000, cooldown_ms));

	(GatedHttpClient::new(gate, test_reqwest_transport()), sink)
}

#[tokio::test]
async fn success_bodies_are_returned_verbatim() -> EyreResult<()> {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/decisions");
			then.status(200).header("content-type", "application/json").body("[1, 2, 3]");
		})
		.await;
	let (client, sink) = build_client(2, 15_000);
	let response = client.send(get(&server, "/decisions")).await?;

	mock.assert_async().await;

	assert_eq!(response.status().as_u16(), 200);
	assert_eq!(response.body().as_slice(), b"[1, 2, 3]");
	assert_eq!(client.gate().metrics().admitted(), 1);
	assert_eq!(sink.count(), 0);

	Ok(())
}

#[tokio::test]
async fn session_invalid_rejections_notify_once() -> EyreResult<()> {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/children");
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"errors\":[{\"error_code\":\"PE007\",\"message\":\"Session invalid\"}]}");
		})
		.await;
	let (client, sink) = build_client(4, 15_000);

	for _ in 0..2 {
		let err = client
			.send(get(&server, "/children"))
			.await
			.expect_err("Unauthorized responses should surface to the caller.");

		assert!(matches!(err, Error::Rejected { status: 401, .. }));
		assert_eq!(err.error_codes(), vec!["PE007"]);
	}

	mock.assert_calls_async(2).await;

	assert_eq!(sink.count(), 1);
	assert_eq!(client.gate().metrics().suppressed(), 1);

	Ok(())
}

#[tokio::test]
async fn other_rejections_keep_their_payload_without_notifying() -> EyreResult<()> {
	let server = MockServer::start_async().await;
	let _mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/statistics");
			then.status(429)
				.header("content-type", "application/json")
				.header("retry-after", "7")
				.body("[{\"error_code\":\"PE429\"}]");
		})
		.await;
	let (client, sink) = build_client(4, 0);
	let err = client
		.send(get(&server, "/statistics"))
		.await
		.expect_err("Throttled responses should surface to the caller.");
	let (status, failure, retry_after) = match err {
		Error::Rejected { status, failure, retry_after } => (status, failure, retry_after),
		other => panic!("Expected a rejected error, got {other:?}."),
	};

	assert_eq!(status, 429);
	assert_eq!(failure, FailurePayload::from_codes(["PE429"]));
	assert_eq!(retry_after, Some(Duration::seconds(7)));
	assert_eq!(sink.count(), 0);

	Ok(())
}

#[tokio::test]
async fn send_json_decodes_and_reports_paths() -> EyreResult<()> {
	let server = MockServer::start_async().await;
	let _ok = server
		.mock_async(|when, then| {
			when.method(GET).path("/decision/1");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"id\":1,\"child\":\"Mia\"}");
		})
		.await;
	let _bad = server
		.mock_async(|when, then| {
			when.method(GET).path("/decision/2");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"id\":\"two\",\"child\":\"Noah\"}");
		})
		.await;
	let (client, _) = build_client(4, 15_000);
	let decision: Decision = client.send_json(get(&server, "/decision/1")).await?;

	assert_eq!(decision, Decision { id: 1, child: "Mia".into() });

	let err = client
		.send_json::<Decision>(get(&server, "/decision/2"))
		.await
		.expect_err("Mistyped fields should fail to decode.");
	let (source, status) = match err {
		Error::Decode { source, status } => (source, status),
		other => panic!("Expected a decode error, got {other:?}."),
	};

	assert_eq!(status, 200);
	assert_eq!(source.path().to_string(), "id");

	Ok(())
}

#[tokio::test]
async fn unreachable_hosts_map_to_transport_errors() {
	let (client, sink) = build_client(1, 15_000);
	let err = client
		.send(request("GET", "http://127.0.0.1:9/unreachable"))
		.await
		.expect_err("Connecting to a closed port should fail.");

	assert!(matches!(err, Error::Transport(_)));
	assert!(err.error_codes().is_empty());
	assert_eq!(sink.count(), 0);
}

//! HTTP integration: a transport seam plus a client that routes every request through a gate.
//!
//! [`HttpTransport`] is the crate's only dependency on an HTTP stack. [`GatedHttpClient`] wraps a
//! transport and a [`Gate`], so each request waits for admission, non-success responses become
//! [`Error::Rejected`] with their parsed [`FailurePayload`], and recognized error codes in those
//! payloads drive the gate's session-expired notification.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
use http::{HeaderMap, header::RETRY_AFTER};
use serde::de::DeserializeOwned;
use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, error::TransportError, failure::FailurePayload, gate::Gate};

/// Outbound request with a buffered body.
pub type HttpRequest = http::Request<Vec<u8>>;
/// Inbound response with a buffered body.
pub type HttpResponse = http::Response<Vec<u8>>;

/// Boxed future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of executing one buffered request.
///
/// Implementations report every HTTP response (successful or not) as `Ok`; only failures to
/// obtain a response at all belong in [`TransportError`]. Status interpretation happens in
/// [`GatedHttpClient`].
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and buffers the response.
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_>;
}
impl<T> HttpTransport for Arc<T>
where
	T: ?Sized + HttpTransport,
{
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
		(**self).execute(request)
	}
}

/// Client that admits each request through a [`Gate`] before handing it to the transport.
pub struct GatedHttpClient<T>
where
	T: ?Sized + HttpTransport,
{
	gate: Gate,
	transport: Arc<T>,
}
impl<T> GatedHttpClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a client that owns `transport`.
	pub fn new(gate: Gate, transport: T) -> Self
	where
		T: Sized,
	{
		Self::with_shared(gate, Arc::new(transport))
	}

	/// Creates a client over a transport shared with other holders.
	///
	/// Clients built from clones of the same [`Gate`] share permits and the notification
	/// cooldown.
	pub fn with_shared(gate: Gate, transport: Arc<T>) -> Self {
		Self { gate, transport }
	}

	/// Gate the client submits through.
	pub fn gate(&self) -> &Gate {
		&self.gate
	}

	/// Underlying transport.
	pub fn transport(&self) -> &T {
		&self.transport
	}

	/// Sends `request` once admitted and returns the response for 2xx statuses.
	///
	/// Any other status yields [`Error::Rejected`]; its error codes are classified by the gate
	/// before the error is returned.
	pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
		let transport = Arc::clone(&self.transport);

		self.gate
			.submit(move || async move {
				let response = transport.execute(request).await?;

				check_status(response)
			})
			.await
	}

	/// Sends `request` and decodes a successful JSON body into `D`.
	pub async fn send_json<D>(&self, request: HttpRequest) -> Result<D>
	where
		D: DeserializeOwned,
	{
		let response = self.send(request).await?;
		let status = response.status().as_u16();
		let mut de = serde_json::Deserializer::from_slice(response.body());

		serde_path_to_error::deserialize(&mut de).map_err(|source| Error::Decode { source, status })
	}
}
impl<T> Clone for GatedHttpClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self { gate: self.gate.clone(), transport: Arc::clone(&self.transport) }
	}
}
impl<T> Debug for GatedHttpClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("GatedHttpClient").field("gate", &self.gate).finish()
	}
}

/// Thin wrapper around [`ReqwestClient`] implementing [`HttpTransport`].
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let response = client.execute(request.try_into()?).await?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new = HttpResponse::new(response.bytes().await?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

#[cfg(feature = "reqwest")]
/// Gated client specialized for the default reqwest transport.
pub type ReqwestGatedClient = GatedHttpClient<ReqwestTransport>;

#[cfg(feature = "reqwest")]
impl GatedHttpClient<ReqwestTransport> {
	/// Creates a client backed by a default reqwest transport.
	pub fn reqwest(gate: Gate) -> Self {
		Self::new(gate, ReqwestTransport::default())
	}
}

fn check_status(response: HttpResponse) -> Result<HttpResponse> {
	let status = response.status();

	if status.is_success() {
		return Ok(response);
	}

	let failure = FailurePayload::from_json_slice(response.body()).unwrap_or_default();
	let retry_after = parse_retry_after(response.headers());

	Err(Error::Rejected { status: status.as_u16(), failure, retry_after })
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u32>() {
		return Some(Duration::seconds(i64::from(secs)));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}

#[cfg(test)]
mod tests {
	// crates.io
	use http::{HeaderValue, StatusCode};
	// self
	use super::*;

	fn response(status: StatusCode, body: &str) -> HttpResponse {
		let mut response = HttpResponse::new(body.as_bytes().to_vec());

		*response.status_mut() = status;

		response
	}

	#[test]
	fn retry_after_accepts_seconds_and_dates() {
		let mut headers = HeaderMap::new();

		assert_eq!(parse_retry_after(&headers), None);

		headers.insert(RETRY_AFTER, HeaderValue::from_static(" 30 "));

		assert_eq!(parse_retry_after(&headers), Some(Duration::seconds(30)));

		headers.insert(RETRY_AFTER, HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"));

		assert_eq!(parse_retry_after(&headers), None, "Past dates carry no wait.");

		let future = (OffsetDateTime::now_utc() + Duration::hours(1))
			.format(&Rfc2822)
			.expect("Future instant should format as RFC 2822.");

		headers.insert(
			RETRY_AFTER,
			HeaderValue::from_str(&future).expect("Formatted date should be a valid header."),
		);

		let wait = parse_retry_after(&headers).expect("Future dates should yield a wait.");

		assert!(wait > Duration::minutes(58) && wait <= Duration::hours(1));

		headers.insert(RETRY_AFTER, HeaderValue::from_static("soon"));

		assert_eq!(parse_retry_after(&headers), None);
	}

	#[test]
	fn check_status_passes_success_and_wraps_failures() {
		let ok = check_status(response(StatusCode::OK, "{\"id\":1}"))
			.expect("2xx responses should pass through.");

		assert_eq!(ok.body(), b"{\"id\":1}");

		let err = check_status(response(
			StatusCode::UNAUTHORIZED,
			r#"{"errors":[{"error_code":"PE007"}]}"#,
		))
		.expect_err("4xx responses should be rejected.");
		let (status, failure, retry_after) = match err {
			Error::Rejected { status, failure, retry_after } => (status, failure, retry_after),
			other => panic!("Expected a rejected error, got {other:?}."),
		};

		assert_eq!(status, 401);
		assert_eq!(failure, FailurePayload::from_codes(["PE007"]));
		assert_eq!(retry_after, None);

		let err = check_status(response(StatusCode::BAD_GATEWAY, "<html></html>"))
			.expect_err("5xx responses should be rejected.");

		assert!(matches!(err, Error::Rejected { status: 502, ref failure, .. } if failure.is_empty()));
	}
}

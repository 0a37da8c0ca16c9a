//! Bounded request admission gate: timed-release concurrency limits, FIFO queueing, and
//! cooldown-gated session-expiry signals for outbound HTTP calls.
//!
//! The crate centres on [`gate::Gate`]. Every submitted work item waits for one of `N` permits,
//! consumes it, and schedules its return after a fixed release delay regardless of when the
//! work item itself completes. Failures whose structured payload carries a recognized error
//! code (`PE007` by default) fire a "session expired" notification at most once per cooldown
//! window, while the failure itself still flows back to the caller untouched.
//!
//! [`http::GatedHttpClient`] wires the gate in front of an HTTP transport the way a client-side
//! interceptor would.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod config;
pub mod error;
pub mod failure;
pub mod gate;
pub mod http;
pub mod obs;
pub mod session;

#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// std
	pub use std::{convert::Infallible, time::Duration as StdDuration};

	// self
	#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;
	use crate::{
		config::GateConfig,
		gate::Gate,
		http::HttpRequest,
		session::{SessionExpired, SessionExpiredSink},
	};

	/// Sink that keeps every delivered [`SessionExpired`] event for later inspection.
	#[derive(Clone, Debug, Default)]
	pub struct RecordingSink(Arc<Mutex<Vec<SessionExpired>>>);
	impl RecordingSink {
		/// Returns a snapshot of the recorded events.
		pub fn events(&self) -> Vec<SessionExpired> {
			self.0.lock().clone()
		}

		/// Returns how many notifications were delivered.
		pub fn count(&self) -> usize {
			self.0.lock().len()
		}
	}
	impl SessionExpiredSink for RecordingSink {
		fn session_expired(&self, event: &SessionExpired) {
			self.0.lock().push(event.clone());
		}
	}

	/// Builds a validated config with the provided capacity, release delay, and cooldown
	/// expressed in milliseconds.
	pub fn test_config(capacity: usize, release_delay_ms: i64, cooldown_ms: i64) -> GateConfig {
		GateConfig::builder()
			.capacity(capacity)
			.release_delay(Duration::milliseconds(release_delay_ms))
			.cooldown(Duration::milliseconds(cooldown_ms))
			.build()
			.expect("Test gate configuration should be valid.")
	}

	/// Builds a gate whose session-expired notifications land in the returned [`RecordingSink`].
	pub fn build_recording_gate(config: GateConfig) -> (Gate, RecordingSink) {
		let sink = RecordingSink::default();
		let gate = Gate::with_sink(config, sink.clone());

		(gate, sink)
	}

	/// Builds a bodiless request for `uri` with the provided method.
	pub fn request(method: &str, uri: impl AsRef<str>) -> HttpRequest {
		::http::Request::builder()
			.method(method)
			.uri(uri.as_ref())
			.body(Vec::new())
			.expect("Test request should build successfully.")
	}

	/// Builds a reqwest transport that accepts the self-signed certificates served by mock
	/// servers.
	#[cfg(feature = "reqwest")]
	pub fn test_reqwest_transport() -> ReqwestTransport {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestTransport::with_client(client)
	}
}

mod _prelude {
	pub use std::{
		collections::BTreeSet,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};

	pub use crate::error::{Error, Result};
}

pub use ::http as http_types;
#[cfg(feature = "reqwest")] pub use reqwest;
#[cfg(test)] use {color_eyre as _, httpmock as _};

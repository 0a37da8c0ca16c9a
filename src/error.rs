//! Crate-level error types shared by configuration, transports, and the HTTP interceptor.
//!
//! The gate itself never fails on its own account: [`Gate::submit`](crate::gate::Gate::submit)
//! hands back whatever the work item produced. These types cover everything around it.

// self
use crate::{_prelude::*, failure::FailurePayload};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by the HTTP integration.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, request construction).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Upstream answered with a non-success status.
	#[error("Upstream rejected the request with status {status}.")]
	Rejected {
		/// HTTP status code returned by the upstream service.
		status: u16,
		/// Structured failure payload; empty when the body carried none.
		failure: FailurePayload,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Upstream answered successfully but the body did not match the expected shape.
	#[error("Response body could not be decoded.")]
	Decode {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the decoded response.
		status: u16,
	},
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Capacity must admit at least one work item.
	#[error("Gate capacity must be greater than zero.")]
	ZeroCapacity,
	/// Capacity exceeds what the underlying semaphore can track.
	#[error("Gate capacity {capacity} exceeds the supported maximum of {max}.")]
	CapacityTooLarge {
		/// Requested capacity.
		capacity: usize,
		/// Largest supported capacity.
		max: usize,
	},
	/// A timing option was negative.
	#[error("The {field} duration must not be negative.")]
	NegativeDuration {
		/// Name of the offending option.
		field: &'static str,
	},
	/// A recognized error code was blank.
	#[error("Recognized error codes must not be blank.")]
	EmptyErrorCode,
	/// Configuration document could not be parsed.
	#[error("Gate configuration is malformed.")]
	Parse {
		/// Structured parsing failure including the offending path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the upstream service.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the upstream service.")]
	Io(#[from] std::io::Error),
	/// Request or response could not be assembled.
	#[error(transparent)]
	Http(#[from] http::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

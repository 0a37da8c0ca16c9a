//! Structured failure payloads and the [`ErrorCodeSource`] contract the gate classifies.

// std
use std::convert::Infallible;
// crates.io
use serde_json::Value;
// self
use crate::_prelude::*;

/// Exposes the error codes embedded in a failed work item's outcome.
///
/// The gate calls this on every `Err` it observes and hands the codes to its
/// [`FailureClassifier`](crate::session::FailureClassifier).
pub trait ErrorCodeSource {
	/// Returns zero or more error codes carried by the failure.
	fn error_codes(&self) -> Vec<&str>;
}
impl ErrorCodeSource for Infallible {
	fn error_codes(&self) -> Vec<&str> {
		match *self {}
	}
}
impl<T> ErrorCodeSource for Box<T>
where
	T: ?Sized + ErrorCodeSource,
{
	fn error_codes(&self) -> Vec<&str> {
		(**self).error_codes()
	}
}

/// One entry of a backend failure body.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureEntry {
	/// Machine-readable error code such as `PE007`.
	#[serde(default)]
	pub error_code: Option<String>,
	/// Optional human-readable message.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
}

impl FailureEntry {
	fn from_value(value: &Value) -> Option<Self> {
		let fields = value.as_object()?;
		let text = |key: &str| fields.get(key).and_then(Value::as_str).map(str::to_owned);

		Some(Self { error_code: text("error_code"), message: text("message") })
	}
}

/// Failure body returned by the backend: `{"errors": [{"error_code": "..."}]}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailurePayload {
	/// Failure entries; may be empty.
	#[serde(default)]
	pub errors: Vec<FailureEntry>,
}
impl FailurePayload {
	/// Builds a payload carrying one entry per code.
	pub fn from_codes<I, S>(codes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let errors = codes
			.into_iter()
			.map(|code| FailureEntry { error_code: Some(code.into()), message: None })
			.collect();

		Self { errors }
	}

	/// Parses a failure body, accepting both the wrapped object and a bare entry array.
	///
	/// Entries are read one by one: a non-object entry is skipped and a mistyped field reads as
	/// absent, so one malformed entry never hides the codes of its siblings. Returns `None` when
	/// the body is not JSON or has neither shape.
	pub fn from_json_slice(body: &[u8]) -> Option<Self> {
		let entries = match serde_json::from_slice::<Value>(body).ok()? {
			Value::Array(entries) => entries,
			Value::Object(mut fields) => match fields.remove("errors") {
				Some(Value::Array(entries)) => entries,
				None | Some(Value::Null) => Vec::new(),
				Some(_) => return None,
			},
			_ => return None,
		};

		Some(Self { errors: entries.iter().filter_map(FailureEntry::from_value).collect() })
	}

	/// Returns `true` when no entry is present.
	pub fn is_empty(&self) -> bool {
		self.errors.is_empty()
	}
}
impl ErrorCodeSource for FailurePayload {
	fn error_codes(&self) -> Vec<&str> {
		self.errors.iter().filter_map(|entry| entry.error_code.as_deref()).collect()
	}
}
impl ErrorCodeSource for Error {
	fn error_codes(&self) -> Vec<&str> {
		match self {
			Self::Rejected { failure, .. } => failure.error_codes(),
			_ => Vec::new(),
		}
	}
}

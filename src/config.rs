//! Gate configuration: capacity, release delay, notification cooldown, and recognized codes.
//!
//! Values can be assembled with [`GateConfig::builder`] or loaded from JSON through
//! [`GateConfig::from_json_str`]. Durations travel as integer milliseconds on the wire
//! (`release_delay_ms`, `cooldown_ms`) and missing fields fall back to the defaults.

// std
use std::time::Duration as StdDuration;
// crates.io
use tokio::sync::Semaphore;
// self
use crate::{_prelude::*, error::ConfigError};

/// Validated settings consumed by [`Gate`](crate::gate::Gate).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
	/// Maximum number of work items admitted per release window.
	pub capacity: usize,
	/// Delay after admission before the consumed permit is returned.
	#[serde(rename = "release_delay_ms", with = "millis")]
	pub release_delay: Duration,
	/// Minimum spacing between two session-expired notifications.
	#[serde(rename = "cooldown_ms", with = "millis")]
	pub cooldown: Duration,
	/// Error codes that mark a failure as a session-invalid signal.
	pub recognized_error_codes: BTreeSet<String>,
}
impl GateConfig {
	/// Default admission capacity.
	pub const DEFAULT_CAPACITY: usize = 15;
	/// Default release delay.
	pub const DEFAULT_RELEASE_DELAY: Duration = Duration::milliseconds(1_000);
	/// Default notification cooldown.
	pub const DEFAULT_COOLDOWN: Duration = Duration::milliseconds(15_000);
	/// Default session-invalid error code.
	pub const SESSION_INVALID_CODE: &'static str = "PE007";

	/// Starts a builder seeded with the defaults.
	pub fn builder() -> GateConfigBuilder {
		GateConfigBuilder::default()
	}

	/// Parses and validates a JSON document.
	pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
		let mut de = serde_json::Deserializer::from_str(raw);
		let config: Self = serde_path_to_error::deserialize(&mut de)
			.map_err(|source| ConfigError::Parse { source })?;

		config.validate()?;

		Ok(config)
	}

	/// Checks the invariants every gate relies on.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.capacity == 0 {
			return Err(ConfigError::ZeroCapacity);
		}
		if self.capacity > Semaphore::MAX_PERMITS {
			return Err(ConfigError::CapacityTooLarge {
				capacity: self.capacity,
				max: Semaphore::MAX_PERMITS,
			});
		}
		if self.release_delay.is_negative() {
			return Err(ConfigError::NegativeDuration { field: "release_delay" });
		}
		if self.cooldown.is_negative() {
			return Err(ConfigError::NegativeDuration { field: "cooldown" });
		}
		if self.recognized_error_codes.iter().any(|code| code.trim().is_empty()) {
			return Err(ConfigError::EmptyErrorCode);
		}

		Ok(())
	}

	pub(crate) fn release_delay_std(&self) -> StdDuration {
		self.release_delay.unsigned_abs()
	}

	pub(crate) fn cooldown_std(&self) -> StdDuration {
		self.cooldown.unsigned_abs()
	}
}
impl Default for GateConfig {
	fn default() -> Self {
		Self {
			capacity: Self::DEFAULT_CAPACITY,
			release_delay: Self::DEFAULT_RELEASE_DELAY,
			cooldown: Self::DEFAULT_COOLDOWN,
			recognized_error_codes: BTreeSet::from([Self::SESSION_INVALID_CODE.to_owned()]),
		}
	}
}

/// Builder for [`GateConfig`] values.
#[derive(Debug, Default)]
pub struct GateConfigBuilder {
	/// Configuration under construction.
	pub config: GateConfig,
}
impl GateConfigBuilder {
	/// Sets the admission capacity.
	pub fn capacity(mut self, capacity: usize) -> Self {
		self.config.capacity = capacity;

		self
	}

	/// Sets the release delay.
	pub fn release_delay(mut self, delay: Duration) -> Self {
		self.config.release_delay = delay;

		self
	}

	/// Sets the notification cooldown.
	pub fn cooldown(mut self, cooldown: Duration) -> Self {
		self.config.cooldown = cooldown;

		self
	}

	/// Adds one code to the recognized set.
	pub fn recognize(mut self, code: impl Into<String>) -> Self {
		self.config.recognized_error_codes.insert(code.into());

		self
	}

	/// Replaces the recognized set.
	pub fn recognized_error_codes<I, S>(mut self, codes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.config.recognized_error_codes = codes.into_iter().map(Into::into).collect();

		self
	}

	/// Consumes the builder and validates the resulting config.
	pub fn build(self) -> Result<GateConfig, ConfigError> {
		self.config.validate()?;

		Ok(self.config)
	}
}

mod millis {
	// crates.io
	use serde::{Deserialize, Deserializer, Serializer};
	use time::Duration;

	pub(super) fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_i64(i64::try_from(value.whole_milliseconds()).unwrap_or(i64::MAX))
	}

	pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
	where
		D: Deserializer<'de>,
	{
		i64::deserialize(deserializer).map(Duration::milliseconds)
	}
}

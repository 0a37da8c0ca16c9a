//! Optional observability helpers for gate activity.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to run each submission inside a `request_gate.submit` span carrying the
//!   `ticket` and `stage` fields, and to log gate events (`warn` for delivered session-expired
//!   notifications, `debug` for everything else).
//! - Enable `metrics` to increment the `request_gate_events_total` counter labeled by `event`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Lifecycle events observed by the gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GateEvent {
	/// A work item entered the gate.
	Submitted,
	/// A work item consumed a permit.
	Admitted,
	/// A release timer returned a permit.
	Released,
	/// A session-expired notification was delivered.
	Notified,
	/// A recognized failure landed inside the cooldown window.
	Suppressed,
}
impl GateEvent {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			GateEvent::Submitted => "submitted",
			GateEvent::Admitted => "admitted",
			GateEvent::Released => "released",
			GateEvent::Notified => "notified",
			GateEvent::Suppressed => "suppressed",
		}
	}
}
impl Display for GateEvent {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Records an event through every enabled backend.
pub(crate) fn emit(event: GateEvent, ticket: Option<u64>) {
	record_gate_event(event);
	trace_gate_event(event, ticket);
}

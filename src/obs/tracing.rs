// self
use crate::{_prelude::*, obs::GateEvent};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedGate<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedGate<F> = F;

/// A span builder used around gate submissions.
#[derive(Clone, Debug)]
pub struct GateSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl GateSpan {
	/// Creates a new span tagged with the submission ticket + stage.
	pub fn new(ticket: u64, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("request_gate.submit", ticket, stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (ticket, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedGate<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Logs a gate event (when enabled).
pub fn trace_gate_event(event: GateEvent, ticket: Option<u64>) {
	#[cfg(feature = "tracing")]
	{
		match event {
			GateEvent::Notified =>
				tracing::warn!(ticket = ?ticket, event = event.as_str(), "session expired"),
			_ => tracing::debug!(ticket = ?ticket, event = event.as_str(), "gate event"),
		}
	}

	#[cfg(not(feature = "tracing"))]
	{
		let _ = (event, ticket);
	}
}

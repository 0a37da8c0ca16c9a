// self
use crate::obs::GateEvent;

/// Records a gate event via the global metrics recorder (when enabled).
pub fn record_gate_event(event: GateEvent) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("request_gate_events_total", "event" => event.as_str()).increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = event;
	}
}

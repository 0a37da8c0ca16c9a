// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing gate activity.
#[derive(Debug, Default)]
pub struct GateMetrics {
	submitted: AtomicU64,
	admitted: AtomicU64,
	released: AtomicU64,
	notified: AtomicU64,
	suppressed: AtomicU64,
}
impl GateMetrics {
	/// Returns the number of queued submissions (including ones later abandoned).
	pub fn submitted(&self) -> u64 {
		self.submitted.load(Ordering::Relaxed)
	}

	/// Returns the number of admitted work items.
	pub fn admitted(&self) -> u64 {
		self.admitted.load(Ordering::Relaxed)
	}

	/// Returns the number of permits returned by release timers.
	pub fn released(&self) -> u64 {
		self.released.load(Ordering::Relaxed)
	}

	/// Returns the number of delivered session-expired notifications.
	pub fn notified(&self) -> u64 {
		self.notified.load(Ordering::Relaxed)
	}

	/// Returns the number of recognized failures swallowed by the cooldown.
	pub fn suppressed(&self) -> u64 {
		self.suppressed.load(Ordering::Relaxed)
	}

	/// Returns admissions whose release timer has not fired yet.
	pub fn pending_releases(&self) -> u64 {
		self.admitted().saturating_sub(self.released())
	}

	pub(crate) fn record_submitted(&self) {
		self.submitted.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_admitted(&self) {
		self.admitted.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_released(&self) {
		self.released.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_notified(&self) {
		self.notified.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_suppressed(&self) {
		self.suppressed.fetch_add(1, Ordering::Relaxed);
	}
}

//! Bounded request admission gate with timed permit release and session-expiry detection.
//!
//! [`Gate::submit`] waits (in arrival order) for one of the configured permits, consumes it,
//! schedules its return after the release delay, and only then starts the work item. The release
//! timer is detached from the work item: a permit comes back after the delay whether the work
//! finished long ago or is still running, and it cannot be cancelled. Available permits therefore
//! stay within `[0, capacity]`, while the number of work items still running may exceed the
//! capacity when they outlive the release delay.
//!
//! Failed outcomes are classified through the gate's [`SessionWatch`]; the outcome itself is
//! always returned to the caller unchanged.
//!
//! Release timers are spawned on the ambient Tokio runtime, so gates must be driven from within
//! one.

mod metrics;
mod pool;

pub use metrics::GateMetrics;
pub use pool::CapacityPool;

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::{
	_prelude::*,
	config::GateConfig,
	failure::ErrorCodeSource,
	obs::{self, GateEvent, GateSpan},
	session::{
		FailureClassifier, NoopSink, RecognizedCodes, SessionExpiredSink, SessionWatch, Verdict,
	},
};

/// Shared admission gate; clones share permits, cooldown state, and metrics.
#[derive(Clone)]
pub struct Gate {
	inner: Arc<GateInner>,
}
impl Gate {
	/// Creates a gate that classifies with the configured codes and discards notifications.
	pub fn new(config: GateConfig) -> Self {
		Self::with_sink(config, NoopSink)
	}

	/// Creates a gate that classifies with the configured codes and notifies `sink`.
	pub fn with_sink(config: GateConfig, sink: impl 'static + SessionExpiredSink) -> Self {
		let classifier = RecognizedCodes::new(config.recognized_error_codes.iter().cloned());

		Self::with_parts(config, classifier, sink)
	}

	/// Creates a gate with a custom classifier predicate and sink.
	///
	/// The classifier replaces `config.recognized_error_codes`.
	pub fn with_parts(
		config: GateConfig,
		classifier: impl 'static + FailureClassifier,
		sink: impl 'static + SessionExpiredSink,
	) -> Self {
		let pool = Arc::new(CapacityPool::new(config.capacity));
		let session = SessionWatch::new(config.cooldown_std(), classifier, sink);

		Self {
			inner: Arc::new(GateInner {
				config,
				pool,
				session,
				metrics: Default::default(),
				next_ticket: AtomicU64::new(1),
			}),
		}
	}

	/// Runs `work` once a permit is available and returns its outcome untouched.
	///
	/// `work` is not invoked before admission. Dropping the returned future while it is still
	/// queued withdraws the submission; once admitted, the permit's release timer is already
	/// running and is unaffected by what happens to the work item.
	pub async fn submit<W, Fut, T, E>(&self, work: W) -> Result<T, E>
	where
		W: FnOnce() -> Fut,
		Fut: Future<Output = Result<T, E>>,
		E: ErrorCodeSource,
	{
		let ticket = self.inner.next_ticket();
		let span = GateSpan::new(ticket, "submit");

		span.instrument(async move {
			self.inner.metrics.record_submitted();
			obs::emit(GateEvent::Submitted, Some(ticket));
			self.inner.pool.acquire().await;
			self.inner.admit(ticket);

			self.run(ticket, work).await
		})
		.await
	}

	/// Admits `work` only if a permit is available right now.
	///
	/// Returns `None` without queueing when the gate is saturated. On success the permit is
	/// consumed and its release timer started before this returns; the work item starts when
	/// the returned future is first polled.
	pub fn try_submit<W, Fut, T, E>(&self, work: W) -> Option<impl Future<Output = Result<T, E>>>
	where
		W: FnOnce() -> Fut,
		Fut: Future<Output = Result<T, E>>,
		E: ErrorCodeSource,
	{
		if !self.inner.pool.try_acquire() {
			return None;
		}

		let ticket = self.inner.next_ticket();

		self.inner.metrics.record_submitted();
		obs::emit(GateEvent::Submitted, Some(ticket));
		self.inner.admit(ticket);

		let span = GateSpan::new(ticket, "try_submit");

		Some(span.instrument(self.run(ticket, work)))
	}

	/// Classifies a failure observed outside [`submit`](Self::submit).
	pub fn notify_failure(&self, codes: &[&str]) -> Verdict {
		self.inner.observe(codes, None)
	}

	/// Number of permits available right now.
	pub fn available(&self) -> usize {
		self.inner.pool.available()
	}

	/// Configured number of permits.
	pub fn capacity(&self) -> usize {
		self.inner.pool.capacity()
	}

	/// Configuration the gate was built from.
	pub fn config(&self) -> &GateConfig {
		&self.inner.config
	}

	/// Activity counters.
	pub fn metrics(&self) -> &GateMetrics {
		&self.inner.metrics
	}

	/// Session watcher driving the notification path.
	pub fn session(&self) -> &SessionWatch {
		&self.inner.session
	}

	async fn run<W, Fut, T, E>(&self, ticket: u64, work: W) -> Result<T, E>
	where
		W: FnOnce() -> Fut,
		Fut: Future<Output = Result<T, E>>,
		E: ErrorCodeSource,
	{
		let outcome = work().await;

		if let Err(err) = &outcome {
			self.inner.observe(&err.error_codes(), Some(ticket));
		}

		outcome
	}
}
impl Debug for Gate {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Gate")
			.field("config", &self.inner.config)
			.field("available", &self.available())
			.field("session", &self.inner.session)
			.finish()
	}
}

struct GateInner {
	config: GateConfig,
	pool: Arc<CapacityPool>,
	session: SessionWatch,
	metrics: GateMetrics,
	next_ticket: AtomicU64,
}
impl GateInner {
	fn next_ticket(&self) -> u64 {
		self.next_ticket.fetch_add(1, Ordering::Relaxed)
	}

	fn admit(self: &Arc<Self>, ticket: u64) {
		self.metrics.record_admitted();
		obs::emit(GateEvent::Admitted, Some(ticket));

		let inner = Arc::clone(self);

		self.pool.release_after(self.config.release_delay_std(), move || {
			inner.metrics.record_released();
			obs::emit(GateEvent::Released, Some(ticket));
		});
	}

	fn observe(&self, codes: &[&str], ticket: Option<u64>) -> Verdict {
		let verdict = self.session.observe(codes, ticket);

		match verdict {
			Verdict::Notified => {
				self.metrics.record_notified();
				obs::emit(GateEvent::Notified, ticket);
			},
			Verdict::Suppressed => {
				self.metrics.record_suppressed();
				obs::emit(GateEvent::Suppressed, ticket);
			},
			Verdict::Ignored => (),
		}

		verdict
	}
}

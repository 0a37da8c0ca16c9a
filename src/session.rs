//! Session-invalid classification and the cooldown-gated notification path.
//!
//! A [`SessionWatch`] combines a [`FailureClassifier`] (pure predicate over error codes) with a
//! [`SessionExpiredSink`]. Matching failures fire the sink at most once per cooldown window;
//! suppressed matches leave the window untouched.

// std
use std::time::Duration as StdDuration;
// crates.io
use tokio::time::Instant;
// self
use crate::_prelude::*;

/// Predicate deciding whether a failure's error codes signal an invalid session.
pub trait FailureClassifier
where
	Self: Send + Sync,
{
	/// Returns `true` when the codes mark the session as invalid.
	fn is_session_invalid(&self, codes: &[&str]) -> bool;
}
impl<F> FailureClassifier for F
where
	F: Fn(&[&str]) -> bool + Send + Sync,
{
	fn is_session_invalid(&self, codes: &[&str]) -> bool {
		self(codes)
	}
}

/// Classifier matching any code from a fixed set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecognizedCodes(BTreeSet<String>);
impl RecognizedCodes {
	/// Creates a classifier from the provided codes.
	pub fn new<I, S>(codes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self(codes.into_iter().map(Into::into).collect())
	}

	/// Returns the recognized codes.
	pub fn codes(&self) -> &BTreeSet<String> {
		&self.0
	}
}
impl FailureClassifier for RecognizedCodes {
	fn is_session_invalid(&self, codes: &[&str]) -> bool {
		codes.iter().any(|code| self.0.contains(*code))
	}
}

/// Notification delivered when a recognized failure escapes the cooldown window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionExpired {
	/// Codes carried by the failure that triggered the notification.
	pub codes: Vec<String>,
	/// Ticket of the submission that failed, when the failure came through the gate.
	pub ticket: Option<u64>,
	/// Wall-clock instant the failure was observed.
	pub observed_at: OffsetDateTime,
}

/// Receiver for session-expired notifications (e.g. a redirect-to-login trigger).
///
/// Implementations run inline on the task that observed the failure, so they should hand
/// heavy work off elsewhere.
pub trait SessionExpiredSink
where
	Self: Send + Sync,
{
	/// Called at most once per cooldown window.
	fn session_expired(&self, event: &SessionExpired);
}
impl<F> SessionExpiredSink for F
where
	F: Fn(&SessionExpired) + Send + Sync,
{
	fn session_expired(&self, event: &SessionExpired) {
		self(event)
	}
}

/// Sink that drops every notification.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;
impl SessionExpiredSink for NoopSink {
	fn session_expired(&self, _: &SessionExpired) {}
}

/// Result of handing a failure to [`SessionWatch::observe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
	/// The codes were not recognized.
	Ignored,
	/// The sink was notified and the cooldown window restarted.
	Notified,
	/// The codes were recognized but the cooldown window is still open.
	Suppressed,
}

/// Cooldown-gated bridge between a classifier and a sink.
pub struct SessionWatch {
	cooldown: StdDuration,
	classifier: Box<dyn FailureClassifier>,
	sink: Box<dyn SessionExpiredSink>,
	last_notified: Mutex<Option<Instant>>,
}
impl SessionWatch {
	/// Creates a watch with the provided cooldown, classifier, and sink.
	pub fn new(
		cooldown: StdDuration,
		classifier: impl 'static + FailureClassifier,
		sink: impl 'static + SessionExpiredSink,
	) -> Self {
		Self {
			cooldown,
			classifier: Box::new(classifier),
			sink: Box::new(sink),
			last_notified: Mutex::new(None),
		}
	}

	/// Classifies a failure and notifies the sink when it is recognized and outside the
	/// cooldown window.
	pub fn observe(&self, codes: &[&str], ticket: Option<u64>) -> Verdict {
		if !self.classifier.is_session_invalid(codes) {
			return Verdict::Ignored;
		}

		let now = Instant::now();

		{
			let mut last = self.last_notified.lock();

			let elapsed = last.map(|previous| now.saturating_duration_since(previous));

			if elapsed.is_some_and(|elapsed| elapsed <= self.cooldown) {
				return Verdict::Suppressed;
			}

			*last = Some(now);
		}

		let event = SessionExpired {
			codes: codes.iter().map(|code| (*code).to_owned()).collect(),
			ticket,
			observed_at: OffsetDateTime::now_utc(),
		};

		self.sink.session_expired(&event);

		Verdict::Notified
	}

	/// Returns the instant of the last delivered notification, if any.
	pub fn last_notified(&self) -> Option<Instant> {
		*self.last_notified.lock()
	}
}
impl Debug for SessionWatch {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionWatch")
			.field("cooldown", &self.cooldown)
			.field("last_notified", &self.last_notified())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// self
	use super::*;

	fn counting_watch(cooldown_ms: u64) -> (SessionWatch, Arc<AtomicUsize>) {
		let hits = Arc::new(AtomicUsize::new(0));
		let sink_hits = hits.clone();
		let watch = SessionWatch::new(
			StdDuration::from_millis(cooldown_ms),
			RecognizedCodes::new(["PE007"]),
			move |_: &SessionExpired| {
				sink_hits.fetch_add(1, Ordering::SeqCst);
			},
		);

		(watch, hits)
	}

	#[test]
	fn recognized_codes_match_any_member() {
		let classifier = RecognizedCodes::new(["PE007", "PE008"]);

		assert!(classifier.is_session_invalid(&["PE001", "PE008"]));
		assert!(!classifier.is_session_invalid(&["PE001"]));
		assert!(!classifier.is_session_invalid(&[]));
	}

	#[test]
	fn closures_act_as_classifiers() {
		let prefix = |codes: &[&str]| codes.iter().any(|code| code.starts_with("AUTH"));

		assert!(prefix.is_session_invalid(&["AUTH-EXPIRED"]));
		assert!(!prefix.is_session_invalid(&["PE007"]));
	}

	#[tokio::test(start_paused = true)]
	async fn cooldown_suppresses_repeats_until_it_elapses() {
		let (watch, hits) = counting_watch(1_000);

		assert_eq!(watch.observe(&["PE007"], Some(1)), Verdict::Notified);

		tokio::time::advance(StdDuration::from_millis(500)).await;

		assert_eq!(watch.observe(&["PE007"], Some(2)), Verdict::Suppressed);

		tokio::time::advance(StdDuration::from_millis(500)).await;

		// Exactly one cooldown after the first notification is still inside the window.
		assert_eq!(watch.observe(&["PE007"], Some(3)), Verdict::Suppressed);

		tokio::time::advance(StdDuration::from_millis(600)).await;

		assert_eq!(watch.observe(&["PE007"], Some(4)), Verdict::Notified);
		assert_eq!(hits.load(Ordering::SeqCst), 2);
	}

	#[tokio::test(start_paused = true)]
	async fn unrecognized_codes_never_notify() {
		let (watch, hits) = counting_watch(0);

		for _ in 0..3 {
			assert_eq!(watch.observe(&["PE001"], None), Verdict::Ignored);

			tokio::time::advance(StdDuration::from_secs(60)).await;
		}

		assert_eq!(hits.load(Ordering::SeqCst), 0);
		assert!(watch.last_notified().is_none());
	}
}

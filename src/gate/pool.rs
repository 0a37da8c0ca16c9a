// std
use std::time::Duration as StdDuration;
// crates.io
use tokio::{sync::Semaphore, time::Instant};
// self
use crate::_prelude::*;

/// Fair counting pool of admission permits.
///
/// Permits taken by [`acquire`](Self::acquire) or [`try_acquire`](Self::try_acquire) are not
/// tied to a guard; they come back only through [`release`](Self::release), which the gate
/// schedules on a timer. Waiters are served in arrival order.
#[derive(Debug)]
pub struct CapacityPool {
	permits: Semaphore,
	capacity: usize,
}
impl CapacityPool {
	/// Creates a pool holding `capacity` permits.
	pub fn new(capacity: usize) -> Self {
		Self { permits: Semaphore::new(capacity), capacity }
	}

	/// Waits for a permit and consumes it.
	///
	/// A closed pool never admits: the returned future stays pending.
	pub async fn acquire(&self) {
		match self.permits.acquire().await {
			Ok(permit) => permit.forget(),
			Err(_) => std::future::pending::<()>().await,
		}
	}

	/// Consumes a permit if one is available right now.
	pub fn try_acquire(&self) -> bool {
		match self.permits.try_acquire() {
			Ok(permit) => {
				permit.forget();

				true
			},
			Err(_) => false,
		}
	}

	/// Returns one permit and wakes the oldest waiter, if any.
	pub fn release(&self) {
		self.permits.add_permits(1);
	}

	/// Returns one permit after `delay` on a detached task.
	///
	/// The timer cannot be cancelled. `on_release` runs right after the permit is returned.
	pub fn release_after<F>(self: &Arc<Self>, delay: StdDuration, on_release: F)
	where
		F: 'static + Send + FnOnce(),
	{
		let pool = Arc::clone(self);
		let deadline = Instant::now() + delay;

		tokio::spawn(async move {
			tokio::time::sleep_until(deadline).await;
			pool.release();
			on_release();
		});
	}

	/// Number of permits currently available.
	pub fn available(&self) -> usize {
		self.permits.available_permits()
	}

	/// Configured number of permits.
	pub fn capacity(&self) -> usize {
		self.capacity
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn try_acquire_drains_and_release_refills() {
		let pool = CapacityPool::new(2);

		assert!(pool.try_acquire());
		assert!(pool.try_acquire());
		assert!(!pool.try_acquire());
		assert_eq!(pool.available(), 0);

		pool.release();

		assert_eq!(pool.available(), 1);
		assert!(pool.try_acquire());
	}

	#[tokio::test(start_paused = true)]
	async fn release_after_waits_for_the_delay() {
		let pool = Arc::new(CapacityPool::new(1));

		pool.acquire().await;
		pool.release_after(StdDuration::from_millis(100), || {});

		tokio::time::advance(StdDuration::from_millis(99)).await;
		tokio::task::yield_now().await;

		assert_eq!(pool.available(), 0);

		tokio::time::advance(StdDuration::from_millis(1)).await;
		pool.acquire().await;

		assert_eq!(pool.available(), 0);
		assert_eq!(pool.capacity(), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn closed_pool_never_admits() {
		let pool = CapacityPool::new(1);

		pool.permits.close();

		let admitted =
			tokio::time::timeout(StdDuration::from_secs(60), pool.acquire()).await.is_ok();

		assert!(!admitted);
		assert_eq!(pool.available(), 1);
	}
}

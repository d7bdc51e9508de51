// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Bounded polling with a fixed wait schedule.

use std::future::Future;
use std::time::Duration;

use crate::sizing::JOB_POLL_INTERVAL_SECS;

/// Seconds waited before each claim phase check (11 checks, 57 s).
const CLAIM_BOUND_SCHEDULE_SECS: [u64; 11] = [1, 2, 2, 4, 4, 4, 8, 8, 8, 8, 8];

/// Result of one check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe<T> {
	Ready(T),
	Failed(String),
	Pending,
}

/// Result of a whole poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollResult<T> {
	Success(T),
	Failure(String),
	TimedOut,
}

#[derive(Debug, Clone)]
enum Schedule {
	Steps(Vec<Duration>),
	Fixed { interval: Duration, attempts: u64 },
}

/// Sleeps the next scheduled duration, then checks. There is no check at
/// time zero, and an exhausted schedule is `TimedOut`.
#[derive(Debug, Clone)]
pub struct BackoffPoller {
	schedule: Schedule,
}

impl BackoffPoller {
	pub fn new(steps: Vec<Duration>) -> Self {
		Self {
			schedule: Schedule::Steps(steps),
		}
	}

	pub fn fixed(interval: Duration, attempts: u64) -> Self {
		Self {
			schedule: Schedule::Fixed { interval, attempts },
		}
	}

	/// Schedule used while waiting for a claim to become `Bound`.
	pub fn claim_bound() -> Self {
		Self::new(
			CLAIM_BOUND_SCHEDULE_SECS
				.iter()
				.map(|s| Duration::from_secs(*s))
				.collect(),
		)
	}

	/// Schedule used while waiting for the copy job.
	pub fn job_completion(attempts: u64) -> Self {
		Self::fixed(Duration::from_secs(JOB_POLL_INTERVAL_SECS), attempts)
	}

	pub fn attempts(&self) -> u64 {
		match &self.schedule {
			Schedule::Steps(steps) => steps.len() as u64,
			Schedule::Fixed { attempts, .. } => *attempts,
		}
	}

	/// Sum of every wait, i.e. the time to `TimedOut`.
	pub fn total_wait(&self) -> Duration {
		match &self.schedule {
			Schedule::Steps(steps) => steps.iter().sum(),
			Schedule::Fixed { interval, attempts } => {
				interval.saturating_mul(u32::try_from(*attempts).unwrap_or(u32::MAX))
			}
		}
	}

	fn delay(&self, attempt: u64) -> Duration {
		match &self.schedule {
			Schedule::Steps(steps) => steps
				.get(attempt as usize)
				.copied()
				.unwrap_or(Duration::ZERO),
			Schedule::Fixed { interval, .. } => *interval,
		}
	}

	/// Run `check` after each scheduled wait until it is terminal. A check
	/// error aborts the poll immediately.
	pub async fn poll<T, E, F, Fut>(&self, mut check: F) -> Result<PollResult<T>, E>
	where
		F: FnMut() -> Fut,
		Fut: Future<Output = Result<Probe<T>, E>>,
	{
		for attempt in 0..self.attempts() {
			tokio::time::sleep(self.delay(attempt)).await;
			match check().await? {
				Probe::Ready(value) => return Ok(PollResult::Success(value)),
				Probe::Failed(reason) => return Ok(PollResult::Failure(reason)),
				Probe::Pending => {
					tracing::trace!(attempt = attempt + 1, of = self.attempts(), "Still pending");
				}
			}
		}
		Ok(PollResult::TimedOut)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::convert::Infallible;
	use std::sync::atomic::{AtomicU32, Ordering};
	use tokio::time::Instant;

	#[test]
	fn claim_schedule_shape() {
		let poller = BackoffPoller::claim_bound();
		assert_eq!(poller.attempts(), 11);
		assert_eq!(poller.total_wait(), Duration::from_secs(57));
	}

	#[test]
	fn job_schedule_shape() {
		let poller = BackoffPoller::job_completion(6);
		assert_eq!(poller.attempts(), 6);
		assert_eq!(poller.total_wait(), Duration::from_secs(30));
	}

	#[tokio::test(start_paused = true)]
	async fn always_pending_times_out_after_every_sleep() {
		let checks = AtomicU32::new(0);
		let counter = &checks;
		let start = Instant::now();

		let result = BackoffPoller::claim_bound()
			.poll(move || async move {
				counter.fetch_add(1, Ordering::SeqCst);
				Ok::<_, Infallible>(Probe::<()>::Pending)
			})
			.await
			.unwrap();

		assert_eq!(result, PollResult::TimedOut);
		assert_eq!(checks.load(Ordering::SeqCst), 11);
		assert_eq!(start.elapsed(), Duration::from_secs(57));
	}

	#[tokio::test(start_paused = true)]
	async fn done_on_third_check_succeeds_after_three_sleeps() {
		let checks = AtomicU32::new(0);
		let counter = &checks;
		let start = Instant::now();

		let result = BackoffPoller::claim_bound()
			.poll(move || async move {
				let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
				Ok::<_, Infallible>(if n == 3 { Probe::Ready(n) } else { Probe::Pending })
			})
			.await
			.unwrap();

		assert_eq!(result, PollResult::Success(3));
		assert_eq!(checks.load(Ordering::SeqCst), 3);
		// 1 + 2 + 2
		assert_eq!(start.elapsed(), Duration::from_secs(5));
	}

	#[tokio::test(start_paused = true)]
	async fn first_check_waits_for_first_step() {
		let start = Instant::now();
		let result = BackoffPoller::job_completion(6)
			.poll(|| async { Ok::<_, Infallible>(Probe::Ready(())) })
			.await
			.unwrap();

		assert_eq!(result, PollResult::Success(()));
		assert_eq!(start.elapsed(), Duration::from_secs(5));
	}

	#[tokio::test(start_paused = true)]
	async fn failure_stops_polling() {
		let checks = AtomicU32::new(0);
		let counter = &checks;
		let result = BackoffPoller::job_completion(10)
			.poll(move || async move {
				counter.fetch_add(1, Ordering::SeqCst);
				Ok::<_, Infallible>(Probe::<()>::Failed("job failed".into()))
			})
			.await
			.unwrap();

		assert_eq!(result, PollResult::Failure("job failed".into()));
		assert_eq!(checks.load(Ordering::SeqCst), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn check_error_aborts() {
		let result: Result<PollResult<()>, &str> = BackoffPoller::claim_bound()
			.poll(|| async { Err("gateway down") })
			.await;
		assert_eq!(result, Err("gateway down"));
	}

	#[tokio::test(start_paused = true)]
	async fn empty_schedule_times_out_immediately() {
		let start = Instant::now();
		let result = BackoffPoller::new(Vec::new())
			.poll(|| async { Ok::<_, Infallible>(Probe::Ready(())) })
			.await
			.unwrap();
		assert_eq!(result, PollResult::TimedOut);
		assert_eq!(start.elapsed(), Duration::ZERO);
	}
}

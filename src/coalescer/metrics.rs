// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for one coalescer pipeline.
#[derive(Debug, Default)]
pub struct CoalescerMetrics {
	requests: AtomicU64,
	invocations: AtomicU64,
	joins: AtomicU64,
	switches: AtomicU64,
	success: AtomicU64,
	failure: AtomicU64,
}
impl CoalescerMetrics {
	/// Returns the total number of token requests.
	pub fn requests(&self) -> u64 {
		self.requests.load(Ordering::Relaxed)
	}

	/// Returns the number of invocations started (including switches).
	pub fn invocations(&self) -> u64 {
		self.invocations.load(Ordering::Relaxed)
	}

	/// Returns the number of requests that joined an in-flight invocation.
	pub fn joins(&self) -> u64 {
		self.joins.load(Ordering::Relaxed)
	}

	/// Returns the number of invocations that replaced another in-flight invocation.
	pub fn switches(&self) -> u64 {
		self.switches.load(Ordering::Relaxed)
	}

	/// Returns the number of invocations that settled with a token.
	pub fn successes(&self) -> u64 {
		self.success.load(Ordering::Relaxed)
	}

	/// Returns the number of invocations that settled with an error.
	pub fn failures(&self) -> u64 {
		self.failure.load(Ordering::Relaxed)
	}

	pub(crate) fn record_request(&self) {
		self.requests.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_invocation(&self) {
		self.invocations.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_join(&self) {
		self.joins.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_switch(&self) {
		self.switches.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_success(&self) {
		self.success.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failure.fetch_add(1, Ordering::Relaxed);
	}
}

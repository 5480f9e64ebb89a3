//! Optional observability helpers for token requests.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `token_coalescer.request` with the `stage`
//!   (call site) and `user` fields, plus debug events for join and switch decisions.
//! - Enable `metrics` to increment the `token_coalescer_request_total` counter for every
//!   invocation/join/switch/success/failure/abandonment, labeled by `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Outcome labels recorded for each token request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestOutcome {
	/// The request started a new mutation invocation from an idle pipeline.
	Invocation,
	/// The request attached to the invocation already in flight for the same user.
	Joined,
	/// The request replaced an in-flight invocation for a different user.
	Switched,
	/// An invocation settled with a token.
	Success,
	/// An invocation settled with an error.
	Failure,
	/// Every caller left before the current invocation settled, so the pipeline was released.
	Abandoned,
}
impl RequestOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RequestOutcome::Invocation => "invocation",
			RequestOutcome::Joined => "joined",
			RequestOutcome::Switched => "switched",
			RequestOutcome::Success => "success",
			RequestOutcome::Failure => "failure",
			RequestOutcome::Abandoned => "abandoned",
		}
	}
}
impl Display for RequestOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

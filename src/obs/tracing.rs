// self
use crate::{_prelude::*, obs::RequestOutcome};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedRequest<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedRequest<F> = F;

/// A span builder used around mutation invocations.
#[derive(Clone, Debug)]
pub struct RequestSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl RequestSpan {
	/// Creates a new span tagged with the provided stage and user.
	pub fn new(stage: &'static str, user: &str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("token_coalescer.request", stage, user);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (stage, user);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedRequest<Fut>
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

/// Emits a debug event describing how a request was routed.
pub fn trace_routing(outcome: RequestOutcome, user: &str, flight: u64) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(outcome = outcome.as_str(), user, flight, "token request routed");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (outcome, user, flight);
	}
}

/// Emits a warning for an invocation that settled with an error.
pub fn trace_failure(error: &Error) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(error = %error, "token creation failed");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = error;
	}
}

//! Single-flight access token creation.
//!
//! [`TokenRequestCoalescer::request_token`] routes every request through one pipeline slot
//! holding the current flight. A request for the user already in flight joins that flight;
//! a request for another user switches the slot to a new flight while callers attached to the
//! old one keep waiting for its own outcome. The old network call is never cancelled. Once a
//! flight settles the pipeline is idle again and the next request starts a fresh invocation, so
//! a settled outcome is never handed to a later request. If every caller of the current flight
//! is dropped before it settles, the slot is released and the suspended call is dropped.

mod flight;
mod metrics;

pub use metrics::CoalescerMetrics;

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, ScopeSet, UserId},
	coalescer::flight::{Flight, Invocation},
	context::{self, ContextProvider},
	error::AggregateTokenCreationError,
	graphql::{
		CreateAccessTokenData, CreateAccessTokenVariables, GraphQlResponse, MutationExecutor,
	},
	obs::{self, RequestOutcome, RequestSpan},
};
#[cfg(feature = "reqwest")]
use crate::{context::StaticContextProvider, graphql::ReqwestExecutor};

/// Boxed future returned by [`TokenRequestCoalescer::request_token`].
pub type TokenFuture = Pin<Box<dyn Future<Output = Result<AccessToken>> + Send>>;

#[cfg(feature = "reqwest")]
/// Coalescer specialized for the crate's default reqwest executor.
pub type ReqwestCoalescer = TokenRequestCoalescer<ReqwestExecutor, StaticContextProvider>;

/// Fixed arguments bound into every `createAccessToken` invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoalescerConfig {
	/// Scopes granted to created tokens (defaults to `user:all`).
	pub scopes: ScopeSet,
	/// Note prefix; the platform name is appended after a dash.
	pub note_prefix: String,
	/// Repository key passed to the context provider (defaults to empty).
	pub repo_key: String,
}
impl Default for CoalescerConfig {
	fn default() -> Self {
		Self {
			scopes: ScopeSet::user_all(),
			note_prefix: "sourcegraph".into(),
			repo_key: String::new(),
		}
	}
}

#[derive(Default)]
struct Pipeline {
	current: Option<Arc<Flight>>,
	next_flight: u64,
}

/// Coalesces concurrent token requests into shared mutation invocations.
///
/// Construct one coalescer per process (or per GraphQL instance) and hand clones to every
/// component that needs tokens; clones share the pipeline, executor, provider, and metrics.
pub struct TokenRequestCoalescer<E, P>
where
	E: ?Sized + MutationExecutor,
	P: ?Sized + ContextProvider,
{
	/// Executor used for every mutation invocation.
	pub executor: Arc<E>,
	/// Provider supplying request contexts and the platform name.
	pub context: Arc<P>,
	config: Arc<CoalescerConfig>,
	metrics: Arc<CoalescerMetrics>,
	pipeline: Arc<Mutex<Pipeline>>,
}
impl<E, P> TokenRequestCoalescer<E, P>
where
	E: ?Sized + MutationExecutor,
	P: ?Sized + ContextProvider,
{
	/// Creates an idle coalescer over the provided executor and context provider.
	pub fn new(executor: impl Into<Arc<E>>, context: impl Into<Arc<P>>) -> Self {
		Self {
			executor: executor.into(),
			context: context.into(),
			config: Default::default(),
			metrics: Default::default(),
			pipeline: Default::default(),
		}
	}

	/// Replaces the invocation arguments.
	pub fn with_config(mut self, config: CoalescerConfig) -> Self {
		self.config = Arc::new(config);

		self
	}

	/// Overrides the scopes granted to created tokens.
	pub fn with_scopes(self, scopes: ScopeSet) -> Self {
		let config = CoalescerConfig { scopes, ..self.config.as_ref().clone() };

		self.with_config(config)
	}

	/// Overrides the note prefix (defaults to `sourcegraph`).
	pub fn with_note_prefix(self, note_prefix: impl Into<String>) -> Self {
		let config =
			CoalescerConfig { note_prefix: note_prefix.into(), ..self.config.as_ref().clone() };

		self.with_config(config)
	}

	/// Invocation arguments in use.
	pub fn config(&self) -> &CoalescerConfig {
		&self.config
	}

	/// Counters shared by every clone of this coalescer.
	pub fn metrics(&self) -> &CoalescerMetrics {
		&self.metrics
	}

	/// Returns true while an unsettled invocation occupies the pipeline.
	pub fn is_in_flight(&self) -> bool {
		self.pipeline.lock().current.as_ref().is_some_and(|flight| !flight.is_settled())
	}

	/// Requests an access token for `user`.
	///
	/// The request is routed before this method returns: it joins the invocation in flight for
	/// the same user, or starts (and makes current) a new one. The returned future resolves with
	/// that invocation's outcome. The network call runs once the first attached caller polls.
	pub fn request_token(&self, user: UserId) -> TokenFuture {
		self.metrics.record_request();

		let waiter = Waiter { flight: self.route(user), pipeline: self.pipeline.clone() };

		Box::pin(waiter.wait())
	}

	fn route(&self, user: UserId) -> Arc<Flight> {
		let mut pipeline = self.pipeline.lock();
		let mut outcome = RequestOutcome::Invocation;

		if let Some(current) = pipeline.current.as_ref().filter(|flight| !flight.is_settled()) {
			if current.user == user {
				self.metrics.record_join();
				obs::record_request_outcome(RequestOutcome::Joined);
				obs::trace_routing(RequestOutcome::Joined, &user, current.id);
				current.attach();

				return current.clone();
			}

			outcome = RequestOutcome::Switched;
		}

		let id = pipeline.next_flight;

		pipeline.next_flight += 1;

		let flight = Arc::new(Flight::new(id, user.clone(), self.invocation(user)));

		flight.attach();

		pipeline.current = Some(flight.clone());

		self.metrics.record_invocation();

		if outcome == RequestOutcome::Switched {
			self.metrics.record_switch();
		}

		obs::record_request_outcome(outcome);
		obs::trace_routing(outcome, &flight.user, id);

		flight
	}

	fn invocation(&self, user: UserId) -> Invocation {
		let executor = self.executor.clone();
		let provider = self.context.clone();
		let config = self.config.clone();
		let metrics = self.metrics.clone();
		let span = RequestSpan::new("create_access_token", &user);

		Box::pin(span.instrument(async move {
			let request_context = provider.request_context(&config.repo_key);
			let variables = CreateAccessTokenVariables {
				user_id: user.to_string(),
				scopes: config.scopes.clone(),
				note: context::token_note(&config.note_prefix, &provider.platform_name()),
			};
			let result = match executor.execute(request_context, variables).await {
				Ok(response) => token_from_response(response),
				Err(err) => Err(Error::from(err)),
			};

			match &result {
				Ok(_) => {
					metrics.record_success();
					obs::record_request_outcome(RequestOutcome::Success);
				},
				Err(err) => {
					metrics.record_failure();
					obs::record_request_outcome(RequestOutcome::Failure);
					obs::trace_failure(err);
				},
			}

			result
		}))
	}
}
#[cfg(feature = "reqwest")]
impl TokenRequestCoalescer<ReqwestExecutor, StaticContextProvider> {
	/// Creates a coalescer posting to the GraphQL API of `instance_url`.
	pub fn for_instance(instance_url: &str, provider: StaticContextProvider) -> Result<Self> {
		Ok(Self::new(ReqwestExecutor::new(instance_url)?, provider))
	}
}
impl<E, P> Clone for TokenRequestCoalescer<E, P>
where
	E: ?Sized + MutationExecutor,
	P: ?Sized + ContextProvider,
{
	fn clone(&self) -> Self {
		Self {
			executor: self.executor.clone(),
			context: self.context.clone(),
			config: self.config.clone(),
			metrics: self.metrics.clone(),
			pipeline: self.pipeline.clone(),
		}
	}
}
impl<E, P> Debug for TokenRequestCoalescer<E, P>
where
	E: ?Sized + MutationExecutor,
	P: ?Sized + ContextProvider,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenRequestCoalescer")
			.field("config", &self.config)
			.field("current", &self.pipeline.lock().current)
			.field("metrics", &self.metrics)
			.finish()
	}
}

/// One caller's attachment to a flight.
///
/// Attach and detach both happen under the pipeline lock, so a request can never join a flight
/// whose last caller is concurrently leaving. When the last caller of the current flight leaves
/// before it settles, the slot is cleared and the suspended invocation is dropped with it.
struct Waiter {
	flight: Arc<Flight>,
	pipeline: Arc<Mutex<Pipeline>>,
}
impl Waiter {
	async fn wait(self) -> Result<AccessToken> {
		self.flight.clone().wait().await
	}
}
impl Drop for Waiter {
	fn drop(&mut self) {
		let mut pipeline = self.pipeline.lock();

		if self.flight.detach() > 0 || self.flight.is_settled() {
			return;
		}
		if pipeline.current.as_ref().is_some_and(|current| Arc::ptr_eq(current, &self.flight)) {
			pipeline.current = None;

			obs::record_request_outcome(RequestOutcome::Abandoned);
			obs::trace_routing(RequestOutcome::Abandoned, &self.flight.user, self.flight.id);
		}
	}
}

/// Validates a raw mutation response.
///
/// Any reported error, a missing `data` object, or a missing `createAccessToken` payload fails
/// with an [`AggregateTokenCreationError`] carrying every reported cause.
pub fn token_from_response(
	response: GraphQlResponse<CreateAccessTokenData>,
) -> Result<AccessToken> {
	let GraphQlResponse { data, errors } = response;
	let errors = errors.unwrap_or_default();

	match data.and_then(|data| data.create_access_token) {
		Some(created) if errors.is_empty() => Ok(AccessToken::new(created.id, created.token)),
		_ => Err(AggregateTokenCreationError::new(errors).into()),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::graphql::{CreatedAccessToken, ErrorCause};

	fn response(
		created: Option<(&str, &str)>,
		errors: Option<Vec<ErrorCause>>,
	) -> GraphQlResponse<CreateAccessTokenData> {
		GraphQlResponse {
			data: Some(CreateAccessTokenData {
				create_access_token: created.map(|(id, token)| CreatedAccessToken {
					id: id.into(),
					token: token.into(),
				}),
			}),
			errors,
		}
	}

	#[test]
	fn payload_with_token_succeeds() {
		let token = token_from_response(response(Some(("1", "tok_abc")), None))
			.expect("Token payload should be accepted.");

		assert_eq!(token.expose(), "tok_abc");
		assert_eq!(token.id(), "1");

		token_from_response(response(Some(("1", "tok_abc")), Some(Vec::new())))
			.expect("An empty error list should be accepted.");
	}

	#[test]
	fn token_with_reported_errors_fails() {
		let err = token_from_response(response(
			Some(("1", "tok_abc")),
			Some(vec![ErrorCause::new("partial failure")]),
		))
		.expect_err("Reported errors must fail even with a payload.");

		match err {
			Error::Aggregate(aggregate) => {
				assert_eq!(aggregate.causes()[0].message, "partial failure")
			},
			other => panic!("Expected an aggregate error, got {other:?}."),
		}
	}

	#[test]
	fn missing_data_fails_without_causes() {
		let err = token_from_response(GraphQlResponse { data: None, errors: None })
			.expect_err("Missing data must fail.");

		assert!(matches!(err, Error::Aggregate(ref aggregate) if aggregate.is_empty()));
	}

	#[test]
	fn default_config_binds_user_all() {
		let config = CoalescerConfig::default();

		assert_eq!(config.scopes, ScopeSet::user_all());
		assert_eq!(config.note_prefix, "sourcegraph");
		assert!(config.repo_key.is_empty());
	}
}

//! Scripted executor shared by the coalescer integration tests.

#![allow(dead_code)]

// std
use std::{collections::VecDeque, future::Future, pin::Pin, sync::Arc};
// crates.io
use parking_lot::Mutex;
use tokio::sync::oneshot;
// self
use token_coalescer::{
	auth::UserId,
	coalescer::TokenRequestCoalescer,
	context::{Platform, RequestContext, StaticContextProvider},
	error::TransportError,
	graphql::{
		CreateAccessTokenData, CreateAccessTokenVariables, CreatedAccessToken, ErrorCause,
		ExecuteFuture, GraphQlResponse, MutationExecutor,
	},
};

pub type Response = GraphQlResponse<CreateAccessTokenData>;
pub type ScriptedCoalescer = TokenRequestCoalescer<ScriptedExecutor, StaticContextProvider>;

type Reply = Pin<Box<dyn Future<Output = Result<Response, TransportError>> + Send>>;

/// One executor call observed by [`ScriptedExecutor`].
#[derive(Clone, Debug)]
pub struct RecordedCall {
	pub context: RequestContext,
	pub variables: CreateAccessTokenVariables,
}

/// Executor replaying queued replies in call order and recording every call.
///
/// With an empty queue it answers `tok_<n>` where `n` is the 1-based call number.
#[derive(Clone, Default)]
pub struct ScriptedExecutor {
	replies: Arc<Mutex<VecDeque<Reply>>>,
	calls: Arc<Mutex<Vec<RecordedCall>>>,
}
impl ScriptedExecutor {
	pub fn push_reply<F>(&self, reply: F)
	where
		F: 'static + Send + Future<Output = Result<Response, TransportError>>,
	{
		self.replies.lock().push_back(Box::pin(reply));
	}

	pub fn push_response(&self, response: Response) {
		self.push_reply(async move { Ok(response) });
	}

	/// Queues a reply held back until the returned sender fires.
	pub fn push_gated(&self) -> oneshot::Sender<Result<Response, TransportError>> {
		let (tx, rx) = oneshot::channel();

		self.push_reply(async move {
			rx.await.expect("Gate sender should not be dropped before release.")
		});

		tx
	}

	pub fn call_count(&self) -> usize {
		self.calls.lock().len()
	}

	pub fn calls(&self) -> Vec<RecordedCall> {
		self.calls.lock().clone()
	}
}
impl MutationExecutor for ScriptedExecutor {
	fn execute(
		&self,
		context: RequestContext,
		variables: CreateAccessTokenVariables,
	) -> ExecuteFuture {
		let call_number = {
			let mut calls = self.calls.lock();

			calls.push(RecordedCall { context, variables });

			calls.len()
		};

		match self.replies.lock().pop_front() {
			Some(reply) => reply,
			None => Box::pin(async move {
				Ok(token_response(&call_number.to_string(), &format!("tok_{call_number}")))
			}),
		}
	}
}

pub fn token_response(id: &str, token: &str) -> Response {
	GraphQlResponse {
		data: Some(CreateAccessTokenData {
			create_access_token: Some(CreatedAccessToken { id: id.into(), token: token.into() }),
		}),
		errors: None,
	}
}

pub fn error_response(messages: &[&str]) -> Response {
	GraphQlResponse {
		data: None,
		errors: Some(messages.iter().map(|message| ErrorCause::new(*message)).collect()),
	}
}

pub fn user(id: &str) -> UserId {
	UserId::new(id).expect("User fixture should be valid.")
}

pub fn build_scripted_coalescer() -> (ScriptedCoalescer, ScriptedExecutor) {
	let executor = ScriptedExecutor::default();
	let coalescer = TokenRequestCoalescer::new(
		executor.clone(),
		StaticContextProvider::new(Platform::ChromeExtension),
	);

	(coalescer, executor)
}

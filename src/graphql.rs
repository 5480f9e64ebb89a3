//! GraphQL mutation executor contract and the reqwest-backed implementation.
//!
//! [`MutationExecutor`] is the coalescer's only dependency on a network stack. One call to
//! [`MutationExecutor::execute`] is one round trip: executors must not retry, batch, or cache.
//! Responses are returned undigested so the coalescer can apply its own payload checks, and
//! executor failures are reported as [`TransportError`] values that flow to callers unchanged.

mod response;

pub use response::*;

// self
use crate::{_prelude::*, context::RequestContext, error::TransportError};
#[cfg(feature = "reqwest")] use crate::error::ConfigError;

/// Mutation document creating a user-scoped access token.
pub const CREATE_ACCESS_TOKEN_MUTATION: &str = r#"
mutation CreateAccessToken($userID: ID!, $scopes: [String!]!, $note: String!) {
	createAccessToken(user: $userID, scopes: $scopes, note: $note) {
		id
		token
	}
}
"#;

/// Boxed future returned by [`MutationExecutor::execute`].
pub type ExecuteFuture = Pin<
	Box<dyn Future<Output = Result<GraphQlResponse<CreateAccessTokenData>, TransportError>> + Send>,
>;

/// Executes the `createAccessToken` mutation.
///
/// Implementations must be `Send + Sync + 'static` so one executor can be shared by every
/// in-flight invocation, and the returned future must own whatever it needs so it can outlive
/// the caller that started it.
pub trait MutationExecutor
where
	Self: 'static + Send + Sync,
{
	/// Performs one non-retried round trip with the provided context and variables.
	fn execute(&self, context: RequestContext, variables: CreateAccessTokenVariables)
	-> ExecuteFuture;
}

#[cfg(feature = "reqwest")]
#[derive(Serialize)]
struct GraphQlRequest<'a> {
	query: &'a str,
	variables: &'a CreateAccessTokenVariables,
}

/// Executor posting mutations to `<instance>/.api/graphql` with reqwest.
///
/// GraphQL endpoints answer directly, so the client built by [`ReqwestExecutor::new`] does not
/// follow redirects. Supply a similarly configured client to [`ReqwestExecutor::with_client`].
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestExecutor {
	client: ReqwestClient,
	endpoint: Url,
}
#[cfg(feature = "reqwest")]
impl ReqwestExecutor {
	const BODY_PREVIEW_LIMIT: usize = 256;

	/// Builds an executor for the instance rooted at `instance_url`.
	pub fn new(instance_url: &str) -> Result<Self> {
		let base = Url::parse(instance_url)
			.map_err(|source| ConfigError::InvalidEndpoint { source })?;
		let client = ReqwestClient::builder()
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.map_err(ConfigError::from)?;

		Ok(Self::with_client(client, &base)?)
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient, instance_url: &Url) -> Result<Self, ConfigError> {
		Ok(Self { client, endpoint: graphql_endpoint(instance_url)? })
	}

	/// Fully resolved GraphQL endpoint, including the operation name query.
	pub fn endpoint(&self) -> &Url {
		&self.endpoint
	}
}
#[cfg(feature = "reqwest")]
impl MutationExecutor for ReqwestExecutor {
	fn execute(
		&self,
		context: RequestContext,
		variables: CreateAccessTokenVariables,
	) -> ExecuteFuture {
		let client = self.client.clone();
		let endpoint = self.endpoint.clone();

		Box::pin(async move {
			let body = GraphQlRequest { query: CREATE_ACCESS_TOKEN_MUTATION, variables: &variables };
			let mut request = client.post(endpoint).json(&body);

			for (name, value) in &context.headers {
				request = request.header(name.as_str(), value.as_str());
			}

			let response = request.send().await?;
			let status = response.status();
			let bytes = response.bytes().await?;

			if !status.is_success() {
				let preview = &bytes[..bytes.len().min(Self::BODY_PREVIEW_LIMIT)];

				return Err(TransportError::Status {
					status: status.as_u16(),
					body_preview: String::from_utf8_lossy(preview).into_owned(),
				});
			}

			let mut de = serde_json::Deserializer::from_slice(&bytes);

			Ok(serde_path_to_error::deserialize(&mut de)?)
		})
	}
}

#[cfg(feature = "reqwest")]
fn graphql_endpoint(instance_url: &Url) -> Result<Url, ConfigError> {
	let mut base = instance_url.clone();

	if !base.path().ends_with('/') {
		let path = format!("{}/", base.path());

		base.set_path(&path);
	}

	let mut endpoint =
		base.join(".api/graphql").map_err(|source| ConfigError::InvalidEndpoint { source })?;

	endpoint.set_query(Some("CreateAccessToken"));

	Ok(endpoint)
}

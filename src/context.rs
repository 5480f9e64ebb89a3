//! Request context and platform naming handed to the GraphQL executor.
//!
//! The coalescer never builds headers itself. It asks a [`ContextProvider`] for a
//! [`RequestContext`] (always with an empty repository key) and for the platform name that ends
//! up in the token note.

// self
use crate::_prelude::*;

/// Client platforms that create access tokens.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Platform {
	/// Chrome browser extension.
	ChromeExtension,
	/// Firefox browser extension.
	FirefoxExtension,
	/// Safari browser extension.
	SafariExtension,
	/// Native Phabricator integration.
	PhabricatorIntegration,
	/// Native Bitbucket Server integration.
	BitbucketIntegration,
	/// Native GitLab integration.
	GitlabIntegration,
	/// Any other client; the label is used verbatim.
	Other(String),
}
impl Platform {
	/// Returns a stable label suitable for notes and span fields.
	pub fn as_str(&self) -> &str {
		match self {
			Platform::ChromeExtension => "chrome-extension",
			Platform::FirefoxExtension => "firefox-extension",
			Platform::SafariExtension => "safari-extension",
			Platform::PhabricatorIntegration => "phabricator-integration",
			Platform::BitbucketIntegration => "bitbucket-integration",
			Platform::GitlabIntegration => "gitlab-integration",
			Platform::Other(label) => label,
		}
	}
}
impl Display for Platform {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Per-request context consumed by a [`MutationExecutor`](crate::graphql::MutationExecutor).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestContext {
	/// Repository the request is scoped to; empty for user-level mutations.
	pub repo_key: String,
	/// Extra headers in insertion order.
	pub headers: Vec<(String, String)>,
}
impl RequestContext {
	/// Creates an empty context for the provided repository key.
	pub fn new(repo_key: impl Into<String>) -> Self {
		Self { repo_key: repo_key.into(), headers: Vec::new() }
	}

	/// Appends a header.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));

		self
	}

	/// Returns the first header value matching `name` (ASCII case-insensitive).
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers
			.iter()
			.find(|(key, _)| key.eq_ignore_ascii_case(name))
			.map(|(_, value)| value.as_str())
	}
}

/// Supplies request contexts and the current platform name.
///
/// Implementors must be `Send + Sync + 'static` because one provider is shared by every
/// in-flight invocation.
pub trait ContextProvider
where
	Self: 'static + Send + Sync,
{
	/// Builds the context for one mutation call.
	fn request_context(&self, repo_key: &str) -> RequestContext;

	/// Name of the client platform, embedded verbatim into token notes.
	fn platform_name(&self) -> Cow<'_, str>;
}

/// Context provider with a fixed platform and a fixed header set.
#[derive(Clone, Debug)]
pub struct StaticContextProvider {
	platform: Platform,
	headers: Vec<(String, String)>,
}
impl StaticContextProvider {
	/// Header marking requests as coming from a first-party client.
	pub const REQUESTED_WITH: (&'static str, &'static str) = ("X-Requested-With", "Sourcegraph");

	/// Creates a provider for `platform` carrying only the `X-Requested-With` header.
	pub fn new(platform: Platform) -> Self {
		let (name, value) = Self::REQUESTED_WITH;

		Self { platform, headers: vec![(name.into(), value.into())] }
	}

	/// Authenticates requests with an existing token (`Authorization: token <value>`).
	pub fn with_access_token(self, token: impl AsRef<str>) -> Self {
		let value = format!("token {}", token.as_ref());

		self.with_header("Authorization", value)
	}

	/// Adds an arbitrary header to every context.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));

		self
	}

	/// Configured platform.
	pub fn platform(&self) -> &Platform {
		&self.platform
	}
}
impl ContextProvider for StaticContextProvider {
	fn request_context(&self, repo_key: &str) -> RequestContext {
		RequestContext { repo_key: repo_key.to_owned(), headers: self.headers.clone() }
	}

	fn platform_name(&self) -> Cow<'_, str> {
		Cow::Borrowed(self.platform.as_str())
	}
}

/// Builds the descriptive note attached to created tokens (`<prefix>-<platform>`).
pub fn token_note(prefix: &str, platform: &str) -> String {
	format!("{prefix}-{platform}")
}

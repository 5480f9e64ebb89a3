//! Crate-level error types shared by the coalescer, the GraphQL executor, and the auth models.
//!
//! Every error is [`Clone`] because one settled invocation fans its outcome out to all of the
//! callers that were attached to it.

// self
use crate::{
	_prelude::*,
	auth::{IdentifierError, ScopeValidationError},
	graphql::ErrorCause,
};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type SharedError = Arc<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Clone, Debug, ThisError)]
pub enum Error {
	/// The mutation response carried reported errors or no token payload.
	#[error(transparent)]
	Aggregate(#[from] AggregateTokenCreationError),
	/// The executor itself failed; surfaced unchanged.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// The invocation panicked before settling; callers still attached receive this instead.
	#[error("Token creation invocation panicked before settling.")]
	InvocationPanicked,
}
impl From<IdentifierError> for Error {
	fn from(e: IdentifierError) -> Self {
		Self::Config(e.into())
	}
}
impl From<ScopeValidationError> for Error {
	fn from(e: ScopeValidationError) -> Self {
		Self::Config(e.into())
	}
}

/// Combined failure for one token-creation invocation.
///
/// Preserves every reported cause in server order. An empty cause list means the server
/// reported nothing but still omitted the token payload.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("{}", render_causes(.causes))]
pub struct AggregateTokenCreationError {
	causes: Arc<[ErrorCause]>,
}
impl AggregateTokenCreationError {
	/// Aggregates zero or more reported causes into one error value.
	pub fn new(causes: impl IntoIterator<Item = ErrorCause>) -> Self {
		Self { causes: causes.into_iter().collect() }
	}

	/// Every underlying cause, in the order the server reported them.
	pub fn causes(&self) -> &[ErrorCause] {
		&self.causes
	}

	/// Returns true when the server reported no causes.
	pub fn is_empty(&self) -> bool {
		self.causes.is_empty()
	}

	/// Returns true when both errors share the same cause allocation.
	pub fn shares_causes_with(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.causes, &other.causes)
	}
}

fn render_causes(causes: &[ErrorCause]) -> String {
	if causes.is_empty() {
		return "Token creation response did not include an access token.".into();
	}

	causes.iter().map(|cause| cause.message.as_str()).collect::<Vec<_>>().join("\n")
}

/// Transport-level failures raised by a [`MutationExecutor`](crate::graphql::MutationExecutor).
#[derive(Clone, Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the GraphQL endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: SharedError,
	},
	/// GraphQL endpoint answered with a non-success status.
	#[error("GraphQL endpoint returned HTTP {status}: {body_preview}.")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Leading bytes of the response body.
		body_preview: String,
	},
	/// GraphQL endpoint responded with JSON that does not match the expected shape.
	#[error("GraphQL endpoint returned malformed JSON.")]
	Decode {
		/// Structured parsing failure including the offending path.
		#[source]
		source: Arc<serde_path_to_error::Error<serde_json::Error>>,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Arc::new(src) }
	}
}
impl From<serde_path_to_error::Error<serde_json::Error>> for TransportError {
	fn from(e: serde_path_to_error::Error<serde_json::Error>) -> Self {
		Self::Decode { source: Arc::new(e) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Configuration and validation failures.
#[derive(Clone, Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: SharedError,
	},
	/// GraphQL endpoint cannot be parsed.
	#[error("GraphQL endpoint is invalid.")]
	InvalidEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Configured scopes cannot be normalized.
	#[error("Requested scopes are invalid.")]
	InvalidScope(#[from] ScopeValidationError),
	/// Identifier failed validation.
	#[error("Identifier is invalid.")]
	InvalidIdentifier(#[from] IdentifierError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Arc::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn aggregate_message_joins_causes() {
		let err = AggregateTokenCreationError::new([
			ErrorCause::new("denied"),
			ErrorCause::new("user not found"),
		]);

		assert_eq!(err.to_string(), "denied\nuser not found");
		assert_eq!(err.causes().len(), 2);
	}

	#[test]
	fn aggregate_without_causes_reports_missing_token() {
		let err = AggregateTokenCreationError::new(Vec::new());

		assert!(err.is_empty());
		assert_eq!(err.to_string(), "Token creation response did not include an access token.");
	}

	#[test]
	fn clones_share_causes() {
		let err = AggregateTokenCreationError::new([ErrorCause::new("denied")]);
		let copy = err.clone();

		assert!(err.shares_causes_with(&copy));
		assert!(!err.shares_causes_with(&AggregateTokenCreationError::new([ErrorCause::new(
			"denied"
		)])));
	}

	#[test]
	fn validation_errors_convert_through_config() {
		fn parse_user(raw: &str) -> Result<crate::auth::UserId> {
			Ok(crate::auth::UserId::new(raw)?)
		}

		fn parse_scopes(raw: &str) -> Result<crate::auth::ScopeSet> {
			Ok(crate::auth::ScopeSet::new([raw])?)
		}

		assert!(matches!(
			parse_user(""),
			Err(Error::Config(ConfigError::InvalidIdentifier(IdentifierError::Empty { .. })))
		));
		assert!(matches!(
			parse_scopes("user all"),
			Err(Error::Config(ConfigError::InvalidScope(
				ScopeValidationError::ContainsWhitespace { .. }
			)))
		));
		assert!(parse_user("VXNlcjox").is_ok());
	}
}

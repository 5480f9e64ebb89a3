//! Wire shapes for the `createAccessToken` mutation.

// self
use crate::{_prelude::*, auth::ScopeSet};

/// Variables bound to [`CREATE_ACCESS_TOKEN_MUTATION`](super::CREATE_ACCESS_TOKEN_MUTATION).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAccessTokenVariables {
	/// User the token is created for.
	#[serde(rename = "userID")]
	pub user_id: String,
	/// Scopes granted to the token.
	pub scopes: ScopeSet,
	/// Human-readable note shown next to the token.
	pub note: String,
}

/// Standard GraphQL response envelope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphQlResponse<T> {
	/// Payload; absent or `null` when the operation failed outright.
	pub data: Option<T>,
	/// Errors reported alongside (or instead of) the payload.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub errors: Option<Vec<ErrorCause>>,
}

/// `data` payload of the `createAccessToken` mutation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAccessTokenData {
	/// Created token, absent when the mutation did not resolve.
	#[serde(rename = "createAccessToken", default)]
	pub create_access_token: Option<CreatedAccessToken>,
}

/// Token fields selected by the mutation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedAccessToken {
	/// GraphQL node id of the token.
	pub id: String,
	/// Token secret.
	pub token: String,
}

/// One error reported by the GraphQL server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorCause {
	/// Human-readable message.
	pub message: String,
	/// Response path the error applies to.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub path: Option<Vec<serde_json::Value>>,
	/// Server-specific metadata.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub extensions: Option<serde_json::Value>,
}
impl ErrorCause {
	/// Creates a cause carrying only a message.
	pub fn new(message: impl Into<String>) -> Self {
		Self { message: message.into(), path: None, extensions: None }
	}
}
impl Display for ErrorCause {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.message)
	}
}

//! Created access token with a redacting secret.

// self
use crate::_prelude::*;

#[derive(PartialEq, Eq)]
struct TokenInner {
	id: String,
	secret: String,
	created_at: OffsetDateTime,
}

/// Access token returned by a settled `createAccessToken` mutation.
///
/// Clones share one allocation, so every caller attached to an invocation holds the same
/// token. `Debug` and `Display` never print the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(Arc<TokenInner>);
impl AccessToken {
	/// Wraps a token created by the server, stamping the local creation instant.
	pub fn new(id: impl Into<String>, secret: impl Into<String>) -> Self {
		Self::with_created_at(id, secret, OffsetDateTime::now_utc())
	}

	/// Wraps a token with an explicit creation instant.
	pub fn with_created_at(
		id: impl Into<String>,
		secret: impl Into<String>,
		created_at: OffsetDateTime,
	) -> Self {
		Self(Arc::new(TokenInner { id: id.into(), secret: secret.into(), created_at }))
	}

	/// GraphQL node id of the token.
	pub fn id(&self) -> &str {
		&self.0.id
	}

	/// Returns the token secret. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0.secret
	}

	/// Instant the token was received.
	pub fn created_at(&self) -> OffsetDateTime {
		self.0.created_at
	}

	/// Returns true when both handles point at the same settled token.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.0, &other.0)
	}
}
impl AsRef<str> for AccessToken {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for AccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AccessToken")
			.field("id", &self.0.id)
			.field("secret", &"<redacted>")
			.field("created_at", &self.0.created_at)
			.finish()
	}
}
impl Display for AccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

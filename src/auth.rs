//! Auth-domain identifiers, scope sets, and the created access token.

pub mod id;
pub mod scope;
pub mod token;

pub use id::*;
pub use scope::*;
pub use token::*;

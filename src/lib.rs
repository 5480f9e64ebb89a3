//! Single-flight access token creation: coalesce concurrent token requests into one GraphQL
//! mutation and hand the shared result to every waiter.
//!
//! ```no_run
//! use token_coalescer::{
//! 	auth::UserId,
//! 	coalescer::ReqwestCoalescer,
//! 	context::{Platform, StaticContextProvider},
//! };
//!
//! async fn shared_token() -> token_coalescer::error::Result<()> {
//! 	let provider =
//! 		StaticContextProvider::new(Platform::ChromeExtension).with_access_token("session");
//! 	let coalescer =
//! 		ReqwestCoalescer::for_instance("https://sourcegraph.example.com", provider)?;
//! 	let user = UserId::new("VXNlcjox")?;
//! 	let (a, b) =
//! 		tokio::join!(coalescer.request_token(user.clone()), coalescer.request_token(user));
//!
//! 	assert!(a?.ptr_eq(&b?));
//!
//! 	Ok(())
//! }
//! ```

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod coalescer;
pub mod context;
pub mod error;
pub mod graphql;
pub mod obs;

mod _prelude {
	pub use std::{
		borrow::Cow,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};

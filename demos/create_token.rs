//! Demonstrates several components asking for a token at once while only one
//! `createAccessToken` mutation reaches the GraphQL endpoint.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use token_coalescer::{
	auth::UserId,
	coalescer::ReqwestCoalescer,
	context::{Platform, StaticContextProvider},
	graphql::ReqwestExecutor,
	reqwest::{Client, redirect::Policy},
	url::Url,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let mutation_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/.api/graphql");
			then.status(200).header("content-type", "application/json").body(
				"{\"data\":{\"createAccessToken\":{\"id\":\"QWNjZXNzVG9rZW46MQ==\",\"token\":\"demo-token\"}}}",
			);
		})
		.await;
	let provider =
		StaticContextProvider::new(Platform::ChromeExtension).with_access_token("session-token");
	// The mock server's certificate is self-signed.
	let client = Client::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.redirect(Policy::none())
		.build()?;
	let executor = ReqwestExecutor::with_client(client, &Url::parse(&server.base_url())?)?;
	let coalescer = ReqwestCoalescer::new(executor, provider);
	let user = UserId::new("VXNlcjox")?;
	let (code_intel, search, hover) = tokio::join!(
		coalescer.request_token(user.clone()),
		coalescer.request_token(user.clone()),
		coalescer.request_token(user),
	);
	let token = code_intel?;

	println!("Shared access token: {}.", token.expose());
	println!("All callers share it: {}.", token.ptr_eq(&search?) && token.ptr_eq(&hover?));

	mutation_mock.assert_calls_async(1).await;

	Ok(())
}

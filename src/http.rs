//! Transport primitives for the access layer.
//!
//! [`SessionHttpClient`] is the crate's only dependency on an HTTP stack.
//! Implementations must preserve two properties: session cookies ride every
//! call automatically (the transport, not the caller, owns credentials), and
//! the response/no-response distinction is kept intact—`Ok` means the server
//! answered with *some* status, `Err` means a network-level failure the
//! facade re-raises to its caller.

// self
use crate::{_prelude::*, error::TransportError, request::Verb};
#[cfg(feature = "reqwest")] use crate::error::ConfigError;
#[cfg(feature = "reqwest")] use reqwest::cookie::Jar;

/// Boxed future returned by [`SessionHttpClient::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<WireResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of executing decorated requests.
pub trait SessionHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Executes one wire call.
	fn execute(&self, request: WireRequest) -> TransportFuture<'_>;
}

/// Fully decorated request handed to the transport.
#[derive(Clone, Debug)]
pub struct WireRequest {
	/// HTTP verb.
	pub verb: Verb,
	/// Absolute request URL.
	pub url: Url,
	/// Header map: decorator output with caller overrides applied.
	pub headers: BTreeMap<String, String>,
	/// Optional JSON body.
	pub payload: Option<Value>,
}

/// Raw server response: status plus undecoded body bytes.
#[derive(Clone, Debug)]
pub struct WireResponse {
	/// HTTP status code.
	pub status: u16,
	/// Raw body bytes (possibly empty).
	pub body: Vec<u8>,
}
impl WireResponse {
	/// True for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// True when the status reports an unauthenticated session.
	pub fn is_unauthenticated(&self) -> bool {
		self.status == 401
	}
}

#[cfg(feature = "reqwest")]
/// Default transport backed by [`ReqwestClient`] and a shared cookie jar.
#[derive(Clone)]
pub struct ReqwestHttpClient {
	client: ReqwestClient,
}
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Builds a client around the provided cookie jar.
	///
	/// The same jar should back the [`JarCookieSource`](crate::cookie::JarCookieSource)
	/// handed to the session client, otherwise anti-forgery cookies rotated by
	/// the server are invisible to the request decorator.
	pub fn with_jar(jar: Arc<Jar>) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder().cookie_provider(jar).build()?;

		Ok(Self { client })
	}

	/// Wraps an existing [`ReqwestClient`]; the caller is responsible for
	/// configuring cookie storage on it.
	pub fn with_client(client: ReqwestClient) -> Self {
		Self { client }
	}
}
#[cfg(feature = "reqwest")]
impl SessionHttpClient for ReqwestHttpClient {
	fn execute(&self, request: WireRequest) -> TransportFuture<'_> {
		let client = self.client.clone();

		Box::pin(async move {
			let mut builder = client.request(request.verb.into(), request.url.clone());

			for (name, value) in &request.headers {
				builder = builder.header(name.as_str(), value.as_str());
			}
			if let Some(payload) = &request.payload {
				builder = builder.json(payload);
			}

			let response = builder.send().await.map_err(TransportError::from)?;
			let status = response.status().as_u16();
			let body = response.bytes().await.map_err(TransportError::from)?.to_vec();

			Ok(WireResponse { status, body })
		})
	}
}
#[cfg(feature = "reqwest")]
impl From<Verb> for reqwest::Method {
	fn from(verb: Verb) -> Self {
		match verb {
			Verb::Get => reqwest::Method::GET,
			Verb::Post => reqwest::Method::POST,
			Verb::Put => reqwest::Method::PUT,
			Verb::Patch => reqwest::Method::PATCH,
			Verb::Delete => reqwest::Method::DELETE,
		}
	}
}

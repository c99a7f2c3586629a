//! Session-aware HTTP client: verb facade, request decoration, expiry
//! classification, and one-shot replay after a coordinated refresh.
//!
//! The pipeline for every call is decorate → send → classify → maybe refresh →
//! maybe replay. Classification and the refresh gate acquisition are a single
//! step, so two requests whose failures overlap can never both enter the
//! refresh path: the loser observes the held gate and is surfaced to its
//! caller as an ordinary terminal failure, not queued.

pub mod refresh;
pub use refresh::RefreshMetrics;

// crates.io
use tracing::debug;
// self
use crate::{
	_prelude::*,
	cookie::{CookieSource, cookie_value},
	error::ConfigError,
	http::{SessionHttpClient, WireRequest, WireResponse},
	request::{ApiRequest, Verb},
	response::ApiPayload,
	session::{LoggingRedirect, SessionDescriptor, SignInRedirect},
};
#[cfg(feature = "reqwest")]
use crate::{cookie::JarCookieSource, http::ReqwestHttpClient};

#[cfg(feature = "reqwest")]
/// Session client specialized for the crate's default reqwest transport.
pub type ReqwestSessionClient = SessionClient<ReqwestHttpClient>;

/// Client-side access layer for one cookie-session backend.
///
/// Owns the transport, the readable cookie surface, and the request-triggered
/// refresh gate so the verb facade can hide expiry recovery from callers.
/// Clones share all of that state, which is what lets the background
/// scheduler reuse a caller's client.
pub struct SessionClient<C>
where
	C: ?Sized + SessionHttpClient,
{
	/// Transport used for every outbound call.
	pub http_client: Arc<C>,
	/// Readable cookie surface (anti-forgery mirrors only).
	pub cookies: Arc<dyn CookieSource>,
	/// Endpoint, cookie-name, and interval configuration.
	pub descriptor: SessionDescriptor,
	/// Hook fired when the session cannot be re-established.
	pub sign_in_redirect: Arc<dyn SignInRedirect>,
	/// Shared counters for refresh outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
	refresh_gate: Arc<AsyncMutex<()>>,
}
impl<C> SessionClient<C>
where
	C: ?Sized + SessionHttpClient,
{
	/// Creates a client that reuses the caller-provided transport + cookie source.
	pub fn with_http_client(
		http_client: impl Into<Arc<C>>,
		cookies: Arc<dyn CookieSource>,
		descriptor: SessionDescriptor,
	) -> Self {
		Self {
			http_client: http_client.into(),
			cookies,
			descriptor,
			sign_in_redirect: Arc::new(LoggingRedirect),
			refresh_metrics: Default::default(),
			refresh_gate: Default::default(),
		}
	}

	/// Replaces the sign-in redirect hook.
	pub fn with_sign_in_redirect(mut self, redirect: Arc<dyn SignInRedirect>) -> Self {
		self.sign_in_redirect = redirect;

		self
	}

	/// Issues a GET request.
	pub async fn get(&self, path: &str) -> Result<ApiPayload> {
		self.send(ApiRequest::new(Verb::Get, path)).await
	}

	/// Issues a POST request with a JSON payload.
	pub async fn post(&self, path: &str, payload: Value) -> Result<ApiPayload> {
		self.send(ApiRequest::new(Verb::Post, path).with_payload(payload)).await
	}

	/// Issues a PUT request with a JSON payload.
	pub async fn put(&self, path: &str, payload: Value) -> Result<ApiPayload> {
		self.send(ApiRequest::new(Verb::Put, path).with_payload(payload)).await
	}

	/// Issues a PATCH request with a JSON payload.
	pub async fn patch(&self, path: &str, payload: Value) -> Result<ApiPayload> {
		self.send(ApiRequest::new(Verb::Patch, path).with_payload(payload)).await
	}

	/// Issues a DELETE request with a JSON payload.
	pub async fn delete(&self, path: &str, payload: Value) -> Result<ApiPayload> {
		self.send(ApiRequest::new(Verb::Delete, path).with_payload(payload)).await
	}

	/// Dispatches a descriptor through the full pipeline.
	///
	/// Structured bodies—success or failure—come back as `Ok(payload)`;
	/// callers inspect [`ApiPayload::success`]. Only unstructured responses
	/// and transport failures are raised as errors. A failed refresh fires
	/// the sign-in redirect and then normalizes the *original* failed
	/// response the same way, so a structured expiry body still reaches the
	/// caller as a value.
	pub async fn send(&self, request: ApiRequest) -> Result<ApiPayload> {
		let mut request = request;
		let response = self.transmit(&request).await?;

		if response.is_success() {
			return ApiPayload::from_response(&response);
		}

		let Some(in_flight) = self.classify(&request, &response) else {
			return ApiPayload::from_response(&response);
		};

		if !self.refresh_session(in_flight).await {
			self.sign_in_redirect.redirect_to_sign_in(&self.descriptor.sign_in_url);

			return ApiPayload::from_response(&response);
		}

		request.mark_retried();
		debug!(path = %request.path, "replaying request after refresh");

		let replay = self.transmit(&request).await?;

		ApiPayload::from_response(&replay)
	}

	/// Reads a cookie value fresh from the source (never cached).
	pub fn cookie(&self, name: &str) -> String {
		cookie_value(&self.cookies.cookie_line(), name)
	}

	/// Classifies a failed response, acquiring the refresh gate when the
	/// request is eligible for a refresh-and-replay cycle.
	///
	/// The eligibility check and the gate acquisition are one atomic try-lock;
	/// `None` means terminal. Logout and refresh calls are always terminal, as
	/// is anything that already replayed once.
	fn classify(&self, request: &ApiRequest, response: &WireResponse) -> Option<MutexGuardArc<()>> {
		if !response.is_unauthenticated() || request.retried() {
			return None;
		}
		if self.descriptor.is_logout(&request.path) || self.descriptor.is_refresh(&request.path) {
			return None;
		}

		self.refresh_gate.try_lock_arc()
	}

	/// Decorates and executes one wire call.
	pub(crate) async fn transmit(&self, request: &ApiRequest) -> Result<WireResponse> {
		let wire = self.decorate(request)?;

		debug!(verb = %request.verb, url = %wire.url, retried = request.retried(), "dispatching request");

		Ok(self.http_client.execute(wire).await?)
	}

	/// Computes the anti-forgery header for an outgoing request.
	///
	/// Tokens rotate across refreshes, so the header is recomputed from the
	/// cookie surface on every call, including replays. Safe reads are never
	/// decorated; caller-supplied headers win over the computed one.
	fn decorate(&self, request: &ApiRequest) -> Result<WireRequest, ConfigError> {
		let url = self.descriptor.endpoint_url(&request.path)?;
		let mut headers = BTreeMap::new();

		if !request.verb.is_safe() {
			let cookie = if self.descriptor.is_refresh(&request.path) {
				&self.descriptor.refresh_cookie
			} else {
				&self.descriptor.access_cookie
			};
			let token = self.cookie(cookie);

			if !token.is_empty() {
				headers.insert(self.descriptor.csrf_header.clone(), token);
			}
		}

		headers.extend(request.headers.iter().map(|(name, value)| (name.clone(), value.clone())));

		let payload = if request.verb.is_safe() { None } else { request.payload.clone() };

		Ok(WireRequest { verb: request.verb, url, headers, payload })
	}
}
impl<C> Clone for SessionClient<C>
where
	C: ?Sized + SessionHttpClient,
{
	fn clone(&self) -> Self {
		Self {
			http_client: Arc::clone(&self.http_client),
			cookies: Arc::clone(&self.cookies),
			descriptor: self.descriptor.clone(),
			sign_in_redirect: Arc::clone(&self.sign_in_redirect),
			refresh_metrics: Arc::clone(&self.refresh_metrics),
			refresh_gate: Arc::clone(&self.refresh_gate),
		}
	}
}
impl<C> Debug for SessionClient<C>
where
	C: ?Sized + SessionHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionClient").field("descriptor", &self.descriptor).finish()
	}
}
#[cfg(feature = "reqwest")]
impl SessionClient<ReqwestHttpClient> {
	/// Creates a client with the crate's default reqwest transport.
	///
	/// Provisions a cookie jar shared between the transport and the request
	/// decorator: session cookies ride every call automatically and rotated
	/// anti-forgery cookies are visible to the next decoration pass.
	pub fn new(descriptor: SessionDescriptor) -> Result<Self, ConfigError> {
		let jar = Arc::new(reqwest::cookie::Jar::default());
		let http_client = ReqwestHttpClient::with_jar(jar.clone())?;
		let cookies = Arc::new(JarCookieSource::new(jar, descriptor.base_url.clone()));

		Ok(Self::with_http_client(http_client, cookies, descriptor))
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{cookie::MemoryCookieSource, http::TransportFuture};

	struct StaticHttpClient(u16);
	impl SessionHttpClient for StaticHttpClient {
		fn execute(&self, _request: WireRequest) -> TransportFuture<'_> {
			let status = self.0;

			Box::pin(async move { Ok(WireResponse { status, body: Vec::new() }) })
		}
	}

	fn descriptor() -> SessionDescriptor {
		SessionDescriptor::builder(
			Url::parse("https://backend.example/api").expect("Base URL fixture should parse."),
		)
		.build()
		.expect("Descriptor fixture should build.")
	}

	fn client(cookie_line: &str) -> SessionClient<StaticHttpClient> {
		let cookies = MemoryCookieSource::default();

		cookies.set_line(cookie_line);

		SessionClient::with_http_client(StaticHttpClient(200), Arc::new(cookies), descriptor())
	}

	fn unauthenticated() -> WireResponse {
		WireResponse { status: 401, body: Vec::new() }
	}

	#[test]
	fn decorator_selects_the_access_bound_token() {
		let client = client("csrf_access_token=a1; csrf_refresh_token=r1");
		let wire = client
			.decorate(&ApiRequest::new(Verb::Post, "/admin/users/create"))
			.expect("Decoration should succeed.");

		assert_eq!(wire.headers.get("X-CSRF-TOKEN").map(String::as_str), Some("a1"));
	}

	#[test]
	fn decorator_selects_the_refresh_bound_token_for_the_refresh_endpoint() {
		let client = client("csrf_access_token=a1; csrf_refresh_token=r1");
		let wire = client
			.decorate(&ApiRequest::new(Verb::Post, "/auth/refresh"))
			.expect("Decoration should succeed.");

		assert_eq!(wire.headers.get("X-CSRF-TOKEN").map(String::as_str), Some("r1"));
	}

	#[test]
	fn decorator_skips_safe_reads_and_empty_tokens() {
		let client = client("csrf_access_token=a1; csrf_refresh_token=r1");
		let get = client
			.decorate(&ApiRequest::new(Verb::Get, "/admin/users"))
			.expect("Decoration should succeed.");

		assert!(get.headers.is_empty());

		let bare = self::client("");
		let post = bare
			.decorate(&ApiRequest::new(Verb::Post, "/admin/users/create"))
			.expect("Decoration should succeed.");

		assert!(post.headers.is_empty());
	}

	#[test]
	fn decorator_drops_payloads_on_safe_reads() {
		let client = client("");
		let wire = client
			.decorate(
				&ApiRequest::new(Verb::Get, "/admin/users")
					.with_payload(serde_json::json!({"ignored": true})),
			)
			.expect("Decoration should succeed.");

		assert!(wire.payload.is_none());
	}

	#[test]
	fn caller_headers_override_the_computed_token() {
		let client = client("csrf_access_token=a1; csrf_refresh_token=r1");
		let wire = client
			.decorate(
				&ApiRequest::new(Verb::Post, "/admin/users/create")
					.with_header("X-CSRF-TOKEN", "explicit"),
			)
			.expect("Decoration should succeed.");

		assert_eq!(wire.headers.get("X-CSRF-TOKEN").map(String::as_str), Some("explicit"));
	}

	#[test]
	fn classify_rejects_everything_but_fresh_unauthenticated_resource_calls() {
		let client = client("");
		let ok = WireResponse { status: 500, body: Vec::new() };

		assert!(client.classify(&ApiRequest::new(Verb::Post, "/admin/users"), &ok).is_none());
		assert!(
			client
				.classify(&ApiRequest::new(Verb::Post, "/auth/logout"), &unauthenticated())
				.is_none()
		);
		assert!(
			client
				.classify(&ApiRequest::new(Verb::Post, "/auth/refresh"), &unauthenticated())
				.is_none()
		);

		let mut replayed = ApiRequest::new(Verb::Post, "/admin/users");

		replayed.mark_retried();

		assert!(client.classify(&replayed, &unauthenticated()).is_none());
		assert!(
			client
				.classify(&ApiRequest::new(Verb::Post, "/admin/users"), &unauthenticated())
				.is_some()
		);
	}

	#[test]
	fn classify_observes_a_held_refresh_gate() {
		let client = client("");
		let held = client
			.refresh_gate
			.try_lock_arc()
			.expect("Gate should be free before the first classification.");
		let request = ApiRequest::new(Verb::Post, "/admin/users");

		assert!(client.classify(&request, &unauthenticated()).is_none());

		drop(held);

		assert!(client.classify(&request, &unauthenticated()).is_some());
	}
}

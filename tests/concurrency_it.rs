// std
use std::{
	sync::{
		Arc,
		atomic::{AtomicBool, AtomicUsize, Ordering},
	},
	time::Duration,
};
// self
use session_courier::{
	client::SessionClient,
	cookie::MemoryCookieSource,
	http::{SessionHttpClient, TransportFuture, WireRequest, WireResponse},
	session::SessionDescriptor,
	url::Url,
};

fn structured(success: bool, message: &str, status: u16) -> WireResponse {
	WireResponse {
		status,
		body: serde_json::json!({ "success": success, "message": message }).to_string().into_bytes(),
	}
}

/// Transport stub scripting an expired session: every resource call answers 401
/// until the slow refresh completes, then answers success.
#[derive(Default)]
struct ExpiredSessionHttpClient {
	refreshed: AtomicBool,
	refresh_calls: AtomicUsize,
	alpha_calls: AtomicUsize,
	beta_calls: AtomicUsize,
}
impl SessionHttpClient for ExpiredSessionHttpClient {
	fn execute(&self, request: WireRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			match request.url.path() {
				"/auth/refresh" => {
					self.refresh_calls.fetch_add(1, Ordering::SeqCst);
					tokio::time::sleep(Duration::from_millis(300)).await;
					self.refreshed.store(true, Ordering::SeqCst);

					Ok(structured(true, "refreshed", 200))
				},
				"/alpha" => {
					self.alpha_calls.fetch_add(1, Ordering::SeqCst);

					if self.refreshed.load(Ordering::SeqCst) {
						Ok(structured(true, "alpha done", 200))
					} else {
						Ok(structured(false, "Missing session", 401))
					}
				},
				"/beta" => {
					self.beta_calls.fetch_add(1, Ordering::SeqCst);
					// Land this failure while the refresh above is in flight.
					tokio::time::sleep(Duration::from_millis(100)).await;

					Ok(structured(false, "Missing session", 401))
				},
				path => unreachable!("unexpected path {path}"),
			}
		})
	}
}

#[tokio::test]
async fn overlapping_failures_trigger_exactly_one_refresh() {
	let descriptor = SessionDescriptor::builder(
		Url::parse("https://backend.example/api").expect("Base URL should parse."),
	)
	.build()
	.expect("Session descriptor should build.");
	let transport = Arc::new(ExpiredSessionHttpClient::default());
	let client: SessionClient<ExpiredSessionHttpClient> = SessionClient::with_http_client(
		transport.clone(),
		Arc::new(MemoryCookieSource::default()),
		descriptor,
	);

	let (alpha, beta) = tokio::join!(
		client.post("/alpha", serde_json::json!({})),
		client.post("/beta", serde_json::json!({})),
	);

	// The gate winner refreshed and replayed to success.
	let alpha = alpha.expect("Winner should replay to success.");

	assert!(alpha.success);
	assert_eq!(alpha.message.as_deref(), Some("alpha done"));

	// The loser observed the held gate and got its failure back as a value.
	let beta = beta.expect("Loser should surface its failure as a value.");

	assert!(!beta.success);
	assert_eq!(beta.message.as_deref(), Some("Missing session"));

	assert_eq!(transport.refresh_calls.load(Ordering::SeqCst), 1);
	assert_eq!(transport.alpha_calls.load(Ordering::SeqCst), 2);
	assert_eq!(transport.beta_calls.load(Ordering::SeqCst), 1);
	assert_eq!(client.refresh_metrics.attempts(), 1);
	assert_eq!(client.refresh_metrics.successes(), 1);
}

#[tokio::test]
async fn the_gate_is_released_after_a_failed_refresh() {
	/// Always answers 401, including on the refresh path.
	struct AlwaysExpiredHttpClient {
		refresh_calls: AtomicUsize,
	}
	impl SessionHttpClient for AlwaysExpiredHttpClient {
		fn execute(&self, request: WireRequest) -> TransportFuture<'_> {
			Box::pin(async move {
				if request.url.path() == "/auth/refresh" {
					self.refresh_calls.fetch_add(1, Ordering::SeqCst);
				}

				Ok(structured(false, "expired", 401))
			})
		}
	}

	let descriptor = SessionDescriptor::builder(
		Url::parse("https://backend.example/api").expect("Base URL should parse."),
	)
	.build()
	.expect("Session descriptor should build.");
	let transport = Arc::new(AlwaysExpiredHttpClient { refresh_calls: AtomicUsize::new(0) });
	let client: SessionClient<AlwaysExpiredHttpClient> = SessionClient::with_http_client(
		transport.clone(),
		Arc::new(MemoryCookieSource::default()),
		descriptor,
	);

	let first = client
		.post("/alpha", serde_json::json!({}))
		.await
		.expect("The original failure should surface as a value.");
	let second = client
		.post("/alpha", serde_json::json!({}))
		.await
		.expect("The gate must be free again for the next failure.");

	assert!(!first.success);
	assert!(!second.success);
	// Two refresh calls prove the gate was released after the first rejection.
	assert_eq!(transport.refresh_calls.load(Ordering::SeqCst), 2);
	assert_eq!(client.refresh_metrics.failures(), 2);
}

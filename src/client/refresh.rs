//! Single-flight session refresh.
//!
//! The request-triggered coordinator runs here: the caller that won the gate
//! posts to the refresh endpoint with the refresh-bound anti-forgery token and
//! hands control back to the replay path on success. The gate guard is an RAII
//! value, so it is released on every exit—including transport failures—before
//! control returns to any caller. The background scheduler shares only the
//! request builder and the facade; its in-flight tracking is its own.

// std
use std::sync::atomic::{AtomicU64, Ordering};

// crates.io
use tracing::{error, info};
// self
use crate::{
	_prelude::*,
	client::SessionClient,
	http::SessionHttpClient,
	request::{ApiRequest, Verb},
	response::ApiPayload,
};

/// Thread-safe counters for session refresh outcomes.
#[derive(Debug, Default)]
pub struct RefreshMetrics {
	attempts: AtomicU64,
	success: AtomicU64,
	failure: AtomicU64,
}
impl RefreshMetrics {
	/// Returns the total number of request-triggered refresh attempts.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of refresh calls the server accepted.
	pub fn successes(&self) -> u64 {
		self.success.load(Ordering::Relaxed)
	}

	/// Returns the number of refresh calls that failed or were rejected.
	pub fn failures(&self) -> u64 {
		self.failure.load(Ordering::Relaxed)
	}

	pub(crate) fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_success(&self) {
		self.success.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failure.fetch_add(1, Ordering::Relaxed);
	}
}

impl<C> SessionClient<C>
where
	C: ?Sized + SessionHttpClient,
{
	/// Performs the request-triggered refresh while holding the single-flight gate.
	///
	/// Returns whether the session was re-established. A rejected refresh and
	/// a refresh that dies in transit are both logged and counted here; the
	/// caller decides what the original request's outcome looks like.
	pub(crate) async fn refresh_session(&self, _in_flight: MutexGuardArc<()>) -> bool {
		self.refresh_metrics.record_attempt();
		info!("attempting session refresh");

		match self.transmit(&self.refresh_request()).await {
			Ok(response) if response.is_success() => {
				self.refresh_metrics.record_success();
				info!("session refresh succeeded");

				true
			},
			Ok(response) => {
				self.refresh_metrics.record_failure();
				error!(status = response.status, "session refresh was rejected");

				false
			},
			Err(err) => {
				self.refresh_metrics.record_failure();
				error!(error = %err, "session refresh failed before a response arrived");

				false
			},
		}
	}

	/// Builds the refresh POST with the refresh-bound token attached explicitly,
	/// independent of whatever the decorator computes for the path.
	pub(crate) fn refresh_request(&self) -> ApiRequest {
		let token = self.cookie(&self.descriptor.refresh_cookie);

		ApiRequest::new(Verb::Post, &self.descriptor.refresh_path)
			.with_payload(Value::Object(serde_json::Map::new()))
			.with_header(&self.descriptor.csrf_header, token)
	}

	/// Refresh entry point used by the scheduler's ticks.
	///
	/// Flows through the verb facade, so a rejection comes back as a payload
	/// with `success == false` rather than a redirect: the refresh path is
	/// exempt from expiry classification.
	pub(crate) async fn scheduled_refresh(&self) -> Result<ApiPayload> {
		self.send(self.refresh_request()).await
	}
}

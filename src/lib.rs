//! Cookie-session HTTP access layer—anti-forgery header decoration, expiry-aware
//! retry, single-flight session refresh, and a background token keep-alive for
//! API clients talking to cookie-based backends.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod client;
pub mod cookie;
pub mod error;
pub mod http;
pub mod request;
pub mod response;
pub mod scheduler;
pub mod session;

#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` feature.

	// std
	use std::sync::atomic::{AtomicUsize, Ordering};

	pub use crate::_prelude::*;

	// crates.io
	use reqwest::cookie::Jar;
	// self
	use crate::{
		client::SessionClient,
		cookie::JarCookieSource,
		http::ReqwestHttpClient,
		session::{SessionDescriptor, SignInRedirect},
	};

	/// Client type alias used by reqwest-backed integration tests.
	pub type ReqwestTestClient = SessionClient<ReqwestHttpClient>;

	/// Adds a host-scoped cookie to the shared jar, as a `Set-Cookie` response would.
	pub fn seed_cookie(jar: &Jar, origin: &Url, name: &str, value: &str) {
		jar.add_cookie_str(&format!("{name}={value}; Path=/"), origin);
	}

	/// Constructs a [`SessionClient`] wired to a fresh cookie jar and the provided
	/// sign-in redirect hook, returning the jar so tests can seed cookies.
	pub fn build_reqwest_test_client(
		descriptor: SessionDescriptor,
		redirect: Arc<dyn SignInRedirect>,
	) -> (ReqwestTestClient, Arc<Jar>) {
		let jar = Arc::new(Jar::default());
		let http_client = ReqwestHttpClient::with_jar(jar.clone())
			.expect("Failed to build reqwest client for tests.");
		let cookies = Arc::new(JarCookieSource::new(jar.clone(), descriptor.base_url.clone()));
		let client = SessionClient::with_http_client(http_client, cookies, descriptor)
			.with_sign_in_redirect(redirect);

		(client, jar)
	}

	/// Sign-in redirect hook that counts invocations for assertions.
	#[derive(Debug, Default)]
	pub struct RecordingRedirect(AtomicUsize);
	impl RecordingRedirect {
		/// Number of redirects observed so far.
		pub fn count(&self) -> usize {
			self.0.load(Ordering::SeqCst)
		}
	}
	impl SignInRedirect for RecordingRedirect {
		fn redirect_to_sign_in(&self, _sign_in_url: &Url) {
			self.0.fetch_add(1, Ordering::SeqCst);
		}
	}
}

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
		time::Duration,
	};

	pub use async_lock::{Mutex as AsyncMutex, MutexGuardArc};
	pub use parking_lot::RwLock;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::Value;
	pub use thiserror::Error as ThisError;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use httpmock as _;

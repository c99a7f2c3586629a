//! Accessors for the readable anti-forgery cookie surface.
//!
//! The session cookies themselves are opaque to this layer and are never read
//! here; only the anti-forgery mirror cookies are consulted. Lookups always go
//! back to the source so values rotated by the server are picked up on the
//! very next request.

// self
use crate::_prelude::*;
#[cfg(feature = "reqwest")] use reqwest::cookie::{CookieStore, Jar};

/// Read-only view over the cookie line visible to this client.
pub trait CookieSource
where
	Self: Send + Sync,
{
	/// Returns the raw `name=value; name2=value2` cookie line, or an empty
	/// string when no cookies are present.
	fn cookie_line(&self) -> String;
}

/// Returns the decoded value of the first cookie named `name`.
///
/// Values are percent-decoded. Absence is an empty string, never an error, and
/// a value that fails to decode is returned verbatim for the same reason: the
/// decorator treats both like a missing token.
pub fn cookie_value(line: &str, name: &str) -> String {
	for pair in line.split(';') {
		let Some(value) =
			pair.trim_start().strip_prefix(name).and_then(|rest| rest.strip_prefix('='))
		else {
			continue;
		};

		return urlencoding::decode(value)
			.map(|decoded| decoded.into_owned())
			.unwrap_or_else(|_| value.to_string());
	}

	String::new()
}

/// In-process cookie source for embedders that manage their own cookie line.
#[derive(Debug, Default)]
pub struct MemoryCookieSource(RwLock<String>);
impl MemoryCookieSource {
	/// Replaces the stored cookie line.
	pub fn set_line(&self, line: impl Into<String>) {
		*self.0.write() = line.into();
	}
}
impl CookieSource for MemoryCookieSource {
	fn cookie_line(&self) -> String {
		self.0.read().clone()
	}
}

#[cfg(feature = "reqwest")]
/// Cookie source backed by the shared reqwest cookie jar.
///
/// The jar is the same one the transport writes `Set-Cookie` responses into,
/// so a successful refresh rotates the values this source reports.
pub struct JarCookieSource {
	jar: Arc<Jar>,
	origin: Url,
}
#[cfg(feature = "reqwest")]
impl JarCookieSource {
	/// Creates a source that reads cookies scoped to `origin`.
	pub fn new(jar: Arc<Jar>, origin: Url) -> Self {
		Self { jar, origin }
	}
}
#[cfg(feature = "reqwest")]
impl CookieSource for JarCookieSource {
	fn cookie_line(&self) -> String {
		self.jar
			.cookies(&self.origin)
			.and_then(|header| header.to_str().ok().map(ToOwned::to_owned))
			.unwrap_or_default()
	}
}

//! Session descriptor: endpoints, cookie names, and the sign-in redirect hook
//! for one cookie-session backend.

// self
use crate::{_prelude::*, error::ConfigError};

/// Default refresh endpoint path.
pub const DEFAULT_REFRESH_PATH: &str = "/auth/refresh";
/// Default logout endpoint path.
pub const DEFAULT_LOGOUT_PATH: &str = "/auth/logout";
/// Default sign-in entry point path on the base origin.
pub const DEFAULT_SIGN_IN_PATH: &str = "/login";
/// Header carrying the anti-forgery token on state-changing requests.
pub const DEFAULT_CSRF_HEADER: &str = "X-CSRF-TOKEN";
/// Cookie mirroring the access-bound anti-forgery token.
pub const DEFAULT_ACCESS_COOKIE: &str = "csrf_access_token";
/// Cookie mirroring the refresh-bound anti-forgery token.
pub const DEFAULT_REFRESH_COOKIE: &str = "csrf_refresh_token";
/// Default interval between scheduled keep-alive refreshes.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Validated configuration for one cookie-session backend.
#[derive(Clone, Debug)]
pub struct SessionDescriptor {
	/// Base URL every request path is appended to.
	pub base_url: Url,
	/// Sign-in entry point handed to the redirect hook on unrecoverable expiry.
	pub sign_in_url: Url,
	/// Path fragment identifying the refresh endpoint.
	pub refresh_path: String,
	/// Path fragment identifying the logout endpoint.
	pub logout_path: String,
	/// Anti-forgery header name.
	pub csrf_header: String,
	/// Access-bound anti-forgery cookie name.
	pub access_cookie: String,
	/// Refresh-bound anti-forgery cookie name.
	pub refresh_cookie: String,
	/// Interval between scheduled keep-alive refreshes.
	pub refresh_interval: Duration,
}
impl SessionDescriptor {
	/// Starts a builder with the default endpoint/cookie/header contract.
	pub fn builder(base_url: Url) -> SessionDescriptorBuilder {
		SessionDescriptorBuilder {
			base_url,
			sign_in_url: None,
			refresh_path: DEFAULT_REFRESH_PATH.into(),
			logout_path: DEFAULT_LOGOUT_PATH.into(),
			csrf_header: DEFAULT_CSRF_HEADER.into(),
			access_cookie: DEFAULT_ACCESS_COOKIE.into(),
			refresh_cookie: DEFAULT_REFRESH_COOKIE.into(),
			refresh_interval: DEFAULT_REFRESH_INTERVAL,
		}
	}

	/// Builds the absolute URL for a request path.
	///
	/// A missing leading `/` is inserted, so relative paths join onto the base
	/// instead of concatenating into its last segment.
	pub fn endpoint_url(&self, path: &str) -> Result<Url, ConfigError> {
		let base = self.base_url.as_str().trim_end_matches('/');
		let separator = if path.starts_with('/') { "" } else { "/" };

		Url::parse(&format!("{base}{separator}{path}"))
			.map_err(|source| ConfigError::InvalidPath { path: path.to_string(), source })
	}

	/// True when `path` targets the refresh endpoint.
	///
	/// Matching is substring containment, so callers may pass paths with query
	/// strings or prefixes and still hit the exemption.
	pub fn is_refresh(&self, path: &str) -> bool {
		path.contains(&self.refresh_path)
	}

	/// True when `path` targets the logout endpoint.
	pub fn is_logout(&self, path: &str) -> bool {
		path.contains(&self.logout_path)
	}
}

/// Builder for [`SessionDescriptor`].
#[derive(Clone, Debug)]
pub struct SessionDescriptorBuilder {
	base_url: Url,
	sign_in_url: Option<Url>,
	refresh_path: String,
	logout_path: String,
	csrf_header: String,
	access_cookie: String,
	refresh_cookie: String,
	refresh_interval: Duration,
}
impl SessionDescriptorBuilder {
	/// Overrides the refresh endpoint path.
	pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
		self.refresh_path = path.into();

		self
	}

	/// Overrides the logout endpoint path.
	pub fn logout_path(mut self, path: impl Into<String>) -> Self {
		self.logout_path = path.into();

		self
	}

	/// Overrides the sign-in entry point (defaults to `/login` on the base origin).
	pub fn sign_in_url(mut self, url: Url) -> Self {
		self.sign_in_url = Some(url);

		self
	}

	/// Overrides the anti-forgery header name.
	pub fn csrf_header(mut self, name: impl Into<String>) -> Self {
		self.csrf_header = name.into();

		self
	}

	/// Overrides the access-bound cookie name.
	pub fn access_cookie(mut self, name: impl Into<String>) -> Self {
		self.access_cookie = name.into();

		self
	}

	/// Overrides the refresh-bound cookie name.
	pub fn refresh_cookie(mut self, name: impl Into<String>) -> Self {
		self.refresh_cookie = name.into();

		self
	}

	/// Overrides the scheduled keep-alive interval.
	pub fn refresh_interval(mut self, interval: Duration) -> Self {
		self.refresh_interval = interval;

		self
	}

	/// Validates the configuration and produces a descriptor.
	pub fn build(self) -> Result<SessionDescriptor, SessionDescriptorError> {
		for (field, path) in [("refresh", &self.refresh_path), ("logout", &self.logout_path)] {
			if !path.starts_with('/') {
				return Err(SessionDescriptorError::RelativePath { field, path: path.clone() });
			}
		}
		for (field, name) in [
			("csrf_header", &self.csrf_header),
			("access_cookie", &self.access_cookie),
			("refresh_cookie", &self.refresh_cookie),
		] {
			if name.trim().is_empty() {
				return Err(SessionDescriptorError::EmptyName { field });
			}
		}
		if self.access_cookie == self.refresh_cookie {
			return Err(SessionDescriptorError::CookieNameCollision);
		}
		if self.refresh_interval.is_zero() {
			return Err(SessionDescriptorError::ZeroInterval);
		}

		let sign_in_url = match self.sign_in_url {
			Some(url) => url,
			None => self
				.base_url
				.join(DEFAULT_SIGN_IN_PATH)
				.map_err(|source| SessionDescriptorError::InvalidSignInUrl { source })?,
		};

		Ok(SessionDescriptor {
			base_url: self.base_url,
			sign_in_url,
			refresh_path: self.refresh_path,
			logout_path: self.logout_path,
			csrf_header: self.csrf_header,
			access_cookie: self.access_cookie,
			refresh_cookie: self.refresh_cookie,
			refresh_interval: self.refresh_interval,
		})
	}
}

/// Validation failures raised by [`SessionDescriptorBuilder::build`].
#[derive(Debug, ThisError)]
pub enum SessionDescriptorError {
	/// Endpoint paths must be absolute so substring matching stays unambiguous.
	#[error("The {field} path `{path}` must start with `/`.")]
	RelativePath {
		/// Offending builder field.
		field: &'static str,
		/// Rejected path value.
		path: String,
	},
	/// Header and cookie names must be non-empty.
	#[error("The {field} name must not be empty.")]
	EmptyName {
		/// Offending builder field.
		field: &'static str,
	},
	/// Access- and refresh-bound cookies must be distinct.
	#[error("Access and refresh cookie names must differ.")]
	CookieNameCollision,
	/// The keep-alive interval must be positive.
	#[error("The refresh interval must be greater than zero.")]
	ZeroInterval,
	/// The sign-in entry point could not be derived from the base URL.
	#[error("Sign-in URL could not be derived from the base URL.")]
	InvalidSignInUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
}

/// Hook invoked when the session cannot be re-established.
///
/// The access layer fires this exactly once per failed request-triggered
/// refresh; embedders decide what navigating to the sign-in page means in
/// their environment.
pub trait SignInRedirect
where
	Self: Send + Sync,
{
	/// Called with the configured sign-in entry point.
	fn redirect_to_sign_in(&self, sign_in_url: &Url);
}

/// Default redirect hook that only records the event.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingRedirect;
impl SignInRedirect for LoggingRedirect {
	fn redirect_to_sign_in(&self, sign_in_url: &Url) {
		tracing::warn!(%sign_in_url, "session lost; redirecting to sign-in");
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn base() -> Url {
		Url::parse("https://backend.example/api").expect("Base URL fixture should parse.")
	}

	#[test]
	fn builder_defaults_match_the_server_contract() {
		let descriptor =
			SessionDescriptor::builder(base()).build().expect("Default descriptor should build.");

		assert_eq!(descriptor.refresh_path, "/auth/refresh");
		assert_eq!(descriptor.logout_path, "/auth/logout");
		assert_eq!(descriptor.csrf_header, "X-CSRF-TOKEN");
		assert_eq!(descriptor.access_cookie, "csrf_access_token");
		assert_eq!(descriptor.refresh_cookie, "csrf_refresh_token");
		assert_eq!(descriptor.refresh_interval, Duration::from_secs(300));
		assert_eq!(descriptor.sign_in_url.as_str(), "https://backend.example/login");
	}

	#[test]
	fn endpoint_url_appends_paths_to_the_base() {
		let descriptor =
			SessionDescriptor::builder(base()).build().expect("Default descriptor should build.");
		let url = descriptor
			.endpoint_url("/admin/users/create")
			.expect("Endpoint URL should build for an absolute path.");

		assert_eq!(url.as_str(), "https://backend.example/api/admin/users/create");

		let relative = descriptor
			.endpoint_url("admin/users/create")
			.expect("Endpoint URL should build for a relative path.");

		assert_eq!(relative.as_str(), "https://backend.example/api/admin/users/create");
	}

	#[test]
	fn refresh_and_logout_matching_uses_containment() {
		let descriptor =
			SessionDescriptor::builder(base()).build().expect("Default descriptor should build.");

		assert!(descriptor.is_refresh("/auth/refresh"));
		assert!(descriptor.is_refresh("/auth/refresh?source=timer"));
		assert!(descriptor.is_logout("/auth/logout"));
		assert!(!descriptor.is_refresh("/admin/users/create"));
	}

	#[test]
	fn builder_rejects_invalid_configurations() {
		let relative = SessionDescriptor::builder(base())
			.refresh_path("auth/refresh")
			.build()
			.expect_err("Relative refresh paths should be rejected.");

		assert!(matches!(relative, SessionDescriptorError::RelativePath { field: "refresh", .. }));

		let collision = SessionDescriptor::builder(base())
			.access_cookie("csrf_token")
			.refresh_cookie("csrf_token")
			.build()
			.expect_err("Identical cookie names should be rejected.");

		assert!(matches!(collision, SessionDescriptorError::CookieNameCollision));

		let zero = SessionDescriptor::builder(base())
			.refresh_interval(Duration::ZERO)
			.build()
			.expect_err("A zero keep-alive interval should be rejected.");

		assert!(matches!(zero, SessionDescriptorError::ZeroInterval));

		let empty = SessionDescriptor::builder(base())
			.csrf_header("  ")
			.build()
			.expect_err("Blank header names should be rejected.");

		assert!(matches!(empty, SessionDescriptorError::EmptyName { field: "csrf_header" }));
	}
}

//! Outgoing request descriptors produced by the verb facade.

// self
use crate::_prelude::*;

/// HTTP verbs exposed by the facade.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Verb {
	/// Safe read; never decorated with the anti-forgery header.
	Get,
	/// State-changing create.
	Post,
	/// State-changing replace.
	Put,
	/// State-changing partial update.
	Patch,
	/// State-changing delete.
	Delete,
}
impl Verb {
	/// Returns a stable lowercase label suitable for logs.
	pub const fn as_str(self) -> &'static str {
		match self {
			Verb::Get => "get",
			Verb::Post => "post",
			Verb::Put => "put",
			Verb::Patch => "patch",
			Verb::Delete => "delete",
		}
	}

	/// Safe reads carry no anti-forgery header and no payload.
	pub const fn is_safe(self) -> bool {
		matches!(self, Verb::Get)
	}
}
impl Display for Verb {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outgoing request descriptor; one per facade call.
///
/// The retried marker is set at most once, by the replay path after a
/// successful refresh, and is never reset. A descriptor that fails again after
/// its single replay is terminal.
#[derive(Clone, Debug)]
pub struct ApiRequest {
	/// HTTP verb for the call.
	pub verb: Verb,
	/// Request path joined onto the configured base URL (a missing leading `/`
	/// is inserted).
	pub path: String,
	/// Optional JSON payload (dropped for safe reads).
	pub payload: Option<Value>,
	/// Caller-supplied headers, merged on top of the decorator's header.
	pub headers: BTreeMap<String, String>,
	retried: bool,
}
impl ApiRequest {
	/// Creates a descriptor for the provided verb + path.
	pub fn new(verb: Verb, path: impl Into<String>) -> Self {
		Self {
			verb,
			path: path.into(),
			payload: None,
			headers: BTreeMap::new(),
			retried: false,
		}
	}

	/// Attaches a JSON payload.
	pub fn with_payload(mut self, payload: Value) -> Self {
		self.payload = Some(payload);

		self
	}

	/// Adds a header that overrides whatever the decorator computes.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.insert(name.into(), value.into());

		self
	}

	/// True once the descriptor has been replayed after a refresh.
	pub fn retried(&self) -> bool {
		self.retried
	}

	pub(crate) fn mark_retried(&mut self) {
		self.retried = true;
	}
}

//! Normalized result payloads decoded from server bodies.

// self
use crate::{_prelude::*, http::WireResponse};

/// Structured payload shape shared by every API endpoint.
///
/// Callers distinguish outcomes through [`ApiPayload::success`]: a structured
/// error body is surfaced as a value, never as an `Err`. Unknown fields are
/// preserved in [`ApiPayload::rest`] so the exact server payload round-trips.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct ApiPayload {
	/// Success indicator set by the server.
	#[serde(default)]
	pub success: bool,
	/// Optional human-readable message.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
	/// Optional response data.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<Value>,
	/// Remaining fields of the server payload.
	#[serde(flatten)]
	pub rest: serde_json::Map<String, Value>,
}
impl ApiPayload {
	/// Decodes a body, reporting the failing path on malformed documents.
	pub fn decode(body: &[u8]) -> Result<Self, serde_path_to_error::Error<serde_json::Error>> {
		let mut deserializer = serde_json::Deserializer::from_slice(body);

		serde_path_to_error::deserialize(&mut deserializer)
	}

	/// Normalizes a wire response into the crate's result shape.
	///
	/// Any decodable body—success status or not—becomes a payload value;
	/// bodies that fail to decode surface as [`Error::Unstructured`] carrying
	/// the response status.
	pub fn from_response(response: &WireResponse) -> Result<Self> {
		Self::decode(&response.body)
			.map_err(|source| Error::Unstructured { status: response.status, source })
	}
}

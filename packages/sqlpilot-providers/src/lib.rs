pub mod embedding;
pub mod generation;

mod error;

pub use error::{Error, Result};

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName};
use serde_json::{Map, Value};

/// Builds request headers. `Authorization` is only sent when a key is configured, since local
/// model servers usually run without one.
pub fn auth_headers(api_key: &str, default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	if !api_key.is_empty() {
		headers.insert(AUTHORIZATION, format!("Bearer {api_key}").parse()?);
	}

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::InvalidConfig {
				message: format!("Default header {key} must be a string."),
			});
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}

/// Sorts transport failures into the kinds callers act on: timeouts and unreachable backends are
/// reported separately from everything else.
pub(crate) fn classify(provider: &str, timeout_ms: u64, err: reqwest::Error) -> Error {
	if err.is_timeout() {
		Error::Timeout { provider: provider.to_string(), timeout_ms }
	} else if err.is_connect() {
		Error::Unavailable { provider: provider.to_string(), message: err.to_string() }
	} else {
		Error::Reqwest(err)
	}
}

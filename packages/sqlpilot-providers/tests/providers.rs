use reqwest::header::AUTHORIZATION;
use serde_json::{Map, Value};
use tokio::net::TcpListener;

use sqlpilot_config::{EmbeddingProviderConfig, LlmProviderConfig};
use sqlpilot_providers::Error;

fn generation_config(api_base: String, timeout_ms: u64) -> LlmProviderConfig {
	LlmProviderConfig {
		provider_id: "local".to_string(),
		api_base,
		api_key: String::new(),
		path: "/chat/completions".to_string(),
		model: "qwen2.5-coder:7b".to_string(),
		temperature: 0.1,
		timeout_ms,
		default_headers: Map::new(),
	}
}

fn embedding_config(api_base: String, timeout_ms: u64) -> EmbeddingProviderConfig {
	EmbeddingProviderConfig {
		provider_id: "local".to_string(),
		api_base,
		api_key: String::new(),
		path: "/embeddings".to_string(),
		model: "nomic-embed-text".to_string(),
		dimensions: 768,
		timeout_ms,
		default_headers: Map::new(),
	}
}

#[test]
fn builds_bearer_auth_header() {
	let headers =
		sqlpilot_providers::auth_headers("secret", &Map::new()).expect("Failed to build headers.");
	let value = headers.get(AUTHORIZATION).expect("Missing authorization header.");

	assert_eq!(value, "Bearer secret");
}

#[test]
fn omits_auth_header_without_key() {
	let mut defaults = Map::new();

	defaults.insert("x-trace".to_string(), Value::String("1".to_string()));

	let headers =
		sqlpilot_providers::auth_headers("", &defaults).expect("Failed to build headers.");

	assert!(headers.get(AUTHORIZATION).is_none());
	assert_eq!(headers.get("x-trace").expect("Missing default header."), "1");
}

#[test]
fn rejects_non_string_default_headers() {
	let mut defaults = Map::new();

	defaults.insert("x-retries".to_string(), Value::from(3));

	let err = sqlpilot_providers::auth_headers("", &defaults).expect_err("Expected config error.");

	assert!(matches!(err, Error::InvalidConfig { .. }), "Unexpected error: {err}");
}

#[tokio::test]
async fn silent_backend_surfaces_timeout() {
	// Bound but never accepted: the request is sent and no reply ever comes back.
	let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind listener.");
	let addr = listener.local_addr().expect("Failed to read listener address.");
	let cfg = generation_config(format!("http://{addr}"), 200);
	let err = sqlpilot_providers::generation::complete(&cfg, "SELECT?", 0.1)
		.await
		.expect_err("Expected timeout.");

	assert!(matches!(err, Error::Timeout { timeout_ms: 200, .. }), "Unexpected error: {err}");

	drop(listener);
}

#[tokio::test]
async fn closed_port_surfaces_unavailable() {
	let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind listener.");
	let addr = listener.local_addr().expect("Failed to read listener address.");

	drop(listener);

	let cfg = embedding_config(format!("http://{addr}"), 2_000);
	let err = sqlpilot_providers::embedding::embed(&cfg, &["orders".to_string()])
		.await
		.expect_err("Expected unavailable backend.");

	assert!(matches!(err, Error::Unavailable { .. }), "Unexpected error: {err}");
}

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub retrieval: Retrieval,
	#[serde(default)]
	pub query: Query,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub admin_bind: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	pub sqlite: Sqlite,
	pub qdrant: Qdrant,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Sqlite {
	pub path: String,
	#[serde(default = "default_max_connections")]
	pub max_connections: u32,
	/// Opens the database read-only. Mutating statements then fail at execution even when the
	/// validator lets them through.
	#[serde(default)]
	pub read_only: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub collection: String,
	pub vector_dim: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub generation: LlmProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	#[serde(default)]
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	#[serde(default)]
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Retrieval {
	#[serde(default = "default_true")]
	pub enabled: bool,
	#[serde(default = "default_top_k")]
	pub top_k: u32,
	#[serde(default = "default_similarity_threshold")]
	pub similarity_threshold: f32,
}
impl Default for Retrieval {
	fn default() -> Self {
		Self {
			enabled: true,
			top_k: default_top_k(),
			similarity_threshold: default_similarity_threshold(),
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct Query {
	/// Rejects anything but read-only statements. Turning it off downgrades the safety layer to
	/// warnings.
	#[serde(default = "default_true")]
	pub strict: bool,
	#[serde(default = "default_max_result_rows")]
	pub max_result_rows: u32,
	#[serde(default = "default_query_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default = "default_correction_temperature")]
	pub correction_temperature: f32,
	#[serde(default = "default_explain_temperature")]
	pub explain_temperature: f32,
}
impl Default for Query {
	fn default() -> Self {
		Self {
			strict: true,
			max_result_rows: default_max_result_rows(),
			timeout_ms: default_query_timeout_ms(),
			correction_temperature: default_correction_temperature(),
			explain_temperature: default_explain_temperature(),
		}
	}
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_max_connections() -> u32 {
	4
}

fn default_true() -> bool {
	true
}

fn default_top_k() -> u32 {
	5
}

fn default_similarity_threshold() -> f32 {
	0.3
}

fn default_max_result_rows() -> u32 {
	1_000
}

fn default_query_timeout_ms() -> u64 {
	30_000
}

fn default_correction_temperature() -> f32 {
	0.2
}

fn default_explain_temperature() -> f32 {
	0.3
}

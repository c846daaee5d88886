mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, EmbeddingProviderConfig, LlmProviderConfig, Providers, Qdrant, Query, Retrieval,
	Service, Sqlite, Storage,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.service.admin_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.admin_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.sqlite.path.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.sqlite.path must be non-empty.".to_string(),
		});
	}
	if cfg.storage.sqlite.max_connections == 0 {
		return Err(Error::Validation {
			message: "storage.sqlite.max_connections must be greater than zero.".to_string(),
		});
	}
	if cfg.storage.qdrant.collection.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.qdrant.collection must be non-empty.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.storage.qdrant.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.qdrant.vector_dim."
				.to_string(),
		});
	}

	for (label, timeout_ms) in [
		("providers.embedding.timeout_ms", cfg.providers.embedding.timeout_ms),
		("providers.generation.timeout_ms", cfg.providers.generation.timeout_ms),
		("query.timeout_ms", cfg.query.timeout_ms),
	] {
		if timeout_ms == 0 {
			return Err(Error::Validation {
				message: format!("{label} must be greater than zero."),
			});
		}
	}
	for (label, model) in [
		("providers.embedding.model", &cfg.providers.embedding.model),
		("providers.generation.model", &cfg.providers.generation.model),
	] {
		if model.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}
	for (label, temperature) in [
		("providers.generation.temperature", cfg.providers.generation.temperature),
		("query.correction_temperature", cfg.query.correction_temperature),
		("query.explain_temperature", cfg.query.explain_temperature),
	] {
		if !temperature.is_finite() {
			return Err(Error::Validation {
				message: format!("{label} must be a finite number."),
			});
		}
		if !(0.0..=2.0).contains(&temperature) {
			return Err(Error::Validation {
				message: format!("{label} must be in the range 0.0-2.0."),
			});
		}
	}

	if cfg.retrieval.top_k == 0 {
		return Err(Error::Validation {
			message: "retrieval.top_k must be greater than zero.".to_string(),
		});
	}
	if !cfg.retrieval.similarity_threshold.is_finite() {
		return Err(Error::Validation {
			message: "retrieval.similarity_threshold must be a finite number.".to_string(),
		});
	}
	if !(0.0..=1.0).contains(&cfg.retrieval.similarity_threshold) {
		return Err(Error::Validation {
			message: "retrieval.similarity_threshold must be in the range 0.0-1.0.".to_string(),
		});
	}
	if cfg.query.max_result_rows == 0 {
		return Err(Error::Validation {
			message: "query.max_result_rows must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.providers.embedding.api_key = cfg.providers.embedding.api_key.trim().to_string();
	cfg.providers.generation.api_key = cfg.providers.generation.api_key.trim().to_string();

	for api_base in
		[&mut cfg.providers.embedding.api_base, &mut cfg.providers.generation.api_base]
	{
		while api_base.ends_with('/') {
			api_base.pop();
		}
	}
}

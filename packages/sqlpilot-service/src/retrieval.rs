use serde::Serialize;
use serde_json::{Map, Value};

use crate::{Error, Result, SqlPilot};
use sqlpilot_storage::models::VectorHit;

/// Why retrieval produced nothing usable. Retrieval never fails outright.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Degradation {
	/// The collection is missing or holds no records.
	IndexMissing,
	Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalHit {
	pub table: String,
	pub similarity: f32,
	pub distance: f32,
	pub row_count: u64,
	pub column_count: u64,
	pub columns: Vec<String>,
	pub related_tables: Vec<String>,
	pub has_foreign_keys: bool,
	/// The stored profile text.
	pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalOutcome {
	/// Table names, most similar first.
	pub tables: Vec<String>,
	pub hits: Vec<RetrievalHit>,
	pub degraded: Option<Degradation>,
}
impl RetrievalOutcome {
	fn degraded(reason: Degradation) -> Self {
		Self { tables: Vec::new(), hits: Vec::new(), degraded: Some(reason) }
	}
}

impl SqlPilot {
	/// Tables whose profiles are at least `threshold` similar to the question, closest first.
	///
	/// `top_k` and `threshold` fall back to the retrieval configuration.
	pub async fn retrieve(
		&self,
		question: &str,
		top_k: Option<u32>,
		threshold: Option<f32>,
	) -> RetrievalOutcome {
		let _gate = self.index_gate.read().await;
		let top_k = top_k.unwrap_or(self.cfg.retrieval.top_k);
		let threshold = threshold.unwrap_or(self.cfg.retrieval.similarity_threshold);

		match self.search(question, top_k, threshold).await {
			Ok(Some(hits)) => {
				let tables = hits.iter().map(|hit| hit.table.clone()).collect::<Vec<_>>();

				tracing::info!(top_k, threshold, selected = tables.len(), "Retrieved tables.");

				RetrievalOutcome { tables, hits, degraded: None }
			},
			Ok(None) => {
				tracing::warn!(
					collection = self.stores.vectors.collection(),
					"Table index is empty. Run indexing first."
				);

				RetrievalOutcome::degraded(Degradation::IndexMissing)
			},
			Err(err) => {
				tracing::warn!(error = %err, "Retrieval failed.");

				RetrievalOutcome::degraded(Degradation::Failed { message: err.to_string() })
			},
		}
	}

	/// Same search as [`SqlPilot::retrieve`], returning the per-table details.
	pub async fn retrieve_with_details(
		&self,
		question: &str,
		top_k: Option<u32>,
		threshold: Option<f32>,
	) -> Vec<RetrievalHit> {
		self.retrieve(question, top_k, threshold).await.hits
	}

	/// `None` when there is no index to search.
	async fn search(
		&self,
		question: &str,
		top_k: u32,
		threshold: f32,
	) -> Result<Option<Vec<RetrievalHit>>> {
		let vectors = &self.stores.vectors;

		if !vectors.collection_exists().await? || vectors.count().await? == 0 {
			return Ok(None);
		}

		let texts = [question.to_string()];
		let mut embedded =
			self.providers.embedding.embed(&self.cfg.providers.embedding, &texts).await?;
		let Some(vector) = embedded.pop() else {
			return Err(Error::Provider {
				message: "Embedding provider returned no vector.".to_string(),
			});
		};
		let mut hits = vectors
			.query(vector, top_k)
			.await?
			.into_iter()
			.map(RetrievalHit::from)
			.filter(|hit| hit.similarity >= threshold)
			.collect::<Vec<_>>();

		hits.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));

		Ok(Some(hits))
	}
}

impl From<VectorHit> for RetrievalHit {
	fn from(hit: VectorHit) -> Self {
		let metadata = &hit.metadata;

		Self {
			similarity: (1.0 - hit.distance).clamp(0.0, 1.0),
			distance: hit.distance,
			row_count: metadata_u64(metadata, "row_count"),
			column_count: metadata_u64(metadata, "column_count"),
			columns: metadata_strings(metadata, "columns"),
			related_tables: metadata_strings(metadata, "related_tables"),
			has_foreign_keys: metadata
				.get("has_foreign_keys")
				.and_then(Value::as_bool)
				.unwrap_or(false),
			table: hit.id,
			description: hit.document,
		}
	}
}

fn metadata_u64(metadata: &Map<String, Value>, key: &str) -> u64 {
	metadata.get(key).and_then(Value::as_u64).unwrap_or(0)
}

fn metadata_strings(metadata: &Map<String, Value>, key: &str) -> Vec<String> {
	metadata
		.get(key)
		.and_then(Value::as_array)
		.map(|items| items.iter().filter_map(Value::as_str).map(str::to_string).collect())
		.unwrap_or_default()
}

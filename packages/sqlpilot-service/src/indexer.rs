use serde::Serialize;
use serde_json::{Map, Value};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::{Error, Result, SqlPilot};
use sqlpilot_domain::{
	profile,
	schema::{DescribedTable, TableDescriptor},
};
use sqlpilot_storage::models::VectorRecord;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexStats {
	pub indexed: usize,
	pub total: usize,
	/// The collection was dropped and recreated first.
	pub rebuilt: bool,
	pub collection: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexStatus {
	pub indexed: bool,
	pub count: u64,
	pub collection: String,
}

impl SqlPilot {
	/// Profiles, embeds, and upserts each table. Holds the index write gate for the whole call.
	pub async fn index(&self, tables: &[DescribedTable], force: bool) -> Result<IndexStats> {
		let _gate = self.index_gate.write().await;
		let vectors = &self.stores.vectors;

		if force {
			tracing::info!(collection = vectors.collection(), "Rebuilding table index.");

			vectors.delete_collection().await?;
		}
		if !vectors.collection_exists().await? {
			vectors.create_collection().await?;
		}

		let mut indexed = 0;

		for described in tables {
			let table = described.table.name.as_str();

			self.index_table(described).await.map_err(|err| {
				if err.is_backend_failure() {
					err
				} else {
					Error::IndexingFailed { table: table.to_string(), message: err.to_string() }
				}
			})?;

			indexed += 1;

			tracing::debug!(table, "Indexed table.");
		}

		tracing::info!(
			collection = vectors.collection(),
			indexed,
			total = tables.len(),
			rebuilt = force,
			"Table index updated."
		);

		Ok(IndexStats {
			indexed,
			total: tables.len(),
			rebuilt: force,
			collection: vectors.collection().to_string(),
		})
	}

	/// Describes every table in the database and indexes the lot.
	pub async fn index_database(&self, force: bool) -> Result<IndexStats> {
		let tables = self.describe_all().await?;

		self.index(&tables, force).await
	}

	pub async fn index_status(&self) -> Result<IndexStatus> {
		let _gate = self.index_gate.read().await;
		let vectors = &self.stores.vectors;
		let collection = vectors.collection().to_string();

		if !vectors.collection_exists().await? {
			return Ok(IndexStatus { indexed: false, count: 0, collection });
		}

		let count = vectors.count().await?;

		Ok(IndexStatus { indexed: count > 0, count, collection })
	}

	pub async fn clear_index(&self) -> Result<()> {
		let _gate = self.index_gate.write().await;

		self.stores.vectors.delete_collection().await?;

		tracing::info!(collection = self.stores.vectors.collection(), "Cleared table index.");

		Ok(())
	}

	async fn index_table(&self, described: &DescribedTable) -> Result<()> {
		let text = profile::profile_text(described);
		let mut vectors = self
			.providers
			.embedding
			.embed(&self.cfg.providers.embedding, std::slice::from_ref(&text))
			.await?;
		let Some(vector) = vectors.pop() else {
			return Err(Error::Provider {
				message: "Embedding provider returned no vector.".to_string(),
			});
		};
		let expected = self.cfg.storage.qdrant.vector_dim as usize;

		if vector.len() != expected {
			return Err(Error::Provider {
				message: format!(
					"Embedding has {} dimensions, collection expects {expected}.",
					vector.len()
				),
			});
		}

		let record = VectorRecord {
			id: described.table.name.clone(),
			vector,
			document: text,
			metadata: profile_metadata(described),
		};

		self.stores.vectors.upsert(record).await
	}
}

fn profile_metadata(described: &DescribedTable) -> Map<String, Value> {
	let table: &TableDescriptor = &described.table;
	let related_tables = related_tables(described);
	let indexed_at = OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default();
	let mut metadata = Map::new();

	metadata.insert("table_name".to_string(), Value::from(table.name.clone()));
	metadata.insert("row_count".to_string(), Value::from(table.row_count));
	metadata.insert("column_count".to_string(), Value::from(table.columns.len()));
	metadata.insert("columns".to_string(), Value::from(table.column_names()));
	metadata
		.insert("has_foreign_keys".to_string(), Value::Bool(!described.foreign_keys.is_empty()));
	metadata.insert("related_tables".to_string(), Value::from(related_tables));
	metadata.insert("use_cases".to_string(), Value::from(profile::infer_use_cases(table)));
	metadata.insert("indexed_at".to_string(), Value::from(indexed_at));

	metadata
}

fn related_tables(described: &DescribedTable) -> Vec<String> {
	let mut related = Vec::new();

	for edge in &described.foreign_keys {
		if !related.contains(&edge.to_table) {
			related.push(edge.to_table.clone());
		}
	}

	related
}

#[cfg(test)]
mod tests {
	use super::*;
	use sqlpilot_domain::schema::{ColumnDescriptor, ForeignKeyEdge};

	fn described() -> DescribedTable {
		let column = |name: &str| ColumnDescriptor {
			name: name.to_string(),
			declared_type: "INTEGER".to_string(),
			nullable: false,
			default: None,
			is_primary_key: name == "id",
		};
		let edge = |from: &str, to: &str| ForeignKeyEdge {
			from_column: from.to_string(),
			to_table: to.to_string(),
			to_column: "id".to_string(),
		};

		DescribedTable {
			table: TableDescriptor {
				name: "reviews".to_string(),
				columns: vec![
					column("id"),
					column("product_id"),
					column("customer_id"),
					column("rating"),
				],
				row_count: 3,
				sample_rows: Vec::new(),
			},
			foreign_keys: vec![
				edge("product_id", "products"),
				edge("customer_id", "customers"),
				edge("reviewer_id", "customers"),
			],
		}
	}

	#[test]
	fn metadata_lists_each_related_table_once() {
		let metadata = profile_metadata(&described());

		assert_eq!(metadata["table_name"], "reviews");
		assert_eq!(metadata["row_count"], 3);
		assert_eq!(metadata["column_count"], 4);
		assert_eq!(metadata["has_foreign_keys"], true);
		assert_eq!(metadata["related_tables"], serde_json::json!(["products", "customers"]));
		assert_eq!(
			metadata["columns"],
			serde_json::json!(["id", "product_id", "customer_id", "rating"])
		);
	}

	#[test]
	fn metadata_timestamp_is_rfc3339() {
		let metadata = profile_metadata(&described());
		let indexed_at = metadata["indexed_at"].as_str().unwrap_or_default();

		assert!(indexed_at.contains('T'));
		assert!(indexed_at.ends_with('Z'));
	}
}

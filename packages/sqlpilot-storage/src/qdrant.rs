use std::collections::HashMap;

use qdrant_client::{
	Payload,
	qdrant::{
		CountPointsBuilder, CreateCollectionBuilder, Distance, PointStruct, Query,
		QueryPointsBuilder, UpsertPointsBuilder, Value, VectorParamsBuilder, value::Kind,
	},
};
use serde_json::{Map, Number};
use uuid::Uuid;

use crate::{
	Error, Result,
	models::{VectorHit, VectorRecord},
};

pub const RECORD_ID_KEY: &str = "table_name";
pub const DOCUMENT_KEY: &str = "profile_text";
pub const METADATA_KEY: &str = "metadata";

pub struct QdrantStore {
	pub client: qdrant_client::Qdrant,
	pub collection: String,
	pub vector_dim: u32,
}
impl QdrantStore {
	pub fn new(cfg: &sqlpilot_config::Qdrant) -> Result<Self> {
		let client = qdrant_client::Qdrant::from_url(&cfg.url).build()?;

		Ok(Self { client, collection: cfg.collection.clone(), vector_dim: cfg.vector_dim })
	}

	pub async fn collection_exists(&self) -> Result<bool> {
		Ok(self.client.collection_exists(self.collection.clone()).await?)
	}

	pub async fn create_collection(&self) -> Result<()> {
		self.client
			.create_collection(
				CreateCollectionBuilder::new(self.collection.clone()).vectors_config(
					VectorParamsBuilder::new(self.vector_dim as u64, Distance::Cosine),
				),
			)
			.await?;

		tracing::info!(collection = %self.collection, dim = self.vector_dim, "Created collection.");

		Ok(())
	}

	/// Drops the collection. A missing collection is not an error.
	pub async fn delete_collection(&self) -> Result<()> {
		if !self.collection_exists().await? {
			return Ok(());
		}

		self.client.delete_collection(self.collection.clone()).await?;

		tracing::info!(collection = %self.collection, "Deleted collection.");

		Ok(())
	}

	pub async fn ensure_collection(&self) -> Result<()> {
		if self.collection_exists().await? {
			return Ok(());
		}

		self.create_collection().await
	}

	pub async fn upsert(&self, record: VectorRecord) -> Result<()> {
		if record.vector.len() != self.vector_dim as usize {
			return Err(Error::InvalidArgument(format!(
				"Vector for {} has {} dimensions, collection expects {}.",
				record.id,
				record.vector.len(),
				self.vector_dim
			)));
		}

		let mut payload = Payload::new();

		payload.insert(RECORD_ID_KEY, record.id.clone());
		payload.insert(DOCUMENT_KEY, record.document);
		payload.insert(METADATA_KEY, serde_json::Value::Object(record.metadata));

		let point = PointStruct::new(point_id(&record.id).to_string(), record.vector, payload);

		self.client
			.upsert_points(
				UpsertPointsBuilder::new(self.collection.clone(), vec![point]).wait(true),
			)
			.await?;

		Ok(())
	}

	/// Nearest records, closest first.
	pub async fn query(&self, vector: Vec<f32>, limit: u32) -> Result<Vec<VectorHit>> {
		let response = self
			.client
			.query(
				QueryPointsBuilder::new(self.collection.clone())
					.query(Query::new_nearest(vector))
					.limit(limit as u64)
					.with_payload(true),
			)
			.await?;
		let mut hits = Vec::with_capacity(response.result.len());

		for point in response.result {
			let Some(id) = payload_string(&point.payload, RECORD_ID_KEY) else {
				tracing::warn!("Vector hit missing table name.");

				continue;
			};
			let document = payload_string(&point.payload, DOCUMENT_KEY).unwrap_or_default();
			let metadata = match point.payload.get(METADATA_KEY).map(value_to_json) {
				Some(serde_json::Value::Object(map)) => map,
				_ => Map::new(),
			};

			hits.push(VectorHit { id, distance: 1.0 - point.score, document, metadata });
		}

		Ok(hits)
	}

	pub async fn count(&self) -> Result<u64> {
		let response = self
			.client
			.count(CountPointsBuilder::new(self.collection.clone()).exact(true))
			.await?;

		Ok(response.result.map(|result| result.count).unwrap_or(0))
	}
}

/// Stable point id for a table name.
pub fn point_id(table: &str) -> Uuid {
	Uuid::new_v5(&Uuid::NAMESPACE_OID, table.as_bytes())
}

fn payload_string(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
	match &payload.get(key)?.kind {
		Some(Kind::StringValue(text)) => Some(text.clone()),
		_ => None,
	}
}

fn value_to_json(value: &Value) -> serde_json::Value {
	match &value.kind {
		None | Some(Kind::NullValue(_)) => serde_json::Value::Null,
		Some(Kind::BoolValue(flag)) => serde_json::Value::Bool(*flag),
		Some(Kind::IntegerValue(number)) => serde_json::Value::from(*number),
		Some(Kind::DoubleValue(number)) =>
			Number::from_f64(*number).map(serde_json::Value::Number).unwrap_or_default(),
		Some(Kind::StringValue(text)) => serde_json::Value::String(text.clone()),
		Some(Kind::ListValue(list)) =>
			serde_json::Value::Array(list.values.iter().map(value_to_json).collect()),
		Some(Kind::StructValue(object)) => serde_json::Value::Object(
			object.fields.iter().map(|(key, value)| (key.clone(), value_to_json(value))).collect(),
		),
	}
}

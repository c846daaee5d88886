use serde::Serialize;
use serde_json::{Map, Value};

/// One table's entry in the vector collection.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorRecord {
	pub id: String,
	pub vector: Vec<f32>,
	pub document: String,
	pub metadata: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VectorHit {
	pub id: String,
	/// Cosine distance, `1 - similarity`.
	pub distance: f32,
	pub document: String,
	pub metadata: Map<String, Value>,
}

/// Result of running one statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryRows {
	pub columns: Vec<String>,
	pub rows: Vec<Vec<Value>>,
	/// More rows were available than the configured cap.
	pub truncated: bool,
	/// Set for statements that do not return rows.
	pub rows_affected: Option<u64>,
}
impl QueryRows {
	pub fn row_count(&self) -> usize {
		self.rows.len()
	}
}

#[derive(Debug, sqlx::FromRow)]
pub struct ColumnInfoRow {
	pub name: String,
	pub declared_type: String,
	pub not_null: i64,
	pub dflt_value: Option<String>,
	pub pk: i64,
}

#[derive(Debug, sqlx::FromRow)]
pub struct ForeignKeyRow {
	pub from_column: String,
	pub to_table: String,
	pub to_column: Option<String>,
}

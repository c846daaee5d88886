//! Default store adapters backed by `sqlpilot-storage`.

use std::time::Duration;

use sqlx::SqlitePool;

use crate::{BoxFuture, Error, QueryExecutor, Result, SchemaSupplier, VectorStore};
use sqlpilot_domain::schema::{ForeignKeyEdge, TableDescriptor};
use sqlpilot_storage::{
	catalog::SqliteCatalog,
	executor,
	models::{QueryRows, VectorHit, VectorRecord},
	qdrant::QdrantStore,
};

/// One SQLite pool serving both schema reflection and statement execution.
pub struct SqliteSource {
	catalog: SqliteCatalog,
	max_rows: usize,
	timeout: Duration,
}
impl SqliteSource {
	pub fn new(pool: SqlitePool, max_rows: usize, timeout: Duration) -> Self {
		Self { catalog: SqliteCatalog::new(pool), max_rows, timeout }
	}

	pub fn catalog(&self) -> &SqliteCatalog {
		&self.catalog
	}
}
impl SchemaSupplier for SqliteSource {
	fn list_tables(&self) -> BoxFuture<'_, Result<Vec<String>>> {
		Box::pin(async move { Ok(self.catalog.list_tables().await?) })
	}

	fn describe<'a>(&'a self, table: &'a str) -> BoxFuture<'a, Result<TableDescriptor>> {
		Box::pin(async move { Ok(self.catalog.describe(table).await?) })
	}

	fn foreign_keys<'a>(&'a self, table: &'a str) -> BoxFuture<'a, Result<Vec<ForeignKeyEdge>>> {
		Box::pin(async move { Ok(self.catalog.foreign_keys(table).await?) })
	}

	fn clear_cache(&self) {
		self.catalog.clear_cache();
	}
}
impl QueryExecutor for SqliteSource {
	fn execute<'a>(&'a self, sql: &'a str) -> BoxFuture<'a, Result<QueryRows>> {
		Box::pin(async move {
			executor::execute(self.catalog.pool(), sql, self.max_rows, self.timeout)
				.await
				.map_err(execution_error)
		})
	}
}

impl VectorStore for QdrantStore {
	fn collection(&self) -> &str {
		&self.collection
	}

	fn collection_exists(&self) -> BoxFuture<'_, Result<bool>> {
		Box::pin(async move { Ok(QdrantStore::collection_exists(self).await?) })
	}

	fn create_collection(&self) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move { Ok(QdrantStore::create_collection(self).await?) })
	}

	fn delete_collection(&self) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move { Ok(QdrantStore::delete_collection(self).await?) })
	}

	fn upsert(&self, record: VectorRecord) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move { Ok(QdrantStore::upsert(self, record).await?) })
	}

	fn query(&self, vector: Vec<f32>, limit: u32) -> BoxFuture<'_, Result<Vec<VectorHit>>> {
		Box::pin(async move { Ok(QdrantStore::query(self, vector, limit).await?) })
	}

	fn count(&self) -> BoxFuture<'_, Result<u64>> {
		Box::pin(async move { Ok(QdrantStore::count(self).await?) })
	}
}

/// Database errors carry the engine's own message so the corrector sees what SQLite reported.
fn execution_error(err: sqlpilot_storage::Error) -> Error {
	match err {
		sqlpilot_storage::Error::Sqlx(sqlx::Error::Database(db_err)) =>
			Error::ExecutionFailed { message: db_err.message().to_string() },
		sqlpilot_storage::Error::Sqlx(other) =>
			Error::ExecutionFailed { message: other.to_string() },
		other => other.into(),
	}
}

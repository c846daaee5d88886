pub mod adapters;
pub mod correct;
pub mod explain;
pub mod generate;
pub mod indexer;
pub mod pipeline;
pub mod retrieval;
pub mod schema;
pub mod validate;

mod error;

pub use correct::CorrectionResult;
pub use error::{Error, Result};
pub use explain::Explanation;
pub use generate::GenerationResult;
pub use indexer::{IndexStats, IndexStatus};
pub use pipeline::{
	AskOutcome, AskReport, CorrectionSuggestion, ExecuteReport, FallbackReason, Nl2SqlReport,
	Selection, SelectionSource,
};
pub use retrieval::{Degradation, RetrievalHit, RetrievalOutcome};
pub use schema::{SchemaSummary, TableSummary};

use std::{
	future::Future,
	pin::Pin,
	sync::{
		Arc,
		atomic::{AtomicBool, Ordering},
	},
	time::Duration,
};

use tokio::sync::RwLock;

use adapters::SqliteSource;
use sqlpilot_config::{Config, EmbeddingProviderConfig, LlmProviderConfig};
use sqlpilot_domain::schema::{ForeignKeyEdge, TableDescriptor};
use sqlpilot_providers::{embedding, generation};
use sqlpilot_storage::{
	db::Db,
	models::{QueryRows, VectorHit, VectorRecord},
	qdrant::QdrantStore,
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>>;
}

pub trait GenerationProvider
where
	Self: Send + Sync,
{
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		prompt: &'a str,
		temperature: f32,
	) -> BoxFuture<'a, Result<String>>;
}

/// Persistent collection of table profiles keyed by table name.
pub trait VectorStore
where
	Self: Send + Sync,
{
	fn collection(&self) -> &str;

	fn collection_exists(&self) -> BoxFuture<'_, Result<bool>>;

	fn create_collection(&self) -> BoxFuture<'_, Result<()>>;

	fn delete_collection(&self) -> BoxFuture<'_, Result<()>>;

	fn upsert(&self, record: VectorRecord) -> BoxFuture<'_, Result<()>>;

	/// Nearest records, ascending distance.
	fn query(&self, vector: Vec<f32>, limit: u32) -> BoxFuture<'_, Result<Vec<VectorHit>>>;

	fn count(&self) -> BoxFuture<'_, Result<u64>>;
}

/// Read-only reflection over the target database.
pub trait SchemaSupplier
where
	Self: Send + Sync,
{
	fn list_tables(&self) -> BoxFuture<'_, Result<Vec<String>>>;

	fn describe<'a>(&'a self, table: &'a str) -> BoxFuture<'a, Result<TableDescriptor>>;

	fn foreign_keys<'a>(&'a self, table: &'a str) -> BoxFuture<'a, Result<Vec<ForeignKeyEdge>>>;

	fn clear_cache(&self);
}

pub trait QueryExecutor
where
	Self: Send + Sync,
{
	/// Runs one statement. Database errors come back as [`Error::ExecutionFailed`].
	fn execute<'a>(&'a self, sql: &'a str) -> BoxFuture<'a, Result<QueryRows>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub generation: Arc<dyn GenerationProvider>,
}
impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		generation: Arc<dyn GenerationProvider>,
	) -> Self {
		Self { embedding, generation }
	}
}
impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { embedding: provider.clone(), generation: provider }
	}
}

#[derive(Clone)]
pub struct Stores {
	pub vectors: Arc<dyn VectorStore>,
	pub schema: Arc<dyn SchemaSupplier>,
	pub executor: Arc<dyn QueryExecutor>,
}

/// Cooperative cancellation for one question. Checked between pipeline stages only.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);
impl CancelFlag {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn cancel(&self) {
		self.0.store(true, Ordering::SeqCst);
	}

	pub fn is_cancelled(&self) -> bool {
		self.0.load(Ordering::SeqCst)
	}

	pub fn check(&self, stage: &str) -> Result<()> {
		if self.is_cancelled() {
			tracing::info!(stage, "Question cancelled.");

			return Err(Error::Cancelled { stage: stage.to_string() });
		}

		Ok(())
	}
}

/// Process-wide context owning the model clients and stores. Shared across concurrent questions.
pub struct SqlPilot {
	pub cfg: Config,
	pub stores: Stores,
	pub providers: Providers,
	/// Retrieval holds the read side, indexing the write side.
	index_gate: RwLock<()>,
}
impl SqlPilot {
	pub fn new(cfg: Config, stores: Stores) -> Self {
		Self::with_providers(cfg, stores, Providers::default())
	}

	pub fn with_providers(cfg: Config, stores: Stores, providers: Providers) -> Self {
		Self { cfg, stores, providers, index_gate: RwLock::new(()) }
	}

	/// Opens the SQLite database and the Qdrant client named by the configuration.
	pub async fn connect(cfg: Config) -> Result<Self> {
		let db = Db::connect(&cfg.storage.sqlite).await?;
		let source = Arc::new(SqliteSource::new(
			db.pool,
			cfg.query.max_result_rows as usize,
			Duration::from_millis(cfg.query.timeout_ms),
		));
		let qdrant = Arc::new(QdrantStore::new(&cfg.storage.qdrant)?);
		let stores = Stores { vectors: qdrant, schema: source.clone(), executor: source };

		Ok(Self::new(cfg, stores))
	}
}

struct DefaultProviders;
impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>> {
		Box::pin(async move { Ok(embedding::embed(cfg, texts).await?) })
	}
}
impl GenerationProvider for DefaultProviders {
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		prompt: &'a str,
		temperature: f32,
	) -> BoxFuture<'a, Result<String>> {
		Box::pin(async move { Ok(generation::complete(cfg, prompt, temperature).await?) })
	}
}

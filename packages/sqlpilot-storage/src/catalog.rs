use std::{collections::HashMap, sync::Mutex};

use serde_json::Map;
use sqlx::SqlitePool;

use sqlpilot_domain::schema::{ColumnDescriptor, ForeignKeyEdge, SampleRow, TableDescriptor};

use crate::{
	Error, Result,
	db::quote_ident,
	executor::decode_row,
	models::{ColumnInfoRow, ForeignKeyRow},
};

/// Sample rows read per table. Prompts render fewer.
pub const SAMPLE_ROW_LIMIT: u32 = 5;

/// Read-only reflection over a SQLite database.
///
/// Column lists are cached per table until [`SqliteCatalog::clear_cache`] is called; row counts and
/// samples are always read fresh.
pub struct SqliteCatalog {
	pool: SqlitePool,
	columns: Mutex<HashMap<String, Vec<ColumnDescriptor>>>,
}
impl SqliteCatalog {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool, columns: Mutex::new(HashMap::new()) }
	}

	pub fn pool(&self) -> &SqlitePool {
		&self.pool
	}

	pub async fn list_tables(&self) -> Result<Vec<String>> {
		let names: Vec<String> = sqlx::query_scalar(
			"\
SELECT name
FROM sqlite_master
WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
ORDER BY name",
		)
		.fetch_all(&self.pool)
		.await?;

		Ok(names)
	}

	pub async fn describe(&self, table: &str) -> Result<TableDescriptor> {
		let columns = self.columns(table).await?;
		let quoted = quote_ident(table);
		let row_count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {quoted}"))
			.fetch_one(&self.pool)
			.await?;
		let sample_rows = self.sample_rows(&quoted, &columns).await?;

		Ok(TableDescriptor {
			name: table.to_string(),
			columns,
			row_count: row_count.max(0) as u64,
			sample_rows,
		})
	}

	pub async fn foreign_keys(&self, table: &str) -> Result<Vec<ForeignKeyEdge>> {
		let rows: Vec<ForeignKeyRow> = sqlx::query_as(
			"\
SELECT \"from\" AS from_column, \"table\" AS to_table, \"to\" AS to_column
FROM pragma_foreign_key_list(?1)
ORDER BY id, seq",
		)
		.bind(table)
		.fetch_all(&self.pool)
		.await?;

		Ok(rows
			.into_iter()
			.map(|row| ForeignKeyEdge {
				from_column: row.from_column,
				to_table: row.to_table,
				to_column: row.to_column.unwrap_or_default(),
			})
			.collect())
	}

	pub fn clear_cache(&self) {
		self.columns.lock().unwrap_or_else(|err| err.into_inner()).clear();
	}

	async fn columns(&self, table: &str) -> Result<Vec<ColumnDescriptor>> {
		{
			let cache = self.columns.lock().unwrap_or_else(|err| err.into_inner());

			if let Some(columns) = cache.get(table) {
				return Ok(columns.clone());
			}
		}

		let rows: Vec<ColumnInfoRow> = sqlx::query_as(
			"\
SELECT name, type AS declared_type, \"notnull\" AS not_null, dflt_value, pk
FROM pragma_table_info(?1)
ORDER BY cid",
		)
		.bind(table)
		.fetch_all(&self.pool)
		.await?;

		if rows.is_empty() {
			return Err(Error::NotFound(format!("table {table}")));
		}

		let columns = rows
			.into_iter()
			.map(|row| ColumnDescriptor {
				name: row.name,
				declared_type: row.declared_type,
				nullable: row.not_null == 0,
				default: row.dflt_value,
				is_primary_key: row.pk > 0,
			})
			.collect::<Vec<_>>();

		self.columns
			.lock()
			.unwrap_or_else(|err| err.into_inner())
			.insert(table.to_string(), columns.clone());

		Ok(columns)
	}

	async fn sample_rows(
		&self,
		quoted: &str,
		columns: &[ColumnDescriptor],
	) -> Result<Vec<SampleRow>> {
		let rows = sqlx::query(&format!("SELECT * FROM {quoted} LIMIT ?1"))
			.persistent(false)
			.bind(SAMPLE_ROW_LIMIT)
			.fetch_all(&self.pool)
			.await?;
		let mut samples = Vec::with_capacity(rows.len());

		for row in &rows {
			let values = decode_row(row)?;
			let mut sample = Map::new();

			for (column, value) in columns.iter().zip(values) {
				sample.insert(column.name.clone(), value);
			}

			samples.push(sample);
		}

		Ok(samples)
	}
}

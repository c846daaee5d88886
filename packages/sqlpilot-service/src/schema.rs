use serde::Serialize;

use crate::{Error, Result, SqlPilot};
use sqlpilot_domain::{
	context,
	schema::{DescribedTable, TableDescriptor},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaSummary {
	pub tables: Vec<TableSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSummary {
	pub name: String,
	pub row_count: u64,
	pub column_count: usize,
	pub columns: Vec<String>,
}
impl From<&TableDescriptor> for TableSummary {
	fn from(table: &TableDescriptor) -> Self {
		Self {
			name: table.name.clone(),
			row_count: table.row_count,
			column_count: table.columns.len(),
			columns: table.columns.iter().map(|column| column.name.clone()).collect(),
		}
	}
}

impl SqlPilot {
	pub async fn describe_table(&self, table: &str) -> Result<DescribedTable> {
		let name = table.trim();

		if name.is_empty() {
			return Err(Error::InvalidRequest {
				message: "Table name must be non-empty.".to_string(),
			});
		}

		let schema = &self.stores.schema;
		let descriptor = schema.describe(name).await?;
		let foreign_keys = schema.foreign_keys(name).await?;

		Ok(DescribedTable { table: descriptor, foreign_keys })
	}

	pub async fn describe_all(&self) -> Result<Vec<DescribedTable>> {
		let names = self.stores.schema.list_tables().await?;

		self.describe_tables(&names).await
	}

	pub async fn describe_tables(&self, names: &[String]) -> Result<Vec<DescribedTable>> {
		let mut tables = Vec::with_capacity(names.len());

		for name in names {
			tables.push(self.describe_table(name).await?);
		}

		Ok(tables)
	}

	/// Renders the generation-prompt schema context for `tables`, in the given order.
	pub async fn build_context(&self, tables: &[String]) -> Result<String> {
		let described = self.describe_tables(tables).await?;

		Ok(context::render_schema_context(&described))
	}

	pub async fn schema_summary(&self) -> Result<SchemaSummary> {
		let names = self.stores.schema.list_tables().await?;
		let mut tables = Vec::with_capacity(names.len());

		for name in &names {
			tables.push(TableSummary::from(&self.stores.schema.describe(name).await?));
		}

		Ok(SchemaSummary { tables })
	}

	/// Drops cached column lists so the next describe reads the live schema.
	pub fn refresh_schema(&self) {
		self.stores.schema.clear_cache();

		tracing::info!("Schema cache cleared.");
	}

	/// Table-to-columns text handed to the corrector.
	pub(crate) async fn correction_schema_summary(&self) -> Result<String> {
		let names = self.stores.schema.list_tables().await?;
		let mut tables = Vec::with_capacity(names.len());

		for name in &names {
			tables.push(self.stores.schema.describe(name).await?);
		}

		Ok(context::render_schema_summary(&tables))
	}
}

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Maximum number of sample rows rendered into prompts and profiles.
pub const MAX_RENDERED_SAMPLE_ROWS: usize = 2;

pub type SampleRow = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
	pub name: String,
	pub declared_type: String,
	pub nullable: bool,
	pub default: Option<String>,
	pub is_primary_key: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDescriptor {
	pub name: String,
	pub columns: Vec<ColumnDescriptor>,
	pub row_count: u64,
	pub sample_rows: Vec<SampleRow>,
}
impl TableDescriptor {
	pub fn column_names(&self) -> Vec<&str> {
		self.columns.iter().map(|col| col.name.as_str()).collect()
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyEdge {
	pub from_column: String,
	pub to_table: String,
	/// Empty when the reference targets the parent's primary key implicitly.
	pub to_column: String,
}

/// A table descriptor joined with the foreign keys declared on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescribedTable {
	pub table: TableDescriptor,
	pub foreign_keys: Vec<ForeignKeyEdge>,
}

/// Renders a sample row as `key: value` pairs following the table's column order.
pub fn render_row(columns: &[ColumnDescriptor], row: &SampleRow) -> String {
	let mut parts = Vec::with_capacity(row.len());

	for column in columns {
		if let Some(value) = row.get(&column.name) {
			parts.push(format!("{}: {}", column.name, render_value(value)));
		}
	}
	// Keys the descriptor does not know about still render, after the known ones.
	for (key, value) in row {
		if !columns.iter().any(|column| &column.name == key) {
			parts.push(format!("{key}: {}", render_value(value)));
		}
	}

	parts.join(", ")
}

fn render_value(value: &Value) -> String {
	match value {
		Value::Null => "NULL".to_string(),
		Value::String(text) => text.clone(),
		other => other.to_string(),
	}
}

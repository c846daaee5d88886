use crate::{
	profile::qualified_target,
	schema::{DescribedTable, MAX_RENDERED_SAMPLE_ROWS, TableDescriptor, render_row},
};

/// Renders the schema context for a generation prompt, one block per table in the given order.
pub fn render_schema_context(tables: &[DescribedTable]) -> String {
	tables.iter().map(render_table_block).collect::<Vec<_>>().join("\n\n")
}

pub fn render_table_block(described: &DescribedTable) -> String {
	let table = &described.table;
	let mut lines = vec![format!("Table: {} ({} rows)", table.name, table.row_count)];

	lines.push("Columns:".to_string());

	for column in &table.columns {
		let nullability = if column.nullable { "NULL" } else { "NOT NULL" };
		let pk = if column.is_primary_key { " [PRIMARY KEY]" } else { "" };

		lines.push(format!("  - {}: {} {nullability}{pk}", column.name, column.declared_type));
	}

	if !described.foreign_keys.is_empty() {
		lines.push("Foreign Keys:".to_string());

		for fk in &described.foreign_keys {
			lines.push(format!(
				"  - {} -> {}",
				fk.from_column,
				qualified_target(&fk.to_table, &fk.to_column)
			));
		}
	}
	if !table.sample_rows.is_empty() {
		lines.push(format!("Sample Data (first {MAX_RENDERED_SAMPLE_ROWS} rows):"));

		for (idx, row) in table.sample_rows.iter().take(MAX_RENDERED_SAMPLE_ROWS).enumerate() {
			lines.push(format!("  Row {}: {}", idx + 1, render_row(&table.columns, row)));
		}
	}

	lines.join("\n")
}

/// Compact table-to-columns listing used by the correction prompt.
pub fn render_schema_summary(tables: &[TableDescriptor]) -> String {
	let mut lines = vec!["Available tables and columns:".to_string(), String::new()];

	for table in tables {
		lines.push(format!("- {}: {}", table.name, table.column_names().join(", ")));
	}

	lines.join("\n")
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::schema::{ColumnDescriptor, ForeignKeyEdge};

	fn described(name: &str, with_fk: bool) -> DescribedTable {
		let columns = vec![
			ColumnDescriptor {
				name: "id".to_string(),
				declared_type: "INTEGER".to_string(),
				nullable: false,
				default: None,
				is_primary_key: true,
			},
			ColumnDescriptor {
				name: "customer_id".to_string(),
				declared_type: "INTEGER".to_string(),
				nullable: true,
				default: None,
				is_primary_key: false,
			},
		];
		let sample_rows = (1..=3)
			.map(|id| {
				serde_json::json!({ "id": id, "customer_id": null })
					.as_object()
					.cloned()
					.expect("Row must be an object.")
			})
			.collect();
		let foreign_keys = if with_fk {
			vec![ForeignKeyEdge {
				from_column: "customer_id".to_string(),
				to_table: "customers".to_string(),
				to_column: "id".to_string(),
			}]
		} else {
			Vec::new()
		};

		DescribedTable {
			table: TableDescriptor { name: name.to_string(), columns, row_count: 42, sample_rows },
			foreign_keys,
		}
	}

	#[test]
	fn table_block_renders_all_sections() {
		let block = render_table_block(&described("orders", true));

		assert_eq!(
			block,
			"Table: orders (42 rows)\n\
			 Columns:\n  \
			 - id: INTEGER NOT NULL [PRIMARY KEY]\n  \
			 - customer_id: INTEGER NULL\n\
			 Foreign Keys:\n  \
			 - customer_id -> customers.id\n\
			 Sample Data (first 2 rows):\n  \
			 Row 1: id: 1, customer_id: NULL\n  \
			 Row 2: id: 2, customer_id: NULL"
		);
	}

	#[test]
	fn context_preserves_table_order() {
		let context = render_schema_context(&[described("b", false), described("a", false)]);
		let b = context.find("Table: b").expect("Missing table b.");
		let a = context.find("Table: a").expect("Missing table a.");

		assert!(b < a);
		assert!(!context.contains("Foreign Keys:"));
		assert!(context.contains("customer_id: NULL\n\nTable: a"));
	}

	#[test]
	fn summary_lists_column_names() {
		let summary = render_schema_summary(&[described("orders", false).table]);

		assert_eq!(summary, "Available tables and columns:\n\n- orders: id, customer_id");
	}
}

//! Embedding input for a table: a deterministic text profile plus advisory use-case tags.
//!
//! The tags only bias retrieval toward the questions a table usually answers. They are plain
//! substring rules, evaluated in table order, and never filter anything out.

use crate::schema::{DescribedTable, MAX_RENDERED_SAMPLE_ROWS, TableDescriptor, render_row};

enum Trigger {
	/// Lower-cased table name contains the needle.
	TableNameContains(&'static str),
	/// Some lower-cased column name equals the needle.
	ColumnNamed(&'static str),
	/// Some lower-cased column name contains the needle.
	ColumnNameContains(&'static str),
}

struct UseCaseRule {
	triggers: &'static [Trigger],
	tags: &'static [&'static str],
}

const USE_CASE_RULES: &[UseCaseRule] = &[
	UseCaseRule {
		triggers: &[Trigger::TableNameContains("customer")],
		tags: &["Customer information and demographics", "Customer contact details"],
	},
	UseCaseRule {
		triggers: &[Trigger::TableNameContains("order")],
		tags: &["Order history and transactions", "Sales and revenue analysis"],
	},
	UseCaseRule {
		triggers: &[Trigger::TableNameContains("product")],
		tags: &["Product catalog and inventory", "Product pricing and details"],
	},
	UseCaseRule {
		triggers: &[Trigger::TableNameContains("review"), Trigger::ColumnNamed("rating")],
		tags: &["Customer feedback and ratings", "Product quality analysis"],
	},
	UseCaseRule {
		triggers: &[Trigger::TableNameContains("category")],
		tags: &["Product categorization", "Hierarchical organization"],
	},
	UseCaseRule {
		triggers: &[Trigger::ColumnNamed("price"), Trigger::ColumnNamed("amount")],
		tags: &["Financial and pricing data"],
	},
	UseCaseRule {
		triggers: &[Trigger::ColumnNameContains("date"), Trigger::ColumnNamed("created_at")],
		tags: &["Time-based analysis and trends"],
	},
];

pub fn infer_use_cases(table: &TableDescriptor) -> Vec<&'static str> {
	let table_name = table.name.to_lowercase();
	let column_names =
		table.columns.iter().map(|col| col.name.to_lowercase()).collect::<Vec<_>>();
	let mut tags = Vec::new();

	for rule in USE_CASE_RULES {
		let fired = rule.triggers.iter().any(|trigger| match trigger {
			Trigger::TableNameContains(needle) => table_name.contains(needle),
			Trigger::ColumnNamed(needle) => column_names.iter().any(|name| name == needle),
			Trigger::ColumnNameContains(needle) =>
				column_names.iter().any(|name| name.contains(needle)),
		});

		if fired {
			tags.extend_from_slice(rule.tags);
		}
	}

	tags
}

pub fn profile_text(described: &DescribedTable) -> String {
	let table = &described.table;
	let mut lines = vec![
		format!("Table Name: {}", table.name),
		format!("Row Count: {} rows", table.row_count),
		String::new(),
		"Columns:".to_string(),
	];

	for column in &table.columns {
		let mut line = format!("- {} ({})", column.name, column.declared_type);

		if column.is_primary_key {
			line.push_str(" [PRIMARY KEY]");
		}
		if !column.nullable {
			line.push_str(" [NOT NULL]");
		}

		lines.push(line);
	}

	if !table.sample_rows.is_empty() {
		lines.push(String::new());
		lines.push("Sample Data:".to_string());

		for (idx, row) in table.sample_rows.iter().take(MAX_RENDERED_SAMPLE_ROWS).enumerate() {
			lines.push(format!("Row {}: {}", idx + 1, render_row(&table.columns, row)));
		}
	}

	if !described.foreign_keys.is_empty() {
		lines.push(String::new());
		lines.push("Relationships:".to_string());

		for fk in &described.foreign_keys {
			lines.push(format!(
				"- {} references {}",
				fk.from_column,
				qualified_target(&fk.to_table, &fk.to_column)
			));
		}
	}

	let use_cases = infer_use_cases(table);

	if !use_cases.is_empty() {
		lines.push(String::new());
		lines.push("Common Use Cases:".to_string());

		for use_case in use_cases {
			lines.push(format!("- {use_case}"));
		}
	}

	lines.join("\n")
}

pub(crate) fn qualified_target(table: &str, column: &str) -> String {
	if column.is_empty() { table.to_string() } else { format!("{table}.{column}") }
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::schema::{ColumnDescriptor, ForeignKeyEdge};

	fn column(name: &str, declared_type: &str, pk: bool, nullable: bool) -> ColumnDescriptor {
		ColumnDescriptor {
			name: name.to_string(),
			declared_type: declared_type.to_string(),
			nullable,
			default: None,
			is_primary_key: pk,
		}
	}

	fn table(name: &str, columns: Vec<ColumnDescriptor>) -> TableDescriptor {
		TableDescriptor { name: name.to_string(), columns, row_count: 3, sample_rows: Vec::new() }
	}

	#[test]
	fn tags_follow_name_and_column_rules() {
		let customers = table("customers", vec![column("id", "INTEGER", true, false)]);

		assert_eq!(
			infer_use_cases(&customers),
			vec!["Customer information and demographics", "Customer contact details"]
		);

		let feedback = table(
			"feedback",
			vec![column("rating", "INTEGER", false, true), column("order_date", "TEXT", false, true)],
		);

		assert_eq!(
			infer_use_cases(&feedback),
			vec![
				"Customer feedback and ratings",
				"Product quality analysis",
				"Time-based analysis and trends"
			]
		);
	}

	#[test]
	fn unrelated_table_has_no_tags() {
		let audit = table("audit_log", vec![column("message", "TEXT", false, true)]);

		assert!(infer_use_cases(&audit).is_empty());
	}

	#[test]
	fn profile_lists_columns_samples_relationships_and_tags() {
		let mut orders = table(
			"orders",
			vec![
				column("id", "INTEGER", true, false),
				column("customer_id", "INTEGER", false, false),
				column("amount", "REAL", false, true),
			],
		);

		for id in 1..=3 {
			let row = serde_json::json!({ "id": id, "customer_id": 10, "amount": 9.5 });

			orders.sample_rows.push(row.as_object().cloned().expect("Row must be an object."));
		}

		let described = DescribedTable {
			table: orders,
			foreign_keys: vec![ForeignKeyEdge {
				from_column: "customer_id".to_string(),
				to_table: "customers".to_string(),
				to_column: "id".to_string(),
			}],
		};
		let text = profile_text(&described);

		assert!(text.starts_with("Table Name: orders\nRow Count: 3 rows\n"));
		assert!(text.contains("- id (INTEGER) [PRIMARY KEY] [NOT NULL]"));
		assert!(text.contains("- amount (REAL)\n"));
		assert!(text.contains("Row 2: id: 2, customer_id: 10, amount: 9.5"));
		assert!(!text.contains("Row 3:"));
		assert!(text.contains("- customer_id references customers.id"));
		assert!(text.contains("- Sales and revenue analysis"));
		assert!(text.ends_with("- Financial and pricing data"));
		assert_eq!(text, profile_text(&described));
	}
}

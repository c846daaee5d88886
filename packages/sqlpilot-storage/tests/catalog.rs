use std::time::Duration;

use serde_json::Value;

use sqlpilot_config::Sqlite;
use sqlpilot_storage::{Error, catalog::SqliteCatalog, db::Db, executor};
use sqlpilot_testkit::{SAMPLE_TABLES, TestDatabase};

async fn connect(test_db: &TestDatabase, read_only: bool) -> Db {
	let cfg = Sqlite { path: test_db.path_str(), max_connections: 1, read_only };

	Db::connect(&cfg).await.expect("Failed to open test database.")
}

#[tokio::test]
async fn lists_user_tables_by_name() {
	let test_db = TestDatabase::new().await.expect("Failed to create test database.");
	let db = connect(&test_db, false).await;
	let catalog = SqliteCatalog::new(db.pool.clone());
	let tables = catalog.list_tables().await.expect("Failed to list tables.");

	assert_eq!(tables, SAMPLE_TABLES.iter().map(|name| name.to_string()).collect::<Vec<_>>());

	db.pool.close().await;
	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
async fn describes_columns_counts_and_samples() {
	let test_db = TestDatabase::new().await.expect("Failed to create test database.");
	let db = connect(&test_db, false).await;
	let catalog = SqliteCatalog::new(db.pool.clone());
	let products = catalog.describe("products").await.expect("Failed to describe products.");

	assert_eq!(products.row_count, 4);
	assert_eq!(
		products.column_names(),
		vec!["id", "name", "category_id", "price", "stock", "description", "created_at"]
	);
	assert!(products.columns[0].is_primary_key);
	assert!(!products.columns[1].nullable);
	assert!(products.columns[5].nullable);
	assert_eq!(products.columns[4].default.as_deref(), Some("0"));
	assert_eq!(products.sample_rows.len(), 4);
	assert_eq!(products.sample_rows[0].get("name"), Some(&Value::from("Acme Laptop")));
	assert_eq!(products.sample_rows[1].get("description"), Some(&Value::Null));

	db.pool.close().await;
	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
async fn reads_foreign_keys_in_declaration_order() {
	let test_db = TestDatabase::new().await.expect("Failed to create test database.");
	let db = connect(&test_db, false).await;
	let catalog = SqliteCatalog::new(db.pool.clone());
	let edges = catalog.foreign_keys("order_items").await.expect("Failed to read foreign keys.");
	let rendered = edges
		.iter()
		.map(|edge| format!("{} -> {}.{}", edge.from_column, edge.to_table, edge.to_column))
		.collect::<Vec<_>>();

	assert_eq!(rendered.len(), 2);
	assert!(rendered.contains(&"order_id -> orders.id".to_string()));
	assert!(rendered.contains(&"product_id -> products.id".to_string()));
	assert!(catalog.foreign_keys("categories").await.expect("Failed to read keys.").is_empty());

	db.pool.close().await;
	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
async fn unknown_table_is_not_found() {
	let test_db = TestDatabase::new().await.expect("Failed to create test database.");
	let db = connect(&test_db, false).await;
	let catalog = SqliteCatalog::new(db.pool.clone());
	let err = catalog.describe("invoices").await.expect_err("Expected missing table.");

	assert!(matches!(err, Error::NotFound(_)), "Unexpected error: {err}");

	db.pool.close().await;
	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
async fn cached_columns_refresh_after_clear() {
	let test_db = TestDatabase::new().await.expect("Failed to create test database.");
	let db = connect(&test_db, false).await;
	let catalog = SqliteCatalog::new(db.pool.clone());

	catalog.describe("categories").await.expect("Failed to describe categories.");
	sqlx::query("ALTER TABLE categories ADD COLUMN slug TEXT")
		.execute(&db.pool)
		.await
		.expect("Failed to alter table.");

	let cached = catalog.describe("categories").await.expect("Failed to describe categories.");

	assert!(!cached.column_names().contains(&"slug"));

	catalog.clear_cache();

	let fresh = catalog.describe("categories").await.expect("Failed to describe categories.");

	assert!(fresh.column_names().contains(&"slug"));
	assert_eq!(fresh.sample_rows.len(), 3);
	assert_eq!(fresh.sample_rows[0].get("slug"), Some(&Value::Null));
	assert_eq!(fresh.sample_rows[0].get("name"), Some(&Value::from("Electronics")));

	db.pool.close().await;
	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
async fn executes_queries_with_row_cap() {
	let test_db = TestDatabase::new().await.expect("Failed to create test database.");
	let db = connect(&test_db, false).await;
	let rows = executor::execute(
		&db.pool,
		"SELECT id, status, total_amount FROM orders ORDER BY id",
		3,
		Duration::from_secs(5),
	)
	.await
	.expect("Failed to execute query.");

	assert_eq!(rows.columns, vec!["id", "status", "total_amount"]);
	assert_eq!(rows.row_count(), 3);
	assert!(rows.truncated);
	assert_eq!(rows.rows[0], vec![Value::from(1), Value::from("delivered"), Value::from(923.5)]);
	assert_eq!(rows.rows_affected, None);

	db.pool.close().await;
	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
async fn result_at_cap_is_not_truncated() {
	let test_db = TestDatabase::new().await.expect("Failed to create test database.");
	let db = connect(&test_db, false).await;
	let rows = executor::execute(&db.pool, "SELECT id FROM customers", 3, Duration::from_secs(5))
		.await
		.expect("Failed to execute query.");

	assert_eq!(rows.row_count(), 3);
	assert!(!rows.truncated);

	db.pool.close().await;
	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
async fn queries_see_columns_added_between_calls() {
	let test_db = TestDatabase::new().await.expect("Failed to create test database.");
	let db = connect(&test_db, false).await;
	let before = executor::execute(&db.pool, "SELECT * FROM customers", 10, Duration::from_secs(5))
		.await
		.expect("Failed to execute query.");

	assert_eq!(before.columns.len(), 6);

	executor::execute(
		&db.pool,
		"ALTER TABLE customers ADD COLUMN vip INTEGER NOT NULL DEFAULT 0",
		10,
		Duration::from_secs(5),
	)
	.await
	.expect("Failed to alter table.");

	let after = executor::execute(&db.pool, "SELECT * FROM customers", 10, Duration::from_secs(5))
		.await
		.expect("Failed to execute query after the schema change.");

	assert_eq!(after.columns.len(), 7);
	assert_eq!(after.columns.last().map(String::as_str), Some("vip"));
	assert_eq!(after.row_count(), 3);
	assert_eq!(after.rows[0].last(), Some(&Value::from(0)));

	let follow_up = executor::execute(&db.pool, "SELECT 1 AS one", 10, Duration::from_secs(5))
		.await
		.expect("Connection must stay usable after the schema change.");

	assert_eq!(follow_up.rows, vec![vec![Value::from(1)]]);

	db.pool.close().await;
	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
async fn empty_result_keeps_column_names() {
	let test_db = TestDatabase::new().await.expect("Failed to create test database.");
	let db = connect(&test_db, false).await;
	let rows = executor::execute(
		&db.pool,
		"SELECT name FROM customers WHERE country = 'Atlantis'",
		10,
		Duration::from_secs(5),
	)
	.await
	.expect("Failed to execute query.");

	assert_eq!(rows.columns, vec!["name"]);
	assert!(rows.rows.is_empty());
	assert!(!rows.truncated);

	db.pool.close().await;
	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
async fn mutations_report_rows_affected() {
	let test_db = TestDatabase::new().await.expect("Failed to create test database.");
	let db = connect(&test_db, false).await;
	let rows = executor::execute(
		&db.pool,
		"UPDATE products SET stock = stock + 1 WHERE category_id = 1",
		10,
		Duration::from_secs(5),
	)
	.await
	.expect("Failed to execute update.");

	assert!(rows.columns.is_empty());
	assert_eq!(rows.rows_affected, Some(2));

	db.pool.close().await;
	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
async fn read_only_database_refuses_writes() {
	let test_db = TestDatabase::new().await.expect("Failed to create test database.");
	let db = connect(&test_db, true).await;
	let err = executor::execute(
		&db.pool,
		"DELETE FROM reviews",
		10,
		Duration::from_secs(5),
	)
	.await
	.expect_err("Expected read-only failure.");

	assert!(matches!(err, Error::Sqlx(_)), "Unexpected error: {err}");

	db.pool.close().await;
	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
async fn invalid_sql_surfaces_database_error() {
	let test_db = TestDatabase::new().await.expect("Failed to create test database.");
	let db = connect(&test_db, false).await;
	let err = executor::execute(&db.pool, "SELECT nme FROM customers", 10, Duration::from_secs(5))
		.await
		.expect_err("Expected unknown column error.");

	assert!(err.to_string().contains("no such column"), "Unexpected error: {err}");

	db.pool.close().await;
	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

mod error;

pub use error::{Error, Result};

use std::{
	collections::HashSet,
	env, fs,
	path::{Path, PathBuf},
	sync::Mutex,
	thread,
	time::Duration,
};

use qdrant_client::Qdrant;
use sqlx::{
	ConnectOptions,
	sqlite::{SqliteConnectOptions, SqliteJournalMode},
};
use tokio::{runtime::Builder, time};
use uuid::Uuid;

/// Table names created by [`TestDatabase::new`], sorted by name.
pub const SAMPLE_TABLES: [&str; 6] =
	["categories", "customers", "order_items", "orders", "products", "reviews"];

const SAMPLE_SCHEMA_SQL: &str = "\
CREATE TABLE categories (
	id INTEGER PRIMARY KEY AUTOINCREMENT,
	name TEXT NOT NULL UNIQUE,
	description TEXT,
	created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);
CREATE TABLE products (
	id INTEGER PRIMARY KEY AUTOINCREMENT,
	name TEXT NOT NULL,
	category_id INTEGER NOT NULL,
	price REAL NOT NULL,
	stock INTEGER NOT NULL DEFAULT 0,
	description TEXT,
	created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
	FOREIGN KEY (category_id) REFERENCES categories(id)
);
CREATE TABLE customers (
	id INTEGER PRIMARY KEY AUTOINCREMENT,
	name TEXT NOT NULL,
	email TEXT NOT NULL UNIQUE,
	country TEXT,
	city TEXT,
	created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);
CREATE TABLE orders (
	id INTEGER PRIMARY KEY AUTOINCREMENT,
	customer_id INTEGER NOT NULL,
	order_date TIMESTAMP NOT NULL,
	total_amount REAL NOT NULL,
	status TEXT NOT NULL,
	FOREIGN KEY (customer_id) REFERENCES customers(id)
);
CREATE TABLE order_items (
	id INTEGER PRIMARY KEY AUTOINCREMENT,
	order_id INTEGER NOT NULL,
	product_id INTEGER NOT NULL,
	quantity INTEGER NOT NULL,
	price REAL NOT NULL,
	FOREIGN KEY (order_id) REFERENCES orders(id),
	FOREIGN KEY (product_id) REFERENCES products(id)
);
CREATE TABLE reviews (
	id INTEGER PRIMARY KEY AUTOINCREMENT,
	product_id INTEGER NOT NULL,
	customer_id INTEGER NOT NULL,
	rating INTEGER NOT NULL CHECK (rating >= 1 AND rating <= 5),
	comment TEXT,
	created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
	FOREIGN KEY (product_id) REFERENCES products(id),
	FOREIGN KEY (customer_id) REFERENCES customers(id)
);";

const SAMPLE_DATA_SQL: &str = "\
INSERT INTO categories (name, description) VALUES
	('Electronics', 'Electronic devices and gadgets'),
	('Books', 'Physical and digital books'),
	('Home & Garden', 'Home improvement and garden supplies');
INSERT INTO products (name, category_id, price, stock, description) VALUES
	('Acme Laptop', 1, 899.5, 12, 'Thin and light.'),
	('Acme Headphones', 1, 59.99, 140, NULL),
	('Field Guide to SQL', 2, 24.0, 35, 'Second edition.'),
	('Garden Lamp', 3, 19.95, 0, NULL);
INSERT INTO customers (name, email, country, city) VALUES
	('Ada Lovelace', 'ada@example.com', 'United Kingdom', 'London'),
	('Grace Hopper', 'grace@example.com', 'United States', 'Arlington'),
	('Edsger Dijkstra', 'edsger@example.com', 'Netherlands', NULL);
INSERT INTO orders (customer_id, order_date, total_amount, status) VALUES
	(1, '2024-01-05 10:00:00', 923.5, 'delivered'),
	(1, '2024-02-11 09:30:00', 59.99, 'shipped'),
	(2, '2024-02-14 16:45:00', 48.0, 'delivered'),
	(3, '2024-03-01 12:00:00', 19.95, 'pending'),
	(2, '2024-03-08 08:15:00', 899.5, 'cancelled');
INSERT INTO order_items (order_id, product_id, quantity, price) VALUES
	(1, 1, 1, 899.5),
	(1, 3, 1, 24.0),
	(2, 2, 1, 59.99),
	(3, 3, 2, 24.0),
	(4, 4, 1, 19.95);
INSERT INTO reviews (product_id, customer_id, rating, comment) VALUES
	(1, 1, 5, 'Fast and quiet.'),
	(3, 2, 4, NULL),
	(4, 3, 2, 'Stopped working after a week.');";

/// A throwaway SQLite database seeded with a small e-commerce schema.
///
/// The file lives in the system temp directory and is removed on cleanup or drop, together with any
/// Qdrant collections handed out by [`TestDatabase::collection_name`].
pub struct TestDatabase {
	name: String,
	path: PathBuf,
	cleaned: bool,
	collections: Mutex<HashSet<String>>,
}
impl TestDatabase {
	pub async fn new() -> Result<Self> {
		let db = Self::empty().await?;

		db.execute_script(SAMPLE_SCHEMA_SQL).await?;
		db.execute_script(SAMPLE_DATA_SQL).await?;

		Ok(db)
	}

	/// A database file with no tables.
	pub async fn empty() -> Result<Self> {
		let name = format!("sqlpilot_test_{}", Uuid::new_v4().simple());
		let path = env::temp_dir().join(format!("{name}.db"));
		let options = SqliteConnectOptions::new()
			.filename(&path)
			.create_if_missing(true)
			.journal_mode(SqliteJournalMode::Delete);
		let conn = options
			.connect()
			.await
			.map_err(|err| Error::Message(format!("Failed to create test database: {err}.")))?;

		sqlx::Connection::close(conn).await?;

		Ok(Self { name, path, cleaned: false, collections: Mutex::new(HashSet::new()) })
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn path_str(&self) -> String {
		self.path.to_string_lossy().into_owned()
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Runs a multi-statement script against the database file.
	pub async fn execute_script(&self, script: &str) -> Result<()> {
		let mut conn = SqliteConnectOptions::new().filename(&self.path).connect().await?;

		sqlx::raw_sql(script).execute(&mut conn).await?;
		sqlx::Connection::close(conn).await?;

		Ok(())
	}

	pub fn collection_name(&self, prefix: &str) -> String {
		let collection = format!("{prefix}_{}", self.name);
		let mut tracked = self.collections.lock().unwrap_or_else(|err| err.into_inner());

		tracked.insert(collection.clone());

		collection
	}

	pub async fn cleanup(mut self) -> Result<()> {
		self.cleanup_inner().await
	}

	async fn cleanup_inner(&mut self) -> Result<()> {
		if self.cleaned {
			return Ok(());
		}

		let collections = {
			let tracked = self.collections.lock().unwrap_or_else(|err| err.into_inner());

			tracked.iter().cloned().collect::<Vec<_>>()
		};
		let file_result = remove_database_file(&self.path);
		let qdrant_result = cleanup_qdrant_collections(&collections).await;

		file_result?;
		qdrant_result?;

		self.cleaned = true;

		Ok(())
	}
}
impl Drop for TestDatabase {
	fn drop(&mut self) {
		if self.cleaned {
			return;
		}
		if let Err(err) = remove_database_file(&self.path) {
			eprintln!("Test database cleanup failed: {err}.");
		}

		let collections = self
			.collections
			.lock()
			.unwrap_or_else(|err| err.into_inner())
			.iter()
			.cloned()
			.collect::<Vec<_>>();

		if collections.is_empty() {
			return;
		}

		let cleanup_thread = thread::spawn(move || {
			let runtime = match Builder::new_current_thread().enable_all().build() {
				Ok(runtime) => runtime,
				Err(err) => {
					eprintln!("Test Qdrant cleanup failed: {err}.");

					return;
				},
			};

			if let Err(err) = runtime.block_on(cleanup_qdrant_collections(&collections)) {
				eprintln!("Test Qdrant cleanup failed: {err}.");
			}
		});
		let _ = cleanup_thread.join();
	}
}

pub fn env_qdrant_url() -> Option<String> {
	env::var("SQLPILOT_QDRANT_URL").ok()
}

fn remove_database_file(path: &Path) -> Result<()> {
	match fs::remove_file(path) {
		Ok(()) => Ok(()),
		Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
		Err(err) => Err(err.into()),
	}
}

async fn cleanup_qdrant_collections(collections: &[String]) -> Result<()> {
	if collections.is_empty() {
		return Ok(());
	}

	let Some(qdrant_url) = env_qdrant_url() else {
		eprintln!("Skipping Qdrant cleanup; set SQLPILOT_QDRANT_URL to delete test collections.");

		return Ok(());
	};
	let client = Qdrant::from_url(&qdrant_url)
		.build()
		.map_err(|err| Error::Message(format!("Failed to build Qdrant client: {err}.")))?;

	for collection in collections {
		if !client.collection_exists(collection.clone()).await? {
			continue;
		}

		let result =
			time::timeout(Duration::from_secs(10), client.delete_collection(collection.clone()))
				.await;

		match result {
			Ok(Ok(_)) => {},
			Ok(Err(err)) => {
				return Err(Error::Message(format!(
					"Failed to delete Qdrant collection {collection:?}: {err}."
				)));
			},
			Err(_) => {
				return Err(Error::Message(format!(
					"Timed out deleting Qdrant collection {collection:?}."
				)));
			},
		}
	}

	Ok(())
}

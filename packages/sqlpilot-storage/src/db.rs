use std::time::Duration;

use sqlx::{
	SqlitePool,
	sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

use crate::Result;

pub struct Db {
	pub pool: SqlitePool,
}
impl Db {
	pub async fn connect(cfg: &sqlpilot_config::Sqlite) -> Result<Self> {
		let options = SqliteConnectOptions::new()
			.filename(&cfg.path)
			.read_only(cfg.read_only)
			.foreign_keys(true)
			.busy_timeout(Duration::from_secs(5));
		let pool = SqlitePoolOptions::new()
			.max_connections(cfg.max_connections)
			.connect_with(options)
			.await?;

		Ok(Self { pool })
	}
}

/// Quotes an identifier for interpolation into SQLite statements.
pub fn quote_ident(name: &str) -> String {
	format!("\"{}\"", name.replace('"', "\"\""))
}

use std::time::Duration;

use futures_util::TryStreamExt;
use serde_json::Value;
use sqlx::{Column, Executor, Row, SqlitePool, TypeInfo, ValueRef, sqlite::SqliteRow};

use crate::{Error, Result, models::QueryRows};

/// Runs one statement with a row cap and a wall-clock limit.
///
/// Statements that declare result columns are fetched; anything else reports `rows_affected`.
/// User SQL never enters the per-connection statement cache, so a schema change between calls
/// cannot leave stale column metadata behind.
pub async fn execute(
	pool: &SqlitePool,
	sql: &str,
	max_rows: usize,
	timeout: Duration,
) -> Result<QueryRows> {
	let timeout_ms = timeout.as_millis() as u64;

	tokio::time::timeout(timeout, run(pool, sql, max_rows))
		.await
		.map_err(|_| Error::Timeout { timeout_ms })?
}

async fn run(pool: &SqlitePool, sql: &str, max_rows: usize) -> Result<QueryRows> {
	let described = pool.describe(sql).await?;
	let columns =
		described.columns().iter().map(|column| column.name().to_string()).collect::<Vec<_>>();

	if columns.is_empty() {
		let done = sqlx::query(sql).persistent(false).execute(pool).await?;

		return Ok(QueryRows {
			columns,
			rows: Vec::new(),
			truncated: false,
			rows_affected: Some(done.rows_affected()),
		});
	}

	let mut stream = sqlx::query(sql).persistent(false).fetch(pool);
	let mut rows = Vec::new();
	let mut truncated = false;

	while let Some(row) = stream.try_next().await? {
		if rows.len() == max_rows {
			truncated = true;

			break;
		}

		rows.push(decode_row(&row)?);
	}

	if truncated {
		tracing::info!(max_rows, "Result set truncated.");
	}

	Ok(QueryRows { columns, rows, truncated, rows_affected: None })
}

/// Decodes a row into JSON values by the storage class of each value.
pub(crate) fn decode_row(row: &SqliteRow) -> Result<Vec<Value>> {
	let mut values = Vec::with_capacity(row.len());

	for idx in 0..row.len() {
		let raw = row.try_get_raw(idx)?;

		if raw.is_null() {
			values.push(Value::Null);

			continue;
		}

		let storage_class = raw.type_info().name().to_string();
		let value = match storage_class.as_str() {
			"INTEGER" | "BOOLEAN" => Value::from(row.try_get_unchecked::<i64, _>(idx)?),
			"REAL" => Value::from(row.try_get_unchecked::<f64, _>(idx)?),
			"BLOB" => {
				let bytes = row.try_get_unchecked::<Vec<u8>, _>(idx)?;

				Value::String(format!("<{} bytes>", bytes.len()))
			},
			_ => Value::String(row.try_get_unchecked::<String, _>(idx)?),
		};

		values.push(value);
	}

	Ok(values)
}

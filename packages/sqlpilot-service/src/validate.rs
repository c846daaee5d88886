use crate::SqlPilot;
use sqlpilot_domain::validator::{self, KnownTables, ValidationOutcome};

impl SqlPilot {
	/// Runs the validation layers against the live table set, honoring `query.strict`.
	///
	/// A failure to list tables does not fail validation; it shows up as a schema warning.
	pub async fn validate(&self, sql: &str) -> ValidationOutcome {
		let strict = self.cfg.query.strict;
		let listed = self.stores.schema.list_tables().await;
		let outcome = match &listed {
			Ok(tables) => validator::validate(sql, strict, KnownTables::Listed(tables)),
			Err(err) => {
				let message = err.to_string();

				validator::validate(sql, strict, KnownTables::Unavailable(&message))
			},
		};

		match &outcome.rejection {
			Some(rejection) => tracing::warn!(
				layer = ?rejection.layer,
				reason = %rejection.reason,
				"Query rejected."
			),
			None => tracing::info!(warnings = outcome.warnings.len(), "Query accepted."),
		}

		outcome
	}
}

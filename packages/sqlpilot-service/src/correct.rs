use serde::Serialize;

use crate::{Result, SqlPilot};
use sqlpilot_domain::{prompt, response};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorrectionResult {
	pub original_sql: String,
	pub error_message: String,
	pub sql: String,
	pub explanation: String,
	pub corrected: bool,
}

impl SqlPilot {
	/// Asks the model once for a fixed query. The suggestion is returned, never executed.
	pub async fn correct(&self, sql: &str, error_message: &str) -> Result<CorrectionResult> {
		let summary = self.correction_schema_summary().await?;
		let prompt = prompt::correction_prompt(sql, error_message, &summary);
		let temperature = self.cfg.query.correction_temperature;
		let reply = self
			.providers
			.generation
			.complete(&self.cfg.providers.generation, &prompt, temperature)
			.await?;
		let parsed = response::parse_correction_reply(&reply);

		tracing::info!(corrected = parsed.corrected, "Correction attempted.");

		Ok(CorrectionResult {
			original_sql: sql.to_string(),
			error_message: error_message.to_string(),
			sql: parsed.sql,
			explanation: parsed.explanation,
			corrected: parsed.corrected,
		})
	}
}

use serde::Serialize;

use crate::{Error, Result, SqlPilot};
use sqlpilot_domain::prompt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Explanation {
	pub sql: String,
	pub explanation: String,
}

impl SqlPilot {
	pub async fn explain(&self, sql: &str) -> Result<Explanation> {
		let sql = sql.trim();

		if sql.is_empty() {
			return Err(Error::InvalidRequest { message: "SQL must be non-empty.".to_string() });
		}

		let prompt = prompt::explanation_prompt(sql);
		let reply = self
			.providers
			.generation
			.complete(&self.cfg.providers.generation, &prompt, self.cfg.query.explain_temperature)
			.await?;

		Ok(Explanation { sql: sql.to_string(), explanation: reply.trim().to_string() })
	}
}

use serde::Serialize;

use crate::{Result, SqlPilot};
use sqlpilot_domain::{
	prompt,
	response::{self, Confidence, SqlSource},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationResult {
	pub sql: String,
	pub explanation: String,
	pub confidence: Confidence,
	pub sql_source: Option<SqlSource>,
	/// No extraction rule matched; `sql` is empty.
	pub unparseable: bool,
}

impl SqlPilot {
	/// One generation call. Model failures propagate; an unusable reply does not.
	pub async fn generate(
		&self,
		question: &str,
		schema_context: &str,
		extra_context: Option<&str>,
	) -> Result<GenerationResult> {
		let llm = &self.cfg.providers.generation;
		let prompt = prompt::generation_prompt(question, schema_context, extra_context);
		let reply = self.providers.generation.complete(llm, &prompt, llm.temperature).await?;
		let parsed = response::parse_generation_reply(&reply);
		let unparseable = parsed.sql_source.is_none();

		if unparseable {
			tracing::warn!(reply_len = reply.len(), "Generation reply contained no SQL.");
		} else {
			tracing::info!(
				confidence = parsed.confidence.as_str(),
				source = ?parsed.sql_source,
				"Generated SQL."
			);
		}

		Ok(GenerationResult {
			sql: parsed.sql,
			explanation: parsed.explanation,
			confidence: parsed.confidence,
			sql_source: parsed.sql_source,
			unparseable,
		})
	}
}

//! The question-to-result chain: selection, context, generation, validation, execution, and one
//! correction attempt on execution failure.
//!
//! Stages run strictly in sequence. The cancel flag is checked before each stage starts.

use serde::Serialize;

use crate::{
	CancelFlag, CorrectionResult, Error, GenerationResult, Result, SqlPilot,
	retrieval::Degradation,
};
use sqlpilot_domain::validator::ValidationOutcome;
use sqlpilot_storage::models::QueryRows;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FallbackReason {
	Disabled,
	IndexMissing,
	NoMatches,
	RetrievalFailed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum SelectionSource {
	Retrieval,
	/// Every table in the database was used.
	AllTables { reason: FallbackReason },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
	pub tables: Vec<String>,
	pub source: SelectionSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Nl2SqlReport {
	pub question: String,
	pub selection: Selection,
	pub generation: GenerationResult,
	pub validation: ValidationOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrectionSuggestion {
	pub correction: CorrectionResult,
	/// Validation of the corrected SQL. `None` when nothing was corrected.
	pub validation: Option<ValidationOutcome>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AskOutcome {
	Executed { rows: QueryRows },
	Rejected { reason: String, warnings: Vec<String> },
	Unparseable,
	ExecutionFailed {
		message: String,
		correction: Option<CorrectionSuggestion>,
		/// Why no correction is attached when the correction call itself failed.
		correction_error: Option<String>,
	},
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AskReport {
	pub question: String,
	pub selection: Selection,
	pub generation: GenerationResult,
	pub validation: ValidationOutcome,
	pub outcome: AskOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecuteReport {
	pub sql: String,
	pub validation: ValidationOutcome,
	pub rows: QueryRows,
}

impl SqlPilot {
	/// Generates and validates SQL for a question without executing it.
	pub async fn nl2sql(
		&self,
		question: &str,
		extra_context: Option<&str>,
		cancel: &CancelFlag,
	) -> Result<Nl2SqlReport> {
		let question = question.trim();

		if question.is_empty() {
			return Err(Error::InvalidRequest {
				message: "Question must be non-empty.".to_string(),
			});
		}

		cancel.check("table selection")?;

		let selection = self.select_tables(question).await?;

		cancel.check("context assembly")?;

		let context = self.build_context(&selection.tables).await?;

		cancel.check("generation")?;

		let generation = self.generate(question, &context, extra_context).await?;

		cancel.check("validation")?;

		let validation = self.validate(&generation.sql).await;

		Ok(Nl2SqlReport { question: question.to_string(), selection, generation, validation })
	}

	/// Full chain. A rejected query is never executed; a failed execution gets at most one
	/// correction, returned as a suggestion.
	///
	/// An unreachable or timed-out model during correction is returned as the error. Other
	/// correction failures are recorded in the outcome next to the execution error.
	pub async fn ask(
		&self,
		question: &str,
		extra_context: Option<&str>,
		cancel: &CancelFlag,
	) -> Result<AskReport> {
		let Nl2SqlReport { question, selection, generation, validation } =
			self.nl2sql(question, extra_context, cancel).await?;
		let outcome = if generation.unparseable {
			AskOutcome::Unparseable
		} else if let Some(rejection) = &validation.rejection {
			AskOutcome::Rejected {
				reason: rejection.reason.clone(),
				warnings: validation.warnings.clone(),
			}
		} else {
			cancel.check("execution")?;

			match self.stores.executor.execute(&generation.sql).await {
				Ok(rows) => {
					tracing::info!(
						rows = rows.row_count(),
						truncated = rows.truncated,
						"Query executed."
					);

					AskOutcome::Executed { rows }
				},
				Err(Error::ExecutionFailed { message }) => {
					tracing::warn!(error = %message, "Query execution failed.");

					cancel.check("correction")?;

					let (correction, correction_error) =
						match self.suggest_correction(&generation.sql, &message).await {
							Ok(suggestion) => (Some(suggestion), None),
							Err(err) if err.is_backend_failure() => return Err(err),
							Err(err) => {
								tracing::warn!(error = %err, "Correction failed.");

								(None, Some(err.to_string()))
							},
						};

					AskOutcome::ExecutionFailed { message, correction, correction_error }
				},
				Err(err) => return Err(err),
			}
		};

		Ok(AskReport { question, selection, generation, validation, outcome })
	}

	/// Validates and runs caller-supplied SQL, such as a confirmed correction.
	pub async fn execute_sql(&self, sql: &str) -> Result<ExecuteReport> {
		let validation = self.validate(sql).await;

		if let Some(rejection) = &validation.rejection {
			return Err(Error::ValidationRejected {
				reason: rejection.reason.clone(),
				warnings: validation.warnings.clone(),
			});
		}

		let sql = sql.trim();
		let rows = self.stores.executor.execute(sql).await?;

		Ok(ExecuteReport { sql: sql.to_string(), validation, rows })
	}

	async fn select_tables(&self, question: &str) -> Result<Selection> {
		if !self.cfg.retrieval.enabled {
			return self.all_tables(FallbackReason::Disabled).await;
		}

		let outcome = self.retrieve(question, None, None).await;

		match outcome.degraded {
			Some(Degradation::IndexMissing) => self.all_tables(FallbackReason::IndexMissing).await,
			Some(Degradation::Failed { message }) =>
				self.all_tables(FallbackReason::RetrievalFailed { message }).await,
			None if outcome.tables.is_empty() => self.all_tables(FallbackReason::NoMatches).await,
			None => Ok(Selection { tables: outcome.tables, source: SelectionSource::Retrieval }),
		}
	}

	async fn all_tables(&self, reason: FallbackReason) -> Result<Selection> {
		let tables = self.stores.schema.list_tables().await?;

		tracing::info!(reason = ?reason, tables = tables.len(), "Using all tables.");

		Ok(Selection { tables, source: SelectionSource::AllTables { reason } })
	}

	async fn suggest_correction(&self, sql: &str, message: &str) -> Result<CorrectionSuggestion> {
		let correction = self.correct(sql, message).await?;
		let validation =
			if correction.corrected { Some(self.validate(&correction.sql).await) } else { None };

		Ok(CorrectionSuggestion { correction, validation })
	}
}

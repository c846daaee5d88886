//! Plain-text rendering of service reports for the terminal.

use serde_json::Value;

use sqlpilot_domain::validator::ValidationOutcome;
use sqlpilot_service::{
	AskOutcome, AskReport, CorrectionSuggestion, FallbackReason, GenerationResult, IndexStats,
	IndexStatus, RetrievalHit, SchemaSummary, Selection, SelectionSource,
};
use sqlpilot_storage::models::QueryRows;

const MAX_CELL_CHARS: usize = 48;

pub fn rows(rows: &QueryRows) -> String {
	if let Some(affected) = rows.rows_affected {
		return format!("{affected} rows affected.");
	}

	let cells = rows
		.rows
		.iter()
		.map(|row| row.iter().map(cell).collect::<Vec<_>>())
		.collect::<Vec<_>>();
	let mut widths = rows.columns.iter().map(|column| column.chars().count()).collect::<Vec<_>>();

	for row in &cells {
		for (idx, value) in row.iter().enumerate() {
			if let Some(width) = widths.get_mut(idx) {
				*width = (*width).max(value.chars().count());
			}
		}
	}

	let mut lines = vec![
		table_line(&rows.columns, &widths),
		widths.iter().map(|width| "-".repeat(*width)).collect::<Vec<_>>().join("-+-"),
	];

	for row in &cells {
		lines.push(table_line(row, &widths));
	}

	let noun = if rows.row_count() == 1 { "row" } else { "rows" };
	let mut footer = format!("({} {noun})", rows.row_count());

	if rows.truncated {
		footer.push_str(" (truncated)");
	}

	lines.push(footer);

	lines.join("\n")
}

pub fn validation(outcome: &ValidationOutcome) -> String {
	let mut lines = Vec::new();

	match &outcome.rejection {
		Some(rejection) =>
			lines.push(format!("Rejected at {:?} layer: {}", rejection.layer, rejection.reason)),
		None => lines.push("Accepted.".to_string()),
	}

	for warning in &outcome.warnings {
		lines.push(format!("  warning: {warning}"));
	}

	lines.join("\n")
}

pub fn generation(result: &GenerationResult) -> String {
	if result.unparseable {
		return "The model reply contained no SQL.".to_string();
	}

	let mut text = format!("{}\n\nConfidence: {}", result.sql, result.confidence.as_str());

	if !result.explanation.is_empty() {
		text.push_str("\n\n");
		text.push_str(&result.explanation);
	}

	text
}

pub fn selection(selection: &Selection) -> String {
	let source = match &selection.source {
		SelectionSource::Retrieval => "retrieved".to_string(),
		SelectionSource::AllTables { reason } => match reason {
			FallbackReason::Disabled => "all tables, retrieval disabled".to_string(),
			FallbackReason::IndexMissing => "all tables, index missing".to_string(),
			FallbackReason::NoMatches => "all tables, no similar tables".to_string(),
			FallbackReason::RetrievalFailed { message } =>
				format!("all tables, retrieval failed: {message}"),
		},
	};

	format!("Tables ({source}): {}", selection.tables.join(", "))
}

pub fn ask(report: &AskReport) -> String {
	let mut sections = vec![selection(&report.selection), generation(&report.generation)];

	if !report.generation.unparseable {
		sections.push(validation(&report.validation));
	}

	match &report.outcome {
		AskOutcome::Executed { rows: result } => sections.push(rows(result)),
		AskOutcome::Rejected { .. } => sections.push("The query was not executed.".to_string()),
		AskOutcome::Unparseable => {},
		AskOutcome::ExecutionFailed { message, correction, correction_error } => {
			sections.push(format!("Execution failed: {message}"));

			if let Some(suggestion) = correction {
				sections.push(correction_suggestion(suggestion));
			}
			if let Some(error) = correction_error {
				sections.push(format!("No correction: {error}"));
			}
		},
	}

	sections.join("\n\n")
}

pub fn correction_suggestion(suggestion: &CorrectionSuggestion) -> String {
	let correction = &suggestion.correction;

	if !correction.corrected {
		return "No correction could be produced.".to_string();
	}

	let mut text = format!("Suggested correction:\n{}", correction.sql);

	if !correction.explanation.is_empty() {
		text.push_str("\n\n");
		text.push_str(&correction.explanation);
	}
	if let Some(outcome) = &suggestion.validation {
		text.push_str("\n\n");
		text.push_str(&validation(outcome));
	}

	text
}

pub fn schema_summary(summary: &SchemaSummary) -> String {
	summary
		.tables
		.iter()
		.map(|table| {
			format!("{} ({} rows): {}", table.name, table.row_count, table.columns.join(", "))
		})
		.collect::<Vec<_>>()
		.join("\n")
}

pub fn hits(hits: &[RetrievalHit]) -> String {
	if hits.is_empty() {
		return "No tables matched.".to_string();
	}

	hits.iter()
		.enumerate()
		.map(|(idx, hit)| {
			format!(
				"{}. {} (similarity {:.3}, {} rows, {} columns)",
				idx + 1,
				hit.table,
				hit.similarity,
				hit.row_count,
				hit.column_count
			)
		})
		.collect::<Vec<_>>()
		.join("\n")
}

pub fn index_stats(stats: &IndexStats) -> String {
	let verb = if stats.rebuilt { "Rebuilt" } else { "Updated" };

	format!("{verb} {}: indexed {} of {} tables.", stats.collection, stats.indexed, stats.total)
}

pub fn index_status(status: &IndexStatus) -> String {
	if status.indexed {
		format!("{}: {} tables indexed.", status.collection, status.count)
	} else {
		format!("{}: not indexed.", status.collection)
	}
}

fn table_line(values: &[String], widths: &[usize]) -> String {
	values
		.iter()
		.zip(widths)
		.map(|(value, width)| format!("{value:<width$}"))
		.collect::<Vec<_>>()
		.join(" | ")
		.trim_end()
		.to_string()
}

fn cell(value: &Value) -> String {
	let text = match value {
		Value::Null => "NULL".to_string(),
		Value::String(text) => text.clone(),
		other => other.to_string(),
	};

	if text.chars().count() <= MAX_CELL_CHARS {
		return text;
	}

	let mut clipped = text.chars().take(MAX_CELL_CHARS - 3).collect::<String>();

	clipped.push_str("...");

	clipped
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn renders_aligned_table_with_footer() {
		let result = QueryRows {
			columns: vec!["name".to_string(), "total".to_string()],
			rows: vec![
				vec![Value::from("Ada Lovelace"), Value::from(983.49)],
				vec![Value::from("Grace Hopper"), Value::Null],
			],
			truncated: true,
			rows_affected: None,
		};

		assert_eq!(
			rows(&result),
			"name         | total\n\
			 -------------+-------\n\
			 Ada Lovelace | 983.49\n\
			 Grace Hopper | NULL\n\
			 (2 rows) (truncated)"
		);
	}

	#[test]
	fn reports_affected_rows_for_writes() {
		let result = QueryRows { rows_affected: Some(2), ..QueryRows::default() };

		assert_eq!(rows(&result), "2 rows affected.");
	}

	#[test]
	fn clips_long_cells() {
		let long = "x".repeat(MAX_CELL_CHARS + 10);
		let clipped = cell(&Value::from(long));

		assert_eq!(clipped.chars().count(), MAX_CELL_CHARS);
		assert!(clipped.ends_with("..."));
	}
}

//! Parsers for generation-model replies.
//!
//! Each field is extracted by an ordered list of named rules; the first rule that yields a
//! non-empty value wins. A reply that matches no SQL rule is still a valid parse with an empty
//! query. The `SQL:` marker rule is skipped whenever a ```` ```sql ```` fence is present, even an
//! empty one; the `SELECT` scan still applies.

use serde::{Deserialize, Serialize};

pub const EXPLANATION_MARKER: &str = "EXPLANATION:";
pub const CONFIDENCE_MARKER: &str = "CONFIDENCE:";
pub const DEFAULT_CORRECTION_EXPLANATION: &str =
	"Query has been corrected based on the error message.";

const SQL_FENCE: &str = "```sql";
const FENCE: &str = "```";
const SQL_MARKER: &str = "SQL:";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
	High,
	#[default]
	Medium,
	Low,
}
impl Confidence {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::High => "high",
			Self::Medium => "medium",
			Self::Low => "low",
		}
	}
}

/// Which extraction rule produced the SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlSource {
	FencedBlock,
	SqlMarker,
	SelectScan,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedGeneration {
	pub sql: String,
	pub explanation: String,
	pub confidence: Confidence,
	/// `None` when no rule matched and `sql` is empty.
	pub sql_source: Option<SqlSource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedCorrection {
	pub sql: String,
	pub explanation: String,
	pub corrected: bool,
}

pub fn parse_generation_reply(reply: &str) -> ParsedGeneration {
	let rules: [(SqlSource, fn(&str) -> Option<String>); 3] = [
		(SqlSource::FencedBlock, fenced_sql),
		(SqlSource::SqlMarker, marker_sql),
		(SqlSource::SelectScan, select_scan_sql),
	];
	let fenced = fence_content_start(reply).is_some();
	let (sql, sql_source) = rules
		.iter()
		.filter(|(source, _)| !(fenced && *source == SqlSource::SqlMarker))
		.find_map(|(source, rule)| rule(reply).map(|sql| (sql, Some(*source))))
		.unwrap_or_default();

	ParsedGeneration {
		sql,
		explanation: explanation(reply).unwrap_or_default(),
		confidence: confidence(reply),
		sql_source,
	}
}

pub fn parse_correction_reply(reply: &str) -> ParsedCorrection {
	let sql = fenced_sql(reply).unwrap_or_default();
	let explanation = match reply.find(EXPLANATION_MARKER) {
		Some(start) => reply[start + EXPLANATION_MARKER.len()..].trim().to_string(),
		None if !sql.is_empty() => DEFAULT_CORRECTION_EXPLANATION.to_string(),
		None => String::new(),
	};
	let corrected = !sql.is_empty();

	ParsedCorrection { sql, explanation, corrected }
}

/// Content between a case-insensitive ```` ```sql ```` marker and the next fence, or the end of
/// the reply when the block is never closed.
fn fenced_sql(reply: &str) -> Option<String> {
	let start = fence_content_start(reply)?;
	let end = reply[start..].find(FENCE).map(|offset| start + offset).unwrap_or(reply.len());

	non_empty(&reply[start..end])
}

/// Offset just past the ```` ```sql ```` marker. A language suffix that runs to the end of the
/// marker line, as in ```` ```sqlite ````, is skipped too.
fn fence_content_start(reply: &str) -> Option<usize> {
	// ASCII lower-casing keeps byte offsets aligned with the original text.
	let start = reply.to_ascii_lowercase().find(SQL_FENCE)? + SQL_FENCE.len();
	let rest = &reply[start..];
	let suffix = rest.bytes().take_while(u8::is_ascii_alphanumeric).count();
	let after = rest[suffix..].trim_start_matches([' ', '\t']);

	if after.is_empty() || after.starts_with(['\n', '\r']) {
		Some(start + suffix)
	} else {
		Some(start)
	}
}

fn marker_sql(reply: &str) -> Option<String> {
	let mut lines = reply.lines().skip_while(|line| !line.contains(SQL_MARKER));

	lines.next()?;

	let collected = lines
		.take_while(|line| !line.contains(EXPLANATION_MARKER) && !line.contains(CONFIDENCE_MARKER))
		.filter(|line| !line.trim().is_empty() && !line.starts_with(FENCE))
		.collect::<Vec<_>>();

	non_empty(&collected.join("\n"))
}

fn select_scan_sql(reply: &str) -> Option<String> {
	let start = reply.to_ascii_uppercase().find("SELECT")?;
	let tail = &reply[start..];

	if let Some(end) = tail.find(';') {
		return non_empty(&tail[..=end]);
	}

	let collected = tail
		.lines()
		.skip_while(|line| line.trim().is_empty())
		.take_while(|line| !line.trim().is_empty())
		.collect::<Vec<_>>();

	non_empty(&collected.join("\n"))
}

fn explanation(reply: &str) -> Option<String> {
	let start = reply.find(EXPLANATION_MARKER)? + EXPLANATION_MARKER.len();
	let end =
		reply[start..].find(CONFIDENCE_MARKER).map(|offset| start + offset).unwrap_or(reply.len());

	Some(reply[start..end].trim().to_string())
}

fn confidence(reply: &str) -> Confidence {
	let Some(start) = reply.find(CONFIDENCE_MARKER) else {
		return Confidence::Medium;
	};
	let tail = reply[start + CONFIDENCE_MARKER.len()..].trim().to_lowercase();

	if tail.contains("high") {
		Confidence::High
	} else if tail.contains("low") {
		Confidence::Low
	} else {
		Confidence::Medium
	}
}

fn non_empty(text: &str) -> Option<String> {
	let trimmed = text.trim();

	if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
}

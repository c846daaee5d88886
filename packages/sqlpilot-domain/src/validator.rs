//! Layered, heuristic SQL validation.
//!
//! Layers run in a fixed order: syntax, safety, schema reference, performance. Only the first two
//! can reject. Strict mode applies the first-token allow-list in the syntax layer, so a statement
//! such as `DROP TABLE t` is rejected there and never reaches the safety scan. Without strict mode
//! the same statement passes syntax and picks up advisory safety warnings instead.

use regex::Regex;
use serde::{Deserialize, Serialize};

pub const INVALID_SYNTAX_WARNING: &str = "Invalid SQL syntax";
pub const DANGEROUS_KEYWORDS: [&str; 7] =
	["DROP", "DELETE", "TRUNCATE", "ALTER", "CREATE", "INSERT", "UPDATE"];
pub const ALLOWED_FIRST_TOKENS: [&str; 3] = ["SELECT", "WITH", "EXPLAIN"];

const MAX_JOINS: usize = 3;
const SUBQUERY_SCAN_OFFSET: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationLayer {
	Syntax,
	Safety,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
	pub layer: ValidationLayer,
	pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
	pub accepted: bool,
	pub warnings: Vec<String>,
	pub rejection: Option<Rejection>,
}
impl ValidationOutcome {
	fn rejected(layer: ValidationLayer, reason: String, warnings: Vec<String>) -> Self {
		Self { accepted: false, warnings, rejection: Some(Rejection { layer, reason }) }
	}
}

/// The live table set the schema-reference layer compares against.
#[derive(Debug, Clone, Copy)]
pub enum KnownTables<'a> {
	Listed(&'a [String]),
	/// The table set could not be read; carries the error text.
	Unavailable(&'a str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SyntaxIssue {
	Empty,
	UnbalancedParentheses { open: usize, close: usize },
	DisallowedStatement(String),
}
impl SyntaxIssue {
	fn describe(&self) -> String {
		match self {
			Self::Empty => "query is empty".to_string(),
			Self::UnbalancedParentheses { open, close } =>
				format!("unbalanced parentheses ({open} opening, {close} closing)"),
			Self::DisallowedStatement(token) =>
				format!("statement starts with {token}, expected one of SELECT, WITH, EXPLAIN"),
		}
	}
}

pub fn validate(sql: &str, strict: bool, known_tables: KnownTables<'_>) -> ValidationOutcome {
	let sql = sql.trim();

	if let Err(issue) = check_syntax(sql, strict) {
		return ValidationOutcome::rejected(
			ValidationLayer::Syntax,
			issue.describe(),
			vec![INVALID_SYNTAX_WARNING.to_string()],
		);
	}

	let mut warnings = Vec::new();
	let dangerous = dangerous_keywords(sql);

	if !dangerous.is_empty() {
		let safety_warnings = dangerous
			.iter()
			.map(|keyword| format!("Dangerous operation detected: {keyword}"))
			.collect::<Vec<_>>();

		if strict {
			return ValidationOutcome::rejected(
				ValidationLayer::Safety,
				format!("query contains blocked operations: {}", dangerous.join(", ")),
				safety_warnings,
			);
		}

		warnings.extend(safety_warnings);
	}

	warnings.extend(schema_warnings(sql, known_tables));
	warnings.extend(performance_warnings(sql));

	ValidationOutcome { accepted: true, warnings, rejection: None }
}

/// Table identifiers following `FROM` or `JOIN`, lower-cased, deduplicated in appearance order.
///
/// Comma-separated lists and derived tables are not captured.
pub fn referenced_tables(sql: &str) -> Vec<String> {
	let Ok(pattern) = Regex::new(r"(?i)\bFROM\s+(\w+)|\bJOIN\s+(\w+)") else {
		return Vec::new();
	};
	let mut tables: Vec<String> = Vec::new();

	for caps in pattern.captures_iter(sql) {
		let Some(name) = caps.get(1).or_else(|| caps.get(2)) else {
			continue;
		};
		let name = name.as_str().to_lowercase();

		if !tables.contains(&name) {
			tables.push(name);
		}
	}

	tables
}

fn check_syntax(sql: &str, strict: bool) -> Result<(), SyntaxIssue> {
	if sql.is_empty() {
		return Err(SyntaxIssue::Empty);
	}

	let open = sql.matches('(').count();
	let close = sql.matches(')').count();

	if open != close {
		return Err(SyntaxIssue::UnbalancedParentheses { open, close });
	}
	if strict {
		let first = sql.split_whitespace().next().unwrap_or_default().to_uppercase();

		if !ALLOWED_FIRST_TOKENS.contains(&first.as_str()) {
			return Err(SyntaxIssue::DisallowedStatement(first));
		}
	}

	Ok(())
}

fn dangerous_keywords(sql: &str) -> Vec<&'static str> {
	DANGEROUS_KEYWORDS
		.into_iter()
		.filter(|keyword| contains_word(sql, keyword))
		.collect()
}

fn schema_warnings(sql: &str, known_tables: KnownTables<'_>) -> Vec<String> {
	let known = match known_tables {
		KnownTables::Listed(tables) =>
			tables.iter().map(|table| table.to_lowercase()).collect::<Vec<_>>(),
		KnownTables::Unavailable(err) => {
			return vec![format!("Could not validate schema: {err}")];
		},
	};

	referenced_tables(sql)
		.into_iter()
		.filter(|table| !known.contains(table))
		.map(|table| format!("Table '{table}' not found in schema"))
		.collect()
}

fn performance_warnings(sql: &str) -> Vec<String> {
	let mut warnings = Vec::new();
	let select_star = Regex::new(r"(?i)\bSELECT\s+\*").map(|re| re.is_match(sql)).unwrap_or(false);

	if select_star && !contains_word(sql, "LIMIT") {
		warnings.push("Query uses SELECT * without LIMIT - may return many rows".to_string());
	}

	let joins = count_word(sql, "JOIN");

	if joins > MAX_JOINS {
		warnings.push(format!("Query has {joins} JOINs - may be slow"));
	}
	if has_select_after(sql, SUBQUERY_SCAN_OFFSET) {
		warnings.push("Query contains subqueries - verify performance".to_string());
	}

	warnings
}

fn word_pattern(word: &str) -> Option<Regex> {
	Regex::new(&format!(r"(?i)\b{}\b", regex::escape(word))).ok()
}

fn contains_word(sql: &str, word: &str) -> bool {
	word_pattern(word).map(|re| re.is_match(sql)).unwrap_or(false)
}

fn count_word(sql: &str, word: &str) -> usize {
	word_pattern(word).map(|re| re.find_iter(sql).count()).unwrap_or(0)
}

fn has_select_after(sql: &str, char_offset: usize) -> bool {
	let Some((byte_offset, _)) = sql.char_indices().nth(char_offset) else {
		return false;
	};

	word_pattern("SELECT")
		.map(|re| re.find_iter(sql).any(|found| found.start() >= byte_offset))
		.unwrap_or(false)
}

use sqlpilot_domain::{
	response::{self, Confidence},
	validator::{self, INVALID_SYNTAX_WARNING, KnownTables, ValidationLayer},
};

fn sample_tables() -> Vec<String> {
	["categories", "customers", "orders", "products", "reviews"]
		.iter()
		.map(|name| name.to_string())
		.collect()
}

#[test]
fn unbalanced_parentheses_win_over_dangerous_keywords() {
	let tables = sample_tables();

	for strict in [true, false] {
		let outcome = validator::validate(
			"SELECT COUNT(( FROM orders; DROP TABLE orders",
			strict,
			KnownTables::Listed(&tables),
		);

		assert!(!outcome.accepted);
		assert_eq!(outcome.warnings, vec![INVALID_SYNTAX_WARNING.to_string()]);
		assert_eq!(
			outcome.rejection.map(|rejection| rejection.layer),
			Some(ValidationLayer::Syntax)
		);
	}
}

#[test]
fn strict_select_star_is_accepted_with_performance_warning() {
	let tables = sample_tables();
	let outcome = validator::validate("SELECT * FROM customers", true, KnownTables::Listed(&tables));

	assert!(outcome.accepted);
	assert_eq!(
		outcome.warnings,
		vec!["Query uses SELECT * without LIMIT - may return many rows".to_string()]
	);
}

#[test]
fn strict_drop_is_rejected_by_the_first_token_gate() {
	let tables = sample_tables();
	let outcome = validator::validate("DROP TABLE customers", true, KnownTables::Listed(&tables));

	assert!(!outcome.accepted);
	assert_eq!(outcome.warnings, vec![INVALID_SYNTAX_WARNING.to_string()]);
	assert_eq!(outcome.rejection.map(|rejection| rejection.layer), Some(ValidationLayer::Syntax));
}

#[test]
fn relaxed_drop_is_accepted_with_safety_warning() {
	let tables = sample_tables();
	let outcome = validator::validate("DROP TABLE customers", false, KnownTables::Listed(&tables));

	assert!(outcome.accepted);
	assert_eq!(outcome.warnings, vec!["Dangerous operation detected: DROP".to_string()]);
	assert!(outcome.rejection.is_none());
}

#[test]
fn relaxed_mode_keeps_running_later_layers() {
	let tables = sample_tables();
	let outcome = validator::validate(
		"DELETE FROM archive WHERE id IN (SELECT id FROM orders)",
		false,
		KnownTables::Listed(&tables),
	);

	assert!(outcome.accepted);
	assert_eq!(
		outcome.warnings,
		vec![
			"Dangerous operation detected: DELETE".to_string(),
			"Table 'archive' not found in schema".to_string(),
			"Query contains subqueries - verify performance".to_string(),
		]
	);
}

#[test]
fn fenced_reply_round_trips() {
	let parsed =
		response::parse_generation_reply("```sql\nSELECT 1\n```\nEXPLANATION:\nfoo\nCONFIDENCE:\nHigh");

	assert_eq!(parsed.sql, "SELECT 1");
	assert_eq!(parsed.explanation, "foo");
	assert_eq!(parsed.confidence, Confidence::High);
}

#[test]
fn reply_without_fence_or_select_is_empty() {
	let parsed =
		response::parse_generation_reply("Sorry, the schema has no such data.\nCONFIDENCE: unsure");

	assert_eq!(parsed.sql, "");
	assert_eq!(parsed.confidence, Confidence::Medium);
	assert!(parsed.sql_source.is_none());
}

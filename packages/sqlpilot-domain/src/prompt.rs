//! Prompt templates sent to the generation model. The target dialect is SQLite.

pub fn generation_prompt(
	question: &str,
	schema_context: &str,
	extra_context: Option<&str>,
) -> String {
	let mut prompt = format!(
		"You are an expert SQL query generator. Convert the natural language question into a valid SQLite query.

DATABASE SCHEMA:
{schema_context}

IMPORTANT RULES:
1. Generate ONLY valid SQLite syntax
2. Use proper table and column names from the schema
3. Include appropriate JOINs when querying multiple tables
4. Use aliases for better readability
5. Add LIMIT clause for queries that might return many rows
6. Return results in a logical order (use ORDER BY)
7. Use aggregate functions (COUNT, SUM, AVG, etc.) when appropriate

USER QUESTION:
{question}

RESPONSE FORMAT:
Provide your response in the following format:

SQL:
```sql
[Your SQL query here]
```

EXPLANATION:
[Brief explanation of what the query does and why you structured it this way]

CONFIDENCE:
[High/Medium/Low - your confidence in this query]

Now generate the SQL query:"
	);

	if let Some(extra) = extra_context.map(str::trim).filter(|extra| !extra.is_empty()) {
		prompt.push_str("\n\nADDITIONAL CONTEXT:\n");
		prompt.push_str(extra);
	}

	prompt
}

pub fn correction_prompt(sql: &str, error_message: &str, schema_summary: &str) -> String {
	format!(
		"You are an expert SQL debugger. A SQL query has failed with an error. Your job is to fix it.

DATABASE SCHEMA:
{schema_summary}

FAILED QUERY:
```sql
{sql}
```

ERROR MESSAGE:
{error_message}

Analyze the error and provide a corrected version of the query.

RESPONSE FORMAT:
CORRECTED SQL:
```sql
[Your corrected SQL query here]
```

EXPLANATION:
[Explain what was wrong and how you fixed it]

Now provide the correction:"
	)
}

pub fn explanation_prompt(sql: &str) -> String {
	format!(
		"You are an expert SQL instructor. Explain the following SQL query in simple, clear language.

SQL QUERY:
```sql
{sql}
```

Provide a step-by-step explanation that includes:
1. What data is being retrieved
2. From which tables
3. What conditions/filters are applied
4. How tables are joined (if applicable)
5. Any aggregations or grouping
6. How results are sorted/limited

Make it easy to understand for someone learning SQL.

EXPLANATION:"
	)
}

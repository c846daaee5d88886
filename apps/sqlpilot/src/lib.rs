pub mod console;
pub mod render;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::console::{Console, REPL_HELP, ReplInput, until_interrupt};
use sqlpilot_domain::context;
use sqlpilot_service::{AskOutcome, CancelFlag, SqlPilot};

#[derive(Debug, Parser)]
#[command(
	version = sqlpilot_cli::VERSION,
	rename_all = "kebab",
	styles = sqlpilot_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// Print reports as JSON instead of text.
	#[arg(long, global = true)]
	pub json: bool,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Profile and embed every table into the vector index.
	Index {
		/// Drop and recreate the collection first.
		#[arg(long)]
		force: bool,
		/// Delete the index without rebuilding it.
		#[arg(long, conflicts_with = "force")]
		clear: bool,
	},
	/// Turn a question into SQL, validate it, and run it.
	Ask {
		question: String,
		/// Extra instructions appended to the prompt.
		#[arg(long, value_name = "TEXT")]
		context: Option<String>,
		/// Generate and validate only.
		#[arg(long)]
		dry_run: bool,
		/// Also ask the model to explain the generated query.
		#[arg(long)]
		explain: bool,
		/// Run a suggested correction without asking.
		#[arg(long, short = 'y')]
		yes: bool,
	},
	/// Validate and run a SQL statement.
	Run { sql: String },
	/// Validate a SQL statement without running it.
	Validate { sql: String },
	/// Explain a SQL statement in plain language.
	Explain { sql: String },
	/// Show all tables, or the full description of one.
	Schema { table: Option<String> },
	/// Show the tables retrieval would select for a question.
	Retrieve {
		question: String,
		#[arg(long)]
		top_k: Option<u32>,
		#[arg(long)]
		threshold: Option<f32>,
	},
	/// Show whether the vector index exists and how many tables it holds.
	Status,
	/// Interactive question loop.
	Repl,
}

#[derive(Debug, Clone, Copy)]
struct Output {
	json: bool,
}
impl Output {
	fn emit<T>(&self, value: &T, text: impl FnOnce(&T) -> String) -> color_eyre::Result<()>
	where
		T: Serialize,
	{
		if self.json {
			println!("{}", serde_json::to_string_pretty(value)?);
		} else {
			println!("{}", text(value));
		}

		Ok(())
	}
}

#[derive(Debug)]
struct AskOptions<'a> {
	context: Option<&'a str>,
	dry_run: bool,
	explain: bool,
	yes: bool,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = sqlpilot_config::load(&args.config)?;

	sqlpilot_cli::init_tracing(&config.service.log_level);

	let pilot = SqlPilot::connect(config).await?;
	let out = Output { json: args.json };

	match args.command {
		Command::Index { force, clear } =>
			if clear {
				pilot.clear_index().await?;

				out.emit(&pilot.index_status().await?, render::index_status)
			} else {
				out.emit(&pilot.index_database(force).await?, render::index_stats)
			},
		Command::Ask { question, context, dry_run, explain, yes } => {
			let options = AskOptions { context: context.as_deref(), dry_run, explain, yes };

			ask(&pilot, out, &mut Console::new(), &question, &options).await
		},
		Command::Run { sql } => {
			let report = pilot.execute_sql(&sql).await?;

			out.emit(&report, |report| {
				let validation = render::validation(&report.validation);

				format!("{validation}\n\n{}", render::rows(&report.rows))
			})
		},
		Command::Validate { sql } => out.emit(&pilot.validate(&sql).await, render::validation),
		Command::Explain { sql } =>
			out.emit(&pilot.explain(&sql).await?, |explanation| explanation.explanation.clone()),
		Command::Schema { table } => schema(&pilot, out, table.as_deref()).await,
		Command::Retrieve { question, top_k, threshold } => {
			let hits = pilot.retrieve_with_details(&question, top_k, threshold).await;

			out.emit(&hits, |hits| render::hits(hits))
		},
		Command::Status => out.emit(&pilot.index_status().await?, render::index_status),
		Command::Repl => repl(&pilot, out).await,
	}
}

async fn ask(
	pilot: &SqlPilot,
	out: Output,
	console: &mut Console,
	question: &str,
	options: &AskOptions<'_>,
) -> color_eyre::Result<()> {
	let cancel = CancelFlag::new();
	let watcher = cancel_on_interrupt(cancel.clone());

	if options.dry_run {
		let report = pilot.nl2sql(question, options.context, &cancel).await;

		watcher.abort();

		return out.emit(&report?, |report| {
			[
				render::selection(&report.selection),
				render::generation(&report.generation),
				render::validation(&report.validation),
			]
			.join("\n\n")
		});
	}

	let report = pilot.ask(question, options.context, &cancel).await;

	watcher.abort();

	let report = report?;

	out.emit(&report, render::ask)?;

	if options.explain && !report.generation.sql.is_empty() {
		out.emit(&pilot.explain(&report.generation.sql).await?, |explanation| {
			format!("Explanation:\n{}", explanation.explanation)
		})?;
	}

	let AskOutcome::ExecutionFailed { correction: Some(suggestion), .. } = &report.outcome else {
		return Ok(());
	};
	let runnable = suggestion.correction.corrected
		&& suggestion.validation.as_ref().is_some_and(|outcome| outcome.accepted);

	if !runnable {
		return Ok(());
	}
	if options.yes || console.confirm("Run the corrected query?").await? {
		let executed = pilot.execute_sql(&suggestion.correction.sql).await?;

		out.emit(&executed, |executed| render::rows(&executed.rows))?;
	}

	Ok(())
}

async fn schema(pilot: &SqlPilot, out: Output, table: Option<&str>) -> color_eyre::Result<()> {
	match table {
		Some(table) => {
			let described = pilot.describe_table(table).await?;

			out.emit(&described, context::render_table_block)
		},
		None => out.emit(&pilot.schema_summary().await?, render::schema_summary),
	}
}

async fn repl(pilot: &SqlPilot, out: Output) -> color_eyre::Result<()> {
	let mut console = Console::new();
	let options = AskOptions { context: None, dry_run: false, explain: false, yes: false };

	println!("SQLPilot {}. Type `help` for commands.", sqlpilot_cli::VERSION);

	loop {
		// Ctrl-C handling installed by an earlier question replaces the default exit.
		let read = console.read_line("sqlpilot> ");
		let Some(line) = until_interrupt(read, tokio::signal::ctrl_c()).await else {
			println!();

			break;
		};
		let Some(line) = line? else {
			break;
		};
		let result = match ReplInput::parse(&line) {
			ReplInput::Exit => break,
			ReplInput::Empty => continue,
			ReplInput::Help => {
				println!("{REPL_HELP}");

				continue;
			},
			ReplInput::Schema(table) => schema(pilot, out, table.as_deref()).await,
			ReplInput::Explain(sql) => match pilot.explain(&sql).await {
				Ok(explanation) =>
					out.emit(&explanation, |explanation| explanation.explanation.clone()),
				Err(err) => Err(err.into()),
			},
			ReplInput::Question(question) =>
				ask(pilot, out, &mut console, &question, &options).await,
		};

		// One failed question must not end the session.
		if let Err(err) = result {
			eprintln!("Error: {err}");
		}
	}

	Ok(())
}

/// Sets `cancel` on Ctrl-C. The running stage still completes.
fn cancel_on_interrupt(cancel: CancelFlag) -> JoinHandle<()> {
	tokio::spawn(async move {
		if tokio::signal::ctrl_c().await.is_ok() {
			tracing::warn!("Interrupt received. Stopping after the current stage.");

			cancel.cancel();
		}
	})
}

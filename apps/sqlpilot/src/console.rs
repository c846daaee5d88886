use std::{future::Future, io::Write};

use tokio::io::{self, AsyncBufReadExt, BufReader, Lines, Stdin};

/// Line-oriented stdin shared by confirmations and the interactive loop.
pub struct Console {
	lines: Lines<BufReader<Stdin>>,
}
impl Console {
	pub fn new() -> Self {
		Self { lines: BufReader::new(io::stdin()).lines() }
	}

	/// Prints `prompt` and reads one line. `None` at end of input.
	pub async fn read_line(&mut self, prompt: &str) -> color_eyre::Result<Option<String>> {
		let mut stdout = std::io::stdout();

		write!(stdout, "{prompt}")?;
		stdout.flush()?;

		Ok(self.lines.next_line().await?)
	}

	pub async fn confirm(&mut self, question: &str) -> color_eyre::Result<bool> {
		let prompt = format!("{question} [y/N] ");
		let answer = until_interrupt(self.read_line(&prompt), tokio::signal::ctrl_c())
			.await
			.transpose()?
			.flatten();

		Ok(answer.map(|line| is_yes(&line)).unwrap_or(false))
	}
}
impl Default for Console {
	fn default() -> Self {
		Self::new()
	}
}

/// One line typed at the interactive prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplInput {
	Exit,
	Empty,
	Help,
	Schema(Option<String>),
	Explain(String),
	Question(String),
}
impl ReplInput {
	pub fn parse(line: &str) -> Self {
		let line = line.trim();
		let (head, rest) = match line.split_once(char::is_whitespace) {
			Some((head, rest)) => (head, rest.trim()),
			None => (line, ""),
		};

		match head.to_ascii_lowercase().as_str() {
			"" => Self::Empty,
			"exit" | "quit" | r"\q" => Self::Exit,
			"help" | "?" => Self::Help,
			"schema" if rest.is_empty() => Self::Schema(None),
			"schema" if !rest.contains(char::is_whitespace) => Self::Schema(Some(rest.to_string())),
			"explain" if !rest.is_empty() => Self::Explain(rest.to_string()),
			_ => Self::Question(line.to_string()),
		}
	}
}

pub const REPL_HELP: &str = "\
Type a question to generate and run SQL.
  schema [table]   Show all tables or one table.
  explain <sql>    Explain a SQL query.
  exit             Leave. Ctrl-C at the prompt also leaves.";

/// Resolves `read` unless `interrupt` completes first, which yields `None`.
///
/// A failed interrupt listener is ignored and the read continues.
pub async fn until_interrupt<T>(
	read: impl Future<Output = T>,
	interrupt: impl Future<Output = std::io::Result<()>>,
) -> Option<T> {
	tokio::select! {
		biased;
		Ok(()) = interrupt => None,
		value = read => Some(value),
	}
}

fn is_yes(answer: &str) -> bool {
	matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

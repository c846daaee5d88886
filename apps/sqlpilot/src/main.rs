use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = sqlpilot::Args::parse();

	sqlpilot::run(args).await
}

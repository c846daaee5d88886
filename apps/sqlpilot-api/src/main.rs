use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = sqlpilot_api::Args::parse();

	sqlpilot_api::run(args).await
}

use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = loglark_api::Args::parse();

	loglark_api::run(args).await
}

use clap::Parser;
use hrlink_cli::{cli::Cli, commands, logging};

#[tokio::main]
async fn main() {
	// .env is optional; real environment variables win
	dotenvy::dotenv().ok();

	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	if let Err(err) = commands::dispatch(cli).await {
		// Failed sessions were already rendered through the shell view
		if !err.is_output_already_printed() {
			eprintln!("error: {err:#}");
		}
		std::process::exit(1);
	}
}

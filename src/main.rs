mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use mediagate::config::Config;
use mediagate::countdown::{self, SystemClock};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    mediagate::observability::init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Server(args) => {
            let mut config = Config::load()?;
            if let Some(address) = args.address {
                config.server.bind_addr = address;
            }
            mediagate::api::run(config).await?
        }
        Commands::Countdown(args) => {
            let result = countdown::compute(&args.slug, &SystemClock)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}

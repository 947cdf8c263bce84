use aqi_wildfire_processor::cli::{run, Cli};
use aqi_wildfire_processor::error::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    run(cli).await
}

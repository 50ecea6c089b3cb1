use clap::Parser;
use ghcnd_analyzer::cli::{run, Cli};
use ghcnd_analyzer::error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    run(cli).await
}

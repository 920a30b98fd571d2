use anyhow::Result;
use clap::Parser;
use climap::cli::{self, Cli};
use climap::logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init_logging(cli.verbose, cli.quiet);

    cli::execute(cli).await
}

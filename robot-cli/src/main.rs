//! robot - build robot command-line client

use anyhow::Result;
use clap::Parser;
use robot_cli::cli::{self, Cli};
use robot_cli::logging;
use robot_common::config::ConfigResolver;
use tracing::{debug, info};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    logging::init(args.verbose);

    info!("{}", logging::build_banner());

    let config = ConfigResolver::new().resolve(args.server.as_deref());
    debug!("Using server {}", config.server);

    cli::run(args.command, &config).await
}

//! promptbandit CLI entry point.

use anyhow::Result;
use clap::Parser;

use promptbandit::cli::{Cli, Commands};
use promptbandit::infrastructure::config::ConfigLoader;
use promptbandit::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json_mode = cli.json;

    if let Err(err) = run(cli).await {
        promptbandit::cli::handle_error(err, json_mode);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };
    if let Some(level) = cli.log_level {
        config.logging.level = level;
        ConfigLoader::validate(&config)?;
    }

    let _logger = LoggerImpl::init(&LogConfig::try_from(&config.logging)?)?;

    match cli.command {
        Commands::Simulate(args) => {
            promptbandit::cli::commands::simulate::execute(args, &config, cli.json).await
        }
        Commands::Compare(args) => {
            promptbandit::cli::commands::compare::execute(args, &config, cli.json).await
        }
    }
}

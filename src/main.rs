use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use living_cost::{config, init_tracing};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    // Validation reports load errors itself instead of failing before dispatch
    if let cli::Commands::Config {
        action: cli::ConfigCommands::Validate,
    } = &args.command
    {
        return commands::config::validate(&args.config);
    }

    let cfg = config::load_config(&args.config)?;
    init_tracing(&cfg.logging);

    match args.command {
        cli::Commands::Calculate(calc) => commands::calculate::execute(&cfg, calc).await?,
        cli::Commands::History(history) => commands::history::execute(&cfg, history).await?,
        cli::Commands::Config { action } => match action {
            cli::ConfigCommands::Show => commands::config::show(&cfg)?,
            cli::ConfigCommands::Validate => commands::config::validate(&args.config)?,
        },
    }

    Ok(())
}

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { force } => commands::init::run(force),
        Commands::Assign(args) => commands::assign::run(&args),
        Commands::Status { at } => commands::status::run(at),
        Commands::Check => commands::check::run(),
        Commands::Reset => commands::reset::run(),
        Commands::History { stats, limit } => commands::history::run(stats, limit),
        Commands::Version => commands::version::run(),
    }
}

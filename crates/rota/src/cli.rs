use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "rota")]
#[command(version)]
#[command(about = "Skill-aware work assignment for staffed rosters")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a starter config and empty roster to the data directory
    Init {
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },

    /// Assign one request to the least-loaded eligible worker
    Assign(AssignArgs),

    /// Show per-worker load
    Status {
        /// Evaluate at this instant (RFC 3339) instead of now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },

    /// Validate config and roster
    Check,

    /// Zero all assignment counters
    Reset,

    /// View usage history
    History {
        /// Show statistics summary
        #[arg(long)]
        stats: bool,

        /// Number of recent records to list
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Print version information
    Version,
}

#[derive(Args, Debug, Clone)]
pub struct AssignArgs {
    #[arg(short, long)]
    pub skill: String,

    #[arg(short, long)]
    pub modality: String,

    /// Only the exact (skill, modality) strict pool, no fallback
    #[arg(long)]
    pub strict: bool,

    /// Request code for the weight multiplier table
    #[arg(long)]
    pub code: Option<String>,

    /// Special task remapping the request
    #[arg(long)]
    pub task: Option<String>,

    /// Request time (RFC 3339), defaults to now
    #[arg(long)]
    pub at: Option<DateTime<Utc>>,
}

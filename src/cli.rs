use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser, Debug)]
#[command(author, version, about = "shuttle-ranking: badminton session ratings and stats")]
pub struct Cli {
    /// Command
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
#[clap(rename_all = "lower_case")]
pub enum Command {
    /// Start the backend server
    Serve {
        /// Port number (optional, defaults to 3000)
        #[arg(short, long, default_value_t = 3000)]
        port: u16,
    },
    /// Create the database schema
    Setup {
        /// Drop all tables first
        #[arg(long)]
        reset: bool,
    },
    /// Rebuild a group's ratings from its game history
    Recalculate {
        /// Group id
        group: String,
    },
    /// Print a group's leaderboard
    Leaderboard {
        /// Group id
        group: String,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print one player's detailed stats
    Stats {
        /// Group id
        group: String,
        /// Group player id
        player: String,
        /// Print JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

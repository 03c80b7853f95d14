use anyhow::Result;

use shuttle_ranking::cli::Command;
use shuttle_ranking::{
    handle_completions, handle_leaderboard, handle_recalculate, handle_serve, handle_setup,
    handle_stats, interpret,
};

fn main() {
    setup_logging();
    parse_and_execute().unwrap_or_else(|e| {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    });
}

fn setup_logging() {
    sensible_env_logger::init!();
}

fn parse_and_execute() -> Result<()> {
    let command = interpret();
    execute_command(&command)
}

fn execute_command(command: &Command) -> Result<()> {
    match command {
        Command::Serve { port } => handle_serve(*port),
        Command::Setup { reset } => handle_setup(*reset),
        Command::Recalculate { group } => handle_recalculate(group),
        Command::Leaderboard { group, json } => handle_leaderboard(group, *json),
        Command::Stats { group, player, json } => handle_stats(group, player, *json),
        Command::Completions { shell } => handle_completions(*shell),
    }
}

pub mod api;
pub mod cli;
pub mod config;
pub mod database;
pub mod domain;
pub mod rating;
pub mod report;
pub mod services;

use anyhow::{bail, Result};
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use cli::Cli;
use log::info;

use crate::cli::Command;
use crate::config::settings::AppConfig;
use crate::database::DbConn;
use crate::services::outcome::OutcomeProcessor;
use crate::services::recalculation::RecalculationService;
use crate::services::server::ServerService;
use crate::services::statistics::StatsService;

pub fn interpret() -> Command {
    let cli = Cli::parse();
    cli.command
}

fn open_database(config: &AppConfig) -> Result<DbConn> {
    let pool = database::create_pool(&config.server.database_path)?;
    database::get_connection(&pool)
}

pub fn handle_serve(port: u16) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let config = AppConfig::new();
        let service = ServerService::new(port, config);
        service.run().await
    })
}

pub fn handle_setup(reset: bool) -> Result<()> {
    let config = AppConfig::new();
    let mut conn = open_database(&config)?;
    if reset {
        database::setup::reset_database(&mut conn)?;
    } else {
        database::setup::init_schema(&mut conn)?;
    }
    info!("Database ready at {}", config.server.database_path);
    Ok(())
}

pub fn handle_recalculate(group_id: &str) -> Result<()> {
    let config = AppConfig::new();
    let mut conn = open_database(&config)?;
    if database::groups::find_by_id(&mut conn, group_id)?.is_none() {
        bail!("Group {} not found", group_id);
    }

    let service = RecalculationService::new(OutcomeProcessor::new(config.rating));
    let summary = service.recalculate_group(&mut conn, group_id)?;
    println!(
        "Replayed {} games ({} skipped, {} failed updates) for {} players",
        summary.games_replayed, summary.games_skipped, summary.failed_updates, summary.players_reset
    );
    Ok(())
}

pub fn handle_leaderboard(group_id: &str, json: bool) -> Result<()> {
    let config = AppConfig::new();
    let mut conn = open_database(&config)?;

    let entries = StatsService::new(config.stats).get_leaderboard(&mut conn, group_id)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        println!("{}", report::leaderboard_table(&entries));
    }
    Ok(())
}

pub fn handle_stats(group_id: &str, player_id: &str, json: bool) -> Result<()> {
    let config = AppConfig::new();
    let mut conn = open_database(&config)?;

    let Some(stats) =
        StatsService::new(config.stats).get_player_detailed_stats(&mut conn, group_id, player_id)?
    else {
        bail!("Player {} not found in group {}", player_id, group_id);
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("{}", report::player_summary(&stats));
    }
    Ok(())
}

pub fn handle_completions(shell: Shell) -> Result<()> {
    let mut command = Cli::command();
    let name = command.get_name().to_string();
    clap_complete::generate(shell, &mut command, name, &mut std::io::stdout());
    Ok(())
}

use std::collections::HashSet;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::Utc;
use log::{error, info, warn};
use serde::Deserialize;
use thiserror::Error;

use super::outcome::OutcomeProcessor;
use super::recalculation::RecalculationService;
use crate::config::AppConfig;
use crate::database::{self, DbConn, NewGameRow};
use crate::domain::{GameMode, GameRecord, IdentityMap, Side, Team};

/// Caller mistakes, told apart from storage failures so the API can answer 4xx.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("Session {0} not found")]
    SessionNotFound(String),
    #[error("{0}")]
    Invalid(String),
}

/// Winner and score of a game. `winning_team = None` means not played yet.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResult {
    pub winning_team: Option<Side>,
    pub team_a_score: Option<i32>,
    pub team_b_score: Option<i32>,
}

impl GameResult {
    pub fn won_by(side: Side, team_a_score: Option<i32>, team_b_score: Option<i32>) -> Self {
        Self {
            winning_team: Some(side),
            team_a_score,
            team_b_score,
        }
    }

    fn validate(&self) -> Result<(), GameError> {
        for score in [self.team_a_score, self.team_b_score].into_iter().flatten() {
            if score < 0 {
                return Err(GameError::Invalid("Scores cannot be negative".into()));
            }
        }

        if let (Some(winner), Some(a), Some(b)) =
            (self.winning_team, self.team_a_score, self.team_b_score)
        {
            let (winner_score, loser_score) = match winner {
                Side::A => (a, b),
                Side::B => (b, a),
            };
            if winner_score < loser_score {
                return Err(GameError::Invalid(format!(
                    "Team {} cannot win with fewer points ({} - {})",
                    winner, a, b
                )));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGame {
    pub team_a: Vec<String>,
    pub team_b: Vec<String>,
    #[serde(flatten)]
    pub result: GameResult,
}

/// Records, corrects and deletes games, keeping group ratings in step.
///
/// A result is applied forward only when a game first goes from unplayed to
/// played. Any later edit or delete takes the old counters back and, unless
/// disabled, rebuilds the group from its history.
#[derive(Debug, Clone)]
pub struct GameService {
    processor: OutcomeProcessor,
    recalculation: RecalculationService,
    recalculate_on_correction: bool,
}

impl GameService {
    pub fn new(config: &AppConfig) -> Self {
        let processor = OutcomeProcessor::new(config.rating.clone());
        Self {
            recalculation: RecalculationService::new(processor.clone()),
            processor,
            recalculate_on_correction: config.stats.recalculate_on_correction,
        }
    }

    pub fn record_game(&self, conn: &mut DbConn, session_id: &str, new_game: NewGame) -> Result<GameRecord> {
        let session = database::sessions::find_by_id(conn, session_id)?
            .ok_or_else(|| GameError::SessionNotFound(session_id.to_string()))?;
        let mode = GameMode::from_str(&session.game_mode)?;

        let team_a = Team::from_ids(&new_game.team_a)
            .map_err(|e| GameError::Invalid(format!("Invalid team A: {:#}", e)))?;
        let team_b = Team::from_ids(&new_game.team_b)
            .map_err(|e| GameError::Invalid(format!("Invalid team B: {:#}", e)))?;
        if team_a.mode() != mode || team_b.mode() != mode {
            return Err(GameError::Invalid(format!(
                "A {} game needs {} player(s) per team",
                mode.as_str(),
                mode.team_size()
            ))
            .into());
        }
        if let Some(both) = team_a.members().into_iter().find(|p| team_b.contains(p)) {
            return Err(GameError::Invalid(format!("Player {} cannot play on both teams", both)).into());
        }

        let roster: HashSet<String> = database::players::list_by_session(conn, session_id)?
            .into_iter()
            .map(|p| p.id)
            .collect();
        for member in team_a.members().into_iter().chain(team_b.members()) {
            if !roster.contains(member) {
                return Err(GameError::Invalid(format!(
                    "Player {} is not part of session {}",
                    member, session_id
                ))
                .into());
            }
        }
        new_game.result.validate()?;

        let game_number = database::games::next_game_number(conn, session_id)?;
        let id = format!("{}-game-{}", session_id, game_number);
        let winning_team = new_game.result.winning_team.map(|s| s.as_str());
        let row = database::games::insert_game(
            conn,
            &NewGameRow {
                id: &id,
                session_id,
                game_number,
                team_a: &team_a.to_ids(),
                team_b: &team_b.to_ids(),
                winning_team,
                team_a_score: new_game.result.team_a_score,
                team_b_score: new_game.result.team_b_score,
                created_at: Utc::now().naive_utc(),
            },
        )?;
        let game = GameRecord::try_from(row)?;
        info!("Recorded game {} in session {}", game.id, session_id);

        if let (Some(_), Some(winner)) = (&session.group_id, game.winning_team) {
            self.apply_forward(conn, &game, winner);
        }

        Ok(game)
    }

    /// Sets or corrects a game's result. Returns `None` when the session or game does not exist.
    pub fn set_result(
        &self,
        conn: &mut DbConn,
        session_id: &str,
        game_id: &str,
        result: GameResult,
    ) -> Result<Option<GameRecord>> {
        let Some(session) = database::sessions::find_by_id(conn, session_id)? else {
            return Ok(None);
        };
        let Some(row) = database::games::find_by_id(conn, session_id, game_id)? else {
            return Ok(None);
        };
        let previous = GameRecord::try_from(row)?;
        result.validate()?;

        database::games::update_result(
            conn,
            session_id,
            game_id,
            result.winning_team.map(|s| s.as_str()),
            result.team_a_score,
            result.team_b_score,
            Utc::now().naive_utc(),
        )?;
        let updated = GameRecord {
            winning_team: result.winning_team,
            team_a_score: result.team_a_score,
            team_b_score: result.team_b_score,
            ..previous.clone()
        };

        let Some(group_id) = session.group_id.as_deref() else {
            return Ok(Some(updated));
        };

        match (previous.winning_team, updated.winning_team) {
            (None, Some(winner)) => self.apply_forward(conn, &updated, winner),
            (Some(old), new) if Some(old) != new => {
                self.reverse(conn, &previous, old);
                self.rebuild_or_apply(conn, group_id, &updated)?;
            }
            _ => {}
        }

        Ok(Some(updated))
    }

    /// Deletes a game, taking back its counters first. Returns false when it did not exist.
    pub fn delete_game(&self, conn: &mut DbConn, session_id: &str, game_id: &str) -> Result<bool> {
        let Some(session) = database::sessions::find_by_id(conn, session_id)? else {
            return Ok(false);
        };
        let Some(row) = database::games::find_by_id(conn, session_id, game_id)? else {
            return Ok(false);
        };
        let game = GameRecord::try_from(row)?;

        let group_id = session.group_id.as_deref();
        if let (Some(_), Some(winner)) = (group_id, game.winning_team) {
            self.reverse(conn, &game, winner);
        }

        let deleted = database::games::delete_game(conn, session_id, game_id)?;
        info!("Deleted game {} from session {}", game_id, session_id);

        if let (Some(group_id), Some(_)) = (group_id, game.winning_team) {
            if self.recalculate_on_correction {
                self.recalculation.recalculate_group(conn, group_id)?;
            }
        }

        Ok(deleted)
    }

    fn rebuild_or_apply(&self, conn: &mut DbConn, group_id: &str, game: &GameRecord) -> Result<()> {
        if self.recalculate_on_correction {
            self.recalculation.recalculate_group(conn, group_id)?;
        } else if let Some(winner) = game.winning_team {
            self.apply_forward(conn, game, winner);
        }
        Ok(())
    }

    /// Rating failures are logged; the game itself stays saved.
    fn apply_forward(&self, conn: &mut DbConn, game: &GameRecord, winner: Side) {
        let result = session_identities(conn, &game.session_id)
            .and_then(|identities| identities.resolve_game(game))
            .and_then(|(team_a, team_b)| {
                self.processor.process_game_result(conn, &team_a, &team_b, winner)
            });

        match result {
            Ok(updates) => {
                let failed = updates.iter().filter(|u| u.is_err()).count();
                if failed > 0 {
                    warn!("Game {}: {} of {} rating updates failed", game.id, failed, updates.len());
                }
            }
            Err(e) => error!("Error updating ratings for game {}: {:#}", game.id, e),
        }
    }

    fn reverse(&self, conn: &mut DbConn, game: &GameRecord, previous_winner: Side) {
        let teams = session_identities(conn, &game.session_id)
            .and_then(|identities| identities.resolve_game(game));
        let (team_a, team_b) = match teams {
            Ok(teams) => teams,
            Err(e) => {
                error!("Error reversing stats for game {}: {:#}", game.id, e);
                return;
            }
        };

        self.processor
            .reverse_game_result(conn, &team_a, &team_b, previous_winner);
    }
}

fn session_identities(conn: &mut DbConn, session_id: &str) -> Result<IdentityMap> {
    let players = database::players::list_by_session(conn, session_id)
        .context("Failed to fetch player mappings")?;
    Ok(IdentityMap::from_session_players(&players))
}

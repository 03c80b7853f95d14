use anyhow::{Context, Result};
use log::{info, warn};
use serde::Serialize;

use super::outcome::OutcomeProcessor;
use crate::database::{self, DbConn};
use crate::domain::{GameRecord, IdentityMap};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecalculationSummary {
    pub players_reset: usize,
    pub games_replayed: usize,
    pub games_skipped: usize,
    pub failed_updates: usize,
}

/// Rebuilds a group's ratings and counters by replaying its history.
///
/// Must not run concurrently with result submissions for the same group;
/// callers serialize it.
#[derive(Debug, Clone)]
pub struct RecalculationService {
    processor: OutcomeProcessor,
}

impl RecalculationService {
    pub fn new(processor: OutcomeProcessor) -> Self {
        Self { processor }
    }

    pub fn recalculate_group(&self, conn: &mut DbConn, group_id: &str) -> Result<RecalculationSummary> {
        info!("=== Recalculating ratings for group {} ===", group_id);

        let mut summary = RecalculationSummary {
            players_reset: self.reset_players(conn, group_id)?,
            ..Default::default()
        };
        info!("  → Reset {} players", summary.players_reset);

        let session_ids = self.load_session_ids(conn, group_id)?;
        if session_ids.is_empty() {
            info!("  → No sessions, nothing to replay");
            return Ok(summary);
        }

        let games = database::games::list_recorded_by_sessions(conn, &session_ids)?;
        let players = database::players::list_by_sessions(conn, &session_ids)?;
        let identities = IdentityMap::from_session_players(&players);
        info!(
            "  → Replaying {} games across {} sessions ({} linked players)",
            games.len(),
            session_ids.len(),
            identities.linked_count()
        );

        for row in games {
            let game_id = row.id.clone();
            let game = match GameRecord::try_from(row) {
                Ok(game) => game,
                Err(e) => {
                    warn!("Skipping malformed game {}: {:#}", game_id, e);
                    summary.games_skipped += 1;
                    continue;
                }
            };
            self.replay_game(conn, &game, &identities, &mut summary)?;
        }

        info!(
            "=== Recalculation complete: {} replayed, {} skipped, {} failed updates ===",
            summary.games_replayed, summary.games_skipped, summary.failed_updates
        );
        Ok(summary)
    }

    fn reset_players(&self, conn: &mut DbConn, group_id: &str) -> Result<usize> {
        let default_rating = self.processor.settings().default_rating;
        database::group_players::reset_group(conn, group_id, default_rating)
    }

    fn load_session_ids(&self, conn: &mut DbConn, group_id: &str) -> Result<Vec<String>> {
        let sessions = database::sessions::list_by_group(conn, group_id)?;
        Ok(sessions.into_iter().map(|s| s.id).collect())
    }

    fn replay_game(
        &self,
        conn: &mut DbConn,
        game: &GameRecord,
        identities: &IdentityMap,
        summary: &mut RecalculationSummary,
    ) -> Result<()> {
        let Some(winning_team) = game.winning_team else {
            summary.games_skipped += 1;
            return Ok(());
        };

        let (team_a, team_b) = match identities.resolve_game(game) {
            Ok(teams) => teams,
            Err(e) => {
                warn!("Skipping game: {:#}", e);
                summary.games_skipped += 1;
                return Ok(());
            }
        };
        if team_a.iter().chain(&team_b).all(Option::is_none) {
            summary.games_skipped += 1;
            return Ok(());
        }

        let results = self
            .processor
            .process_game_result(conn, &team_a, &team_b, winning_team)
            .with_context(|| format!("Failed to replay game {}", game.id))?;

        summary.games_replayed += 1;
        summary.failed_updates += results.iter().filter(|r| r.is_err()).count();
        Ok(())
    }
}

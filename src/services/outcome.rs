use std::collections::HashMap;

use anyhow::{anyhow, Result};
use log::{debug, error};

use crate::config::settings::RatingSettings;
use crate::database::{self, DbConn, OutcomeWrite};
use crate::domain::{GroupPlayerId, Side};
use crate::rating::{self, CounterReversal, FailedUpdate, RatingUpdate, ReversalResult, UpdateResult};

/// Applies one game's result to the durable ratings and win/loss counters.
///
/// Writes are best effort: every player is written on its own, a failed
/// write is logged and reported in the returned collection, and the
/// players already written are not rolled back.
#[derive(Debug, Clone)]
pub struct OutcomeProcessor {
    config: RatingSettings,
}

impl OutcomeProcessor {
    pub fn new(config: RatingSettings) -> Self {
        Self { config }
    }

    pub fn settings(&self) -> &RatingSettings {
        &self.config
    }

    pub fn process_game_result(
        &self,
        conn: &mut DbConn,
        team_a: &[Option<GroupPlayerId>],
        team_b: &[Option<GroupPlayerId>],
        winning_team: Side,
    ) -> Result<Vec<UpdateResult>> {
        let team_a = linked_only(team_a);
        let team_b = linked_only(team_b);

        if team_a.is_empty() && team_b.is_empty() {
            debug!("No linked players in game, skipping rating update");
            return Ok(Vec::new());
        }

        let all_ids: Vec<GroupPlayerId> = team_a.iter().chain(&team_b).cloned().collect();
        let current = database::group_players::fetch_ratings(conn, &all_ids)?;

        let team_a = self.with_ratings(team_a, &current);
        let team_b = self.with_ratings(team_b, &current);
        let updates = self.plan_updates(&team_a, &team_b, winning_team);

        Ok(updates
            .into_iter()
            .map(|update| self.persist(conn, update))
            .collect())
    }

    /// Computes every player's new rating from the pre-game ratings, without writing.
    pub fn plan_updates(
        &self,
        team_a: &[(GroupPlayerId, i32)],
        team_b: &[(GroupPlayerId, i32)],
        winning_team: Side,
    ) -> Vec<RatingUpdate> {
        let a_rating = self.average(team_a);
        let b_rating = self.average(team_b);

        let mut updates = self.plan_side(team_a, Side::A, a_rating, b_rating, winning_team);
        updates.extend(self.plan_side(team_b, Side::B, b_rating, a_rating, winning_team));
        updates
    }

    fn plan_side(
        &self,
        players: &[(GroupPlayerId, i32)],
        side: Side,
        own_team: f64,
        opponent_team: f64,
        winning_team: Side,
    ) -> Vec<RatingUpdate> {
        let won = side == winning_team;
        let delta = rating::team_delta(own_team, opponent_team, won, &self.config);

        players
            .iter()
            .map(|(id, old_rating)| RatingUpdate {
                group_player_id: id.clone(),
                side,
                old_rating: *old_rating,
                new_rating: rating::personal_rating(*old_rating, delta, &self.config),
                won,
            })
            .collect()
    }

    fn average(&self, players: &[(GroupPlayerId, i32)]) -> f64 {
        let ratings: Vec<i32> = players.iter().map(|(_, r)| *r).collect();
        rating::team_rating(&ratings, &self.config)
    }

    fn with_ratings(
        &self,
        ids: Vec<GroupPlayerId>,
        current: &HashMap<String, i32>,
    ) -> Vec<(GroupPlayerId, i32)> {
        ids.into_iter()
            .map(|id| {
                let rating = current
                    .get(&id)
                    .copied()
                    .unwrap_or(self.config.default_rating);
                (id, rating)
            })
            .collect()
    }

    fn persist(&self, conn: &mut DbConn, update: RatingUpdate) -> UpdateResult {
        let write = OutcomeWrite {
            elo_rating: update.new_rating,
            won: update.won,
        };

        match database::group_players::apply_outcome(conn, &update.group_player_id, write) {
            Ok(true) => Ok(update),
            Ok(false) => {
                error!("Group player {} not found, rating not saved", update.group_player_id);
                Err(FailedUpdate::new(
                    &update.group_player_id,
                    anyhow!("Group player not found"),
                ))
            }
            Err(e) => {
                error!("Error updating rating/stats for {}: {:#}", update.group_player_id, e);
                Err(FailedUpdate::new(&update.group_player_id, e))
            }
        }
    }

    /// Takes back the win or loss each player was credited for a game.
    ///
    /// Ratings are left as they are: the delta depended on team averages at
    /// the time, so only a full recalculation can correct them.
    pub fn reverse_game_result(
        &self,
        conn: &mut DbConn,
        team_a: &[Option<GroupPlayerId>],
        team_b: &[Option<GroupPlayerId>],
        previous_winning_team: Side,
    ) -> Vec<ReversalResult> {
        let mut results = Vec::new();

        for (side, team) in [(Side::A, team_a), (Side::B, team_b)] {
            let was_win = side == previous_winning_team;
            for id in linked_only(team) {
                match database::group_players::revert_outcome(conn, &id, was_win) {
                    Ok(true) => results.push(Ok(CounterReversal {
                        group_player_id: id,
                        side,
                        was_win,
                    })),
                    Ok(false) => debug!("Group player {} not found, nothing to reverse", id),
                    Err(e) => {
                        error!("Error reversing stats for {}: {:#}", id, e);
                        results.push(Err(FailedUpdate::new(&id, e)));
                    }
                }
            }
        }

        results
    }
}

fn linked_only(team: &[Option<GroupPlayerId>]) -> Vec<GroupPlayerId> {
    team.iter().flatten().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fixtures::*;

    fn processor() -> OutcomeProcessor {
        OutcomeProcessor::new(RatingSettings::default())
    }

    #[test]
    fn test_doubles_between_equal_players() {
        let mut conn = memory_conn();
        seed_group(&mut conn, "g1", &["alice", "bob", "carol", "dave"]);

        let results = processor()
            .process_game_result(
                &mut conn,
                &linked(&["alice", "bob"]),
                &linked(&["carol", "dave"]),
                Side::A,
            )
            .unwrap();

        assert_eq!(results.len(), 4);
        assert!(results.iter().all(|r| r.is_ok()));

        let alice = group_player(&mut conn, "alice");
        let bob = group_player(&mut conn, "bob");
        let carol = group_player(&mut conn, "carol");
        let dave = group_player(&mut conn, "dave");

        let gain = alice.elo_rating - 1500;
        assert!(gain > 0);
        assert_eq!(bob.elo_rating - 1500, gain);
        assert_eq!(1500 - carol.elo_rating, gain);
        assert_eq!(1500 - dave.elo_rating, gain);

        assert_eq!((alice.wins, alice.losses, alice.total_games), (1, 0, 1));
        assert_eq!((carol.wins, carol.losses, carol.total_games), (0, 1, 1));
    }

    #[test]
    fn test_teammates_with_different_ratings_share_the_delta() {
        let config = RatingSettings::default();
        let updates = processor().plan_updates(
            &[("alice".into(), 1400), ("bob".into(), 1600)],
            &[("carol".into(), 1500), ("dave".into(), 1500)],
            Side::A,
        );

        let expected_delta = rating::updated_rating(1500.0, 1500.0, true, &config) - 1500;
        assert_eq!(updates[0].change(), expected_delta);
        assert_eq!(updates[1].change(), expected_delta);
        assert_eq!(updates[0].new_rating, 1400 + expected_delta);
        assert_eq!(updates[1].new_rating, 1600 + expected_delta);
        assert!(updates[2].change() < 0);
        assert!(!updates[3].won);
    }

    #[test]
    fn test_guest_only_game_changes_nothing() {
        let mut conn = memory_conn();
        seed_group(&mut conn, "g1", &["alice"]);

        let results = processor()
            .process_game_result(&mut conn, &[None, None], &[None, None], Side::B)
            .unwrap();

        assert!(results.is_empty());
        let alice = group_player(&mut conn, "alice");
        assert_eq!((alice.elo_rating, alice.total_games), (1500, 0));
    }

    #[test]
    fn test_guests_are_dropped_from_team_average() {
        let mut conn = memory_conn();
        seed_group(&mut conn, "g1", &["alice", "bob"]);

        let results = processor()
            .process_game_result(
                &mut conn,
                &[Some("alice".into()), None],
                &[None, Some("bob".into())],
                Side::B,
            )
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(group_player(&mut conn, "alice").elo_rating, 1484);
        assert_eq!(group_player(&mut conn, "bob").elo_rating, 1516);
    }

    #[test]
    fn test_failed_write_does_not_roll_back_peers() {
        let mut conn = memory_conn();
        seed_group(&mut conn, "g1", &["alice", "bob", "carol", "dave"]);
        break_writes_for(&mut conn, "carol");

        let results = processor()
            .process_game_result(
                &mut conn,
                &linked(&["alice", "bob"]),
                &linked(&["carol", "dave"]),
                Side::A,
            )
            .unwrap();

        let failed: Vec<&str> = results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .map(|f| f.group_player_id.as_str())
            .collect();
        assert_eq!(failed, vec!["carol"]);

        assert_eq!(group_player(&mut conn, "alice").total_games, 1);
        assert_eq!(group_player(&mut conn, "dave").total_games, 1);
        let carol = group_player(&mut conn, "carol");
        assert_eq!((carol.elo_rating, carol.total_games), (1500, 0));
    }

    #[test]
    fn test_missing_player_row_reports_failure() {
        let mut conn = memory_conn();
        seed_group(&mut conn, "g1", &["alice"]);

        let results = processor()
            .process_game_result(&mut conn, &linked(&["alice"]), &linked(&["ghost"]), Side::A)
            .unwrap();

        assert!(results[0].is_ok());
        assert_eq!(results[1].as_ref().unwrap_err().group_player_id, "ghost");
        // the missing player rated as the default, so alice gained half of K
        assert_eq!(group_player(&mut conn, "alice").elo_rating, 1516);
    }

    #[test]
    fn test_reversal_restores_counters_but_not_rating() {
        let mut conn = memory_conn();
        seed_group(&mut conn, "g1", &["alice", "bob"]);
        let processor = processor();

        processor
            .process_game_result(&mut conn, &linked(&["alice"]), &linked(&["bob"]), Side::A)
            .unwrap();
        let reversed =
            processor.reverse_game_result(&mut conn, &linked(&["alice"]), &linked(&["bob"]), Side::A);

        assert_eq!(reversed.len(), 2);
        let alice = group_player(&mut conn, "alice");
        let bob = group_player(&mut conn, "bob");
        assert_eq!((alice.wins, alice.losses, alice.total_games), (0, 0, 0));
        assert_eq!((bob.wins, bob.losses, bob.total_games), (0, 0, 0));
        assert_eq!(alice.elo_rating, 1516);
        assert_eq!(bob.elo_rating, 1484);
    }

    #[test]
    fn test_reversal_clamps_at_zero_and_keeps_total_consistent() {
        let mut conn = memory_conn();
        seed_group(&mut conn, "g1", &["alice", "bob"]);
        let processor = processor();

        processor
            .process_game_result(&mut conn, &linked(&["alice"]), &linked(&["bob"]), Side::B)
            .unwrap();
        // alice lost, but a win is reversed
        processor.reverse_game_result(&mut conn, &linked(&["alice"]), &[], Side::A);

        let alice = group_player(&mut conn, "alice");
        assert_eq!((alice.wins, alice.losses), (0, 1));
        assert_eq!(alice.total_games, alice.wins + alice.losses);
    }

    #[test]
    fn test_reversal_skips_unknown_and_guest_players() {
        let mut conn = memory_conn();
        seed_group(&mut conn, "g1", &["alice"]);

        let reversed = processor().reverse_game_result(
            &mut conn,
            &[None],
            &linked(&["ghost"]),
            Side::A,
        );

        assert!(reversed.is_empty());
    }
}

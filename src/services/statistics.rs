use std::cmp::{Ordering, Reverse};
use std::collections::HashMap;

use anyhow::Result;
use log::{debug, warn};

use crate::config::settings::StatsSettings;
use crate::database::{self, DbConn, GroupPlayer};
use crate::domain::stats::win_rate;
use crate::domain::{
    GameRecord, GroupOverview, GroupPlayerId, IdentityMap, LeaderboardEntry, OpponentStats,
    Outcome, PartnerStats, PlayerDetailedStats, PlayerHighlight, Side, Trend,
};

/// One recorded game seen from a single group player's side of the net.
#[derive(Debug, Clone)]
struct PlayerGame {
    won: bool,
    scored: i32,
    conceded: i32,
    partners: Vec<GroupPlayerId>,
    opponents: Vec<GroupPlayerId>,
}

#[derive(Debug, Default, Clone, Copy)]
struct Record {
    games: i32,
    wins: i32,
    losses: i32,
}

impl Record {
    fn add(&mut self, won: bool) {
        self.games += 1;
        if won {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
    }
}

/// Snapshot of a group's players and resolved game history, loaded once per request.
struct GroupHistory {
    players: Vec<GroupPlayer>,
    total_sessions: usize,
    total_games: usize,
    identities: IdentityMap,
    games_by_player: HashMap<GroupPlayerId, Vec<PlayerGame>>,
}

impl GroupHistory {
    fn load(conn: &mut DbConn, group_id: &str) -> Result<Self> {
        let players = database::group_players::list_by_group(conn, group_id)?;
        let session_ids: Vec<String> = database::sessions::list_by_group(conn, group_id)?
            .into_iter()
            .map(|s| s.id)
            .collect();
        let session_players = database::players::list_by_sessions(conn, &session_ids)?;
        let identities = IdentityMap::from_session_players(&session_players);

        let mut games = Vec::new();
        for row in database::games::list_recorded_by_sessions(conn, &session_ids)? {
            let game_id = row.id.clone();
            match GameRecord::try_from(row) {
                Ok(game) => games.push(game),
                Err(e) => warn!("Ignoring malformed game {} in stats: {:#}", game_id, e),
            }
        }

        Ok(Self {
            games_by_player: index_games(&games, &identities),
            total_sessions: session_ids.len(),
            total_games: games.len(),
            players,
            identities,
        })
    }

    /// Players in rank order. Inactive players are left out unless named.
    fn ranked(&self, include: Option<&str>) -> Vec<&GroupPlayer> {
        let mut ranked: Vec<&GroupPlayer> = self
            .players
            .iter()
            .filter(|p| p.is_active || include == Some(p.id.as_str()))
            .collect();
        ranked.sort_by(|a, b| rank_order(a, b));
        ranked
    }

    /// Chronological games of one player; empty when they never played.
    fn games_of(&self, player_id: &str) -> &[PlayerGame] {
        self.games_by_player
            .get(player_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn name_of<'a>(&'a self, player_id: &'a str) -> &'a str {
        self.players
            .iter()
            .find(|p| p.id == player_id)
            .map_or(player_id, |p| p.name.as_str())
    }
}

fn index_games(
    games: &[GameRecord],
    identities: &IdentityMap,
) -> HashMap<GroupPlayerId, Vec<PlayerGame>> {
    let mut index: HashMap<GroupPlayerId, Vec<PlayerGame>> = HashMap::new();

    for game in games {
        let Some(winner) = game.winning_team else {
            continue;
        };

        let (team_a, team_b) = match identities.resolve_game(game) {
            Ok(teams) => teams,
            Err(e) => {
                warn!("Ignoring game in stats: {:#}", e);
                continue;
            }
        };

        for (side, team, opponents) in [(Side::A, &team_a, &team_b), (Side::B, &team_b, &team_a)] {
            let team: Vec<GroupPlayerId> = team.iter().flatten().cloned().collect();
            let opponents: Vec<GroupPlayerId> = opponents.iter().flatten().cloned().collect();
            let (scored, conceded) = game.points_for(side);

            for player in &team {
                index.entry(player.clone()).or_default().push(PlayerGame {
                    won: side == winner,
                    scored,
                    conceded,
                    partners: team.iter().filter(|p| *p != player).cloned().collect(),
                    opponents: opponents.clone(),
                });
            }
        }
    }

    index
}

fn rank_order(a: &GroupPlayer, b: &GroupPlayer) -> Ordering {
    b.elo_rating
        .cmp(&a.elo_rating)
        .then_with(|| b.total_games.cmp(&a.total_games))
        .then_with(|| a.id.cmp(&b.id))
}

fn recent_form(games: &[PlayerGame], count: usize) -> Vec<Outcome> {
    games
        .iter()
        .rev()
        .take(count)
        .map(|g| Outcome::from_won(g.won))
        .collect()
}

/// Net of the latest outcomes. A win never lowers a rating and a loss never
/// raises one, so this follows the sign of the recent rating movement.
fn trend(games: &[PlayerGame], window: usize) -> Trend {
    let net: i32 = games
        .iter()
        .rev()
        .take(window)
        .map(|g| if g.won { 1 } else { -1 })
        .sum();

    match net.cmp(&0) {
        Ordering::Greater => Trend::Up,
        Ordering::Less => Trend::Down,
        Ordering::Equal => Trend::Stable,
    }
}

fn current_streak(games: &[PlayerGame]) -> i32 {
    let Some(latest) = games.last() else {
        return 0;
    };
    let run = games
        .iter()
        .rev()
        .take_while(|g| g.won == latest.won)
        .count() as i32;

    if latest.won { run } else { -run }
}

fn tally_matchups(games: &[PlayerGame]) -> (HashMap<&str, Record>, HashMap<&str, Record>) {
    let mut partners: HashMap<&str, Record> = HashMap::new();
    let mut opponents: HashMap<&str, Record> = HashMap::new();

    for game in games {
        for partner in &game.partners {
            partners.entry(partner.as_str()).or_default().add(game.won);
        }
        for opponent in &game.opponents {
            opponents.entry(opponent.as_str()).or_default().add(game.won);
        }
    }

    (partners, opponents)
}

/// Most games first, then alphabetical by name.
fn sorted_matchups<'a>(
    records: HashMap<&'a str, Record>,
    history: &'a GroupHistory,
) -> Vec<(&'a str, &'a str, Record)> {
    let mut rows: Vec<(&str, &str, Record)> = records
        .into_iter()
        .map(|(id, record)| (id, history.name_of(id), record))
        .collect();
    rows.sort_by(|a, b| {
        b.2.games
            .cmp(&a.2.games)
            .then_with(|| a.1.cmp(b.1))
            .then_with(|| a.0.cmp(b.0))
    });
    rows
}

/// Leaderboard, player profiles and group overview derived from stored history.
#[derive(Debug, Clone)]
pub struct StatsService {
    settings: StatsSettings,
}

impl StatsService {
    pub fn new(settings: StatsSettings) -> Self {
        Self { settings }
    }

    pub fn get_leaderboard(&self, conn: &mut DbConn, group_id: &str) -> Result<Vec<LeaderboardEntry>> {
        let history = GroupHistory::load(conn, group_id)?;

        Ok(history
            .ranked(None)
            .into_iter()
            .enumerate()
            .map(|(i, player)| self.leaderboard_entry(player, i + 1, history.games_of(&player.id)))
            .collect())
    }

    fn leaderboard_entry(&self, player: &GroupPlayer, rank: usize, games: &[PlayerGame]) -> LeaderboardEntry {
        LeaderboardEntry {
            player_id: player.id.clone(),
            name: player.name.clone(),
            elo_rating: player.elo_rating,
            rank,
            total_games: player.total_games,
            wins: player.wins,
            losses: player.losses,
            win_rate: win_rate(player.wins, player.total_games),
            recent_form: recent_form(games, self.settings.recent_form_games),
            trend: trend(games, self.settings.trend_window),
        }
    }

    /// Full profile of one player, or `None` when they are not in the group.
    pub fn get_player_detailed_stats(
        &self,
        conn: &mut DbConn,
        group_id: &str,
        player_id: &str,
    ) -> Result<Option<PlayerDetailedStats>> {
        let history = GroupHistory::load(conn, group_id)?;
        let Some(player) = history.players.iter().find(|p| p.id == player_id) else {
            debug!("Player {} not found in group {}", player_id, group_id);
            return Ok(None);
        };

        let ranked = history.ranked(Some(player_id));
        let rank = ranked
            .iter()
            .position(|p| p.id == player.id)
            .map_or(ranked.len(), |i| i + 1);

        let games = history.games_of(player_id);
        let points_scored: i32 = games.iter().map(|g| g.scored).sum();
        let points_conceded: i32 = games.iter().map(|g| g.conceded).sum();

        let (partners, opponents) = tally_matchups(games);
        let partner_stats = sorted_matchups(partners, &history)
            .into_iter()
            .map(|(id, name, r)| PartnerStats {
                partner_id: id.to_string(),
                partner_name: name.to_string(),
                games_played: r.games,
                wins: r.wins,
                losses: r.losses,
                win_rate: win_rate(r.wins, r.games),
            })
            .collect();
        let opponent_stats = sorted_matchups(opponents, &history)
            .into_iter()
            .map(|(id, name, r)| OpponentStats {
                opponent_id: id.to_string(),
                opponent_name: name.to_string(),
                games_played: r.games,
                wins: r.wins,
                losses: r.losses,
                win_rate: win_rate(r.wins, r.games),
            })
            .collect();

        Ok(Some(PlayerDetailedStats {
            player_id: player.id.clone(),
            name: player.name.clone(),
            elo_rating: player.elo_rating,
            rank,
            total_players: ranked.len(),
            total_games: player.total_games,
            wins: player.wins,
            losses: player.losses,
            win_rate: win_rate(player.wins, player.total_games),
            points_scored,
            points_conceded,
            point_differential: points_scored - points_conceded,
            sessions_played: history.identities.sessions_played(player_id),
            recent_form: recent_form(games, self.settings.recent_form_games),
            trend: trend(games, self.settings.trend_window),
            current_streak: current_streak(games),
            partner_stats,
            opponent_stats,
        }))
    }

    pub fn get_group_overview(&self, conn: &mut DbConn, group_id: &str) -> Result<GroupOverview> {
        let history = GroupHistory::load(conn, group_id)?;
        let ranked = history.ranked(None);

        let highlight = |p: &GroupPlayer, value: i32| PlayerHighlight {
            player_id: p.id.clone(),
            name: p.name.clone(),
            value,
        };
        let most_active_player = ranked
            .iter()
            .filter(|p| p.total_games > 0)
            .min_by_key(|p| Reverse(p.total_games))
            .map(|p| highlight(*p, p.total_games));
        let top_rated_player = ranked.first().map(|p| highlight(*p, p.elo_rating));

        Ok(GroupOverview {
            total_sessions: history.total_sessions,
            total_games: history.total_games,
            active_players: ranked.len(),
            most_active_player,
            top_rated_player,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::RatingSettings;
    use crate::services::fixtures::*;
    use crate::services::outcome::OutcomeProcessor;
    use crate::services::recalculation::RecalculationService;

    fn stats() -> StatsService {
        StatsService::new(StatsSettings::default())
    }

    fn recalculate(conn: &mut DbConn) {
        RecalculationService::new(OutcomeProcessor::new(RatingSettings::default()))
            .recalculate_group(conn, "g1")
            .unwrap();
    }

    /// Singles games between alice and bob, `true` meaning alice won.
    fn seed_singles_run(conn: &mut DbConn, alice_results: &[bool]) {
        seed_group(conn, "g1", &["alice", "bob"]);
        seed_session(conn, "s1", Some("g1"), "singles", 1, &["alice", "bob"]);
        for (i, won) in alice_results.iter().enumerate() {
            let number = i as i32 + 1;
            let winner = if *won { "A" } else { "B" };
            seed_game(conn, "s1", number, &["alice"], &["bob"], Some(winner), None, at(1, number as u32 * 5));
        }
        recalculate(conn);
    }

    fn profile(conn: &mut DbConn, player_id: &str) -> PlayerDetailedStats {
        stats()
            .get_player_detailed_stats(conn, "g1", player_id)
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_streak_counts_back_from_latest_game() {
        let mut conn = memory_conn();
        seed_singles_run(&mut conn, &[true, true, false]);
        assert_eq!(profile(&mut conn, "alice").current_streak, -1);
        assert_eq!(profile(&mut conn, "bob").current_streak, 1);

        let mut conn = memory_conn();
        seed_singles_run(&mut conn, &[true, false, true]);
        assert_eq!(profile(&mut conn, "alice").current_streak, 1);

        let mut conn = memory_conn();
        seed_singles_run(&mut conn, &[false, true, true, true]);
        assert_eq!(profile(&mut conn, "alice").current_streak, 3);
    }

    #[test]
    fn test_recent_form_and_trend() {
        let mut conn = memory_conn();
        seed_singles_run(&mut conn, &[false, false, true, true, true, false]);

        let leaderboard = stats().get_leaderboard(&mut conn, "g1").unwrap();
        let alice = leaderboard.iter().find(|e| e.player_id == "alice").unwrap();
        let bob = leaderboard.iter().find(|e| e.player_id == "bob").unwrap();

        use Outcome::{Loss as L, Win as W};
        assert_eq!(alice.recent_form, vec![L, W, W, W, L]);
        assert_eq!(alice.trend, Trend::Up);
        assert_eq!(bob.trend, Trend::Down);
        assert_eq!((alice.wins, alice.losses, alice.total_games), (3, 3, 6));
        assert_eq!(alice.win_rate, 50.0);
    }

    #[test]
    fn test_partner_with_two_wins_one_loss() {
        let mut conn = memory_conn();
        seed_group(&mut conn, "g1", &["alice", "bob", "carol", "dave"]);
        seed_session(&mut conn, "s1", Some("g1"), "doubles", 1, &["alice", "bob", "carol", "dave"]);
        for (n, winner) in [(1, "A"), (2, "A"), (3, "B")] {
            seed_game(&mut conn, "s1", n, &["alice", "bob"], &["carol", "dave"], Some(winner), None, at(1, n as u32));
        }
        recalculate(&mut conn);

        let alice = profile(&mut conn, "alice");

        assert_eq!(alice.partner_stats.len(), 1);
        let bob = &alice.partner_stats[0];
        assert_eq!(bob.partner_id, "bob");
        assert_eq!(bob.partner_name, "Bob");
        assert_eq!((bob.games_played, bob.wins, bob.losses), (3, 2, 1));
        assert!((bob.win_rate - 66.7).abs() < 0.05);

        // each opponent is credited with the game individually
        let opponents: Vec<(&str, i32, i32)> = alice
            .opponent_stats
            .iter()
            .map(|o| (o.opponent_id.as_str(), o.games_played, o.wins))
            .collect();
        assert_eq!(opponents, vec![("carol", 3, 2), ("dave", 3, 2)]);
    }

    #[test]
    fn test_zero_game_player_keeps_the_default_shape() {
        let mut conn = memory_conn();
        seed_group(&mut conn, "g1", &["alice", "bob", "zed"]);
        seed_session(&mut conn, "s1", Some("g1"), "singles", 1, &["alice", "bob"]);
        seed_game(&mut conn, "s1", 1, &["alice"], &["bob"], Some("A"), Some((21, 10)), at(1, 5));
        recalculate(&mut conn);

        let leaderboard = stats().get_leaderboard(&mut conn, "g1").unwrap();
        let order: Vec<(&str, usize)> = leaderboard
            .iter()
            .map(|e| (e.player_id.as_str(), e.rank))
            .collect();
        assert_eq!(order, vec![("alice", 1), ("zed", 2), ("bob", 3)]);

        let zed = &leaderboard[1];
        assert_eq!((zed.elo_rating, zed.total_games), (1500, 0));
        assert_eq!(zed.win_rate, 0.0);
        assert!(zed.recent_form.is_empty());
        assert_eq!(zed.trend, Trend::Stable);

        let profile = profile(&mut conn, "zed");
        assert_eq!((profile.rank, profile.total_players), (2, 3));
        assert_eq!((profile.points_scored, profile.points_conceded), (0, 0));
        assert_eq!((profile.current_streak, profile.sessions_played), (0, 0));
        assert!(profile.partner_stats.is_empty());
        assert!(profile.opponent_stats.is_empty());
    }

    #[test]
    fn test_unknown_player_has_no_profile() {
        let mut conn = memory_conn();
        seed_group(&mut conn, "g1", &["alice"]);

        let result = stats()
            .get_player_detailed_stats(&mut conn, "g1", "ghost")
            .unwrap();
        assert!(result.is_none());
        assert!(stats().get_leaderboard(&mut conn, "empty").unwrap().is_empty());
    }

    #[test]
    fn test_unreadable_game_row_is_left_out() {
        let mut conn = memory_conn();
        seed_singles_run(&mut conn, &[true, true, false]);
        conn.execute("UPDATE games SET team_b = '' WHERE id = 's1-game-3'", [])
            .unwrap();

        let board = stats().get_leaderboard(&mut conn, "g1").unwrap();
        assert_eq!(board.len(), 2);

        let alice = profile(&mut conn, "alice");
        assert_eq!(alice.current_streak, 2);
        assert_eq!(alice.recent_form.len(), 2);
        assert_eq!(stats().get_group_overview(&mut conn, "g1").unwrap().total_games, 2);
    }

    #[test]
    fn test_game_resolving_one_player_twice_is_left_out() {
        let mut conn = memory_conn();
        seed_singles_run(&mut conn, &[true]);
        database::players::set_group_player_link(&mut conn, &session_player_id("s1", "bob"), Some("alice"))
            .unwrap();

        let alice = profile(&mut conn, "alice");
        assert!(alice.recent_form.is_empty());
        assert!(alice.opponent_stats.is_empty());
    }

    #[test]
    fn test_points_and_sessions_skip_guests() {
        let mut conn = memory_conn();
        seed_group(&mut conn, "g1", &["alice", "bob", "carol"]);
        seed_session(&mut conn, "s1", Some("g1"), "doubles", 1, &["alice", "guest1", "bob", "carol"]);
        seed_session(&mut conn, "s2", Some("g1"), "singles", 8, &["alice", "bob"]);
        seed_session(&mut conn, "s3", Some("g1"), "singles", 15, &["alice", "guest2"]);

        seed_game(&mut conn, "s1", 1, &["alice", "guest1"], &["bob", "carol"], Some("A"), Some((21, 19)), at(1, 5));
        seed_game(&mut conn, "s2", 1, &["bob"], &["alice"], Some("A"), Some((21, 12)), at(8, 5));
        seed_game(&mut conn, "s3", 1, &["alice"], &["guest2"], Some("A"), None, at(15, 5));
        recalculate(&mut conn);

        let alice = profile(&mut conn, "alice");

        assert_eq!(alice.points_scored, 21 + 12);
        assert_eq!(alice.points_conceded, 19 + 21);
        assert_eq!(alice.point_differential, -7);
        assert_eq!(alice.sessions_played, 3);
        assert!(alice.partner_stats.is_empty());
        assert_eq!(alice.total_games, 3);
        assert_eq!(alice.current_streak, 1);

        let bob_row = alice
            .opponent_stats
            .iter()
            .find(|o| o.opponent_id == "bob")
            .unwrap();
        assert_eq!((bob_row.games_played, bob_row.wins, bob_row.losses), (2, 1, 1));
    }

    #[test]
    fn test_inactive_players_leave_leaderboard_but_keep_profile() {
        let mut conn = memory_conn();
        seed_singles_run(&mut conn, &[true]);
        database::group_players::set_active(&mut conn, "alice", false).unwrap();

        let leaderboard = stats().get_leaderboard(&mut conn, "g1").unwrap();
        assert_eq!(leaderboard.len(), 1);
        assert_eq!((leaderboard[0].player_id.as_str(), leaderboard[0].rank), ("bob", 1));

        let alice = profile(&mut conn, "alice");
        assert_eq!((alice.rank, alice.total_players), (1, 2));
    }

    #[test]
    fn test_group_overview() {
        let mut conn = memory_conn();
        seed_group(&mut conn, "g1", &["alice", "bob", "carol"]);
        seed_session(&mut conn, "s1", Some("g1"), "singles", 1, &["alice", "bob", "carol"]);
        seed_session(&mut conn, "s2", Some("g1"), "singles", 2, &["alice", "carol"]);
        seed_game(&mut conn, "s1", 1, &["alice"], &["bob"], Some("B"), None, at(1, 5));
        seed_game(&mut conn, "s1", 2, &["alice"], &["carol"], Some("A"), None, at(1, 10));
        seed_game(&mut conn, "s1", 3, &["bob"], &["carol"], None, None, at(1, 15));
        seed_game(&mut conn, "s2", 1, &["carol"], &["alice"], Some("A"), None, at(2, 5));
        recalculate(&mut conn);

        let overview = stats().get_group_overview(&mut conn, "g1").unwrap();

        assert_eq!(overview.total_sessions, 2);
        assert_eq!(overview.total_games, 3);
        assert_eq!(overview.active_players, 3);
        let most_active = overview.most_active_player.unwrap();
        assert_eq!((most_active.player_id.as_str(), most_active.value), ("alice", 3));
        assert!(overview.top_rated_player.is_some());

        let empty = stats().get_group_overview(&mut conn, "nobody").unwrap();
        assert_eq!((empty.total_sessions, empty.active_players), (0, 0));
        assert!(empty.most_active_player.is_none());
        assert!(empty.top_rated_player.is_none());
    }
}

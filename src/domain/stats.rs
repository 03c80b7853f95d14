use serde::Serialize;

use super::models::GroupPlayerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outcome {
    #[serde(rename = "W")]
    Win,
    #[serde(rename = "L")]
    Loss,
}

impl Outcome {
    pub fn from_won(won: bool) -> Self {
        if won { Outcome::Win } else { Outcome::Loss }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Win => "W",
            Outcome::Loss => "L",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

/// Percentage of games won; 0 when nothing was played.
pub fn win_rate(wins: i32, games: i32) -> f64 {
    if games > 0 {
        wins as f64 / games as f64 * 100.0
    } else {
        0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub player_id: GroupPlayerId,
    pub name: String,
    pub elo_rating: i32,
    pub rank: usize,
    pub total_games: i32,
    pub wins: i32,
    pub losses: i32,
    pub win_rate: f64,
    pub recent_form: Vec<Outcome>,
    pub trend: Trend,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerStats {
    pub partner_id: GroupPlayerId,
    pub partner_name: String,
    pub games_played: i32,
    pub wins: i32,
    pub losses: i32,
    pub win_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpponentStats {
    pub opponent_id: GroupPlayerId,
    pub opponent_name: String,
    pub games_played: i32,
    pub wins: i32,
    pub losses: i32,
    pub win_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDetailedStats {
    pub player_id: GroupPlayerId,
    pub name: String,
    pub elo_rating: i32,
    pub rank: usize,
    pub total_players: usize,
    pub total_games: i32,
    pub wins: i32,
    pub losses: i32,
    pub win_rate: f64,
    pub points_scored: i32,
    pub points_conceded: i32,
    pub point_differential: i32,
    pub sessions_played: usize,
    pub recent_form: Vec<Outcome>,
    pub trend: Trend,
    /// Positive for a run of wins, negative for a run of losses.
    pub current_streak: i32,
    pub partner_stats: Vec<PartnerStats>,
    pub opponent_stats: Vec<OpponentStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerHighlight {
    pub player_id: GroupPlayerId,
    pub name: String,
    pub value: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupOverview {
    pub total_sessions: usize,
    pub total_games: usize,
    pub active_players: usize,
    pub most_active_player: Option<PlayerHighlight>,
    pub top_rated_player: Option<PlayerHighlight>,
}

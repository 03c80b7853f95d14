use chrono::NaiveDateTime;

#[derive(Debug, Clone)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupPlayer {
    pub id: String,
    pub group_id: String,
    pub name: String,
    pub elo_rating: i32,
    pub wins: i32,
    pub losses: i32,
    pub total_games: i32,
    pub is_active: bool,
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub group_id: Option<String>,
    pub name: Option<String>,
    pub date: NaiveDateTime,
    pub game_mode: String,
    pub created_at: Option<NaiveDateTime>,
}

/// A player as entered for one session, optionally linked to a group player.
#[derive(Debug, Clone)]
pub struct SessionPlayer {
    pub id: String,
    pub session_id: String,
    pub name: String,
    pub group_player_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Game {
    pub id: String,
    pub session_id: String,
    pub game_number: i32,
    /// JSON array of session player ids, decoded by `GameRecord`.
    pub team_a: String,
    pub team_b: String,
    pub winning_team: Option<String>,
    pub team_a_score: Option<i32>,
    pub team_b_score: Option<i32>,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone)]
pub struct NewGameRow<'a> {
    pub id: &'a str,
    pub session_id: &'a str,
    pub game_number: i32,
    pub team_a: &'a [String],
    pub team_b: &'a [String],
    pub winning_team: Option<&'a str>,
    pub team_a_score: Option<i32>,
    pub team_b_score: Option<i32>,
    pub created_at: NaiveDateTime,
}

/// Counter increments written together with a new rating.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutcomeWrite {
    pub elo_rating: i32,
    pub won: bool,
}

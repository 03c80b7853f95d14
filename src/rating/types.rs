use std::fmt;

use serde::Serialize;

use crate::domain::{GroupPlayerId, Side};

/// Rating change for one player produced by one game. Not persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingUpdate {
    pub group_player_id: GroupPlayerId,
    pub side: Side,
    pub old_rating: i32,
    pub new_rating: i32,
    pub won: bool,
}

impl RatingUpdate {
    pub fn change(&self) -> i32 {
        self.new_rating - self.old_rating
    }
}

/// A win or loss taken back from one player's counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterReversal {
    pub group_player_id: GroupPlayerId,
    pub side: Side,
    pub was_win: bool,
}

/// A per-player write that did not go through. Peers are unaffected.
#[derive(Debug)]
pub struct FailedUpdate {
    pub group_player_id: GroupPlayerId,
    pub error: anyhow::Error,
}

impl FailedUpdate {
    pub fn new(group_player_id: &str, error: anyhow::Error) -> Self {
        Self {
            group_player_id: group_player_id.to_string(),
            error,
        }
    }
}

impl fmt::Display for FailedUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "update for {} failed: {:#}", self.group_player_id, self.error)
    }
}

pub type UpdateResult = Result<RatingUpdate, FailedUpdate>;
pub type ReversalResult = Result<CounterReversal, FailedUpdate>;

use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::database;

pub type GroupPlayerId = String;
pub type SessionPlayerId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::A => "A",
            Side::B => "B",
        }
    }
}

impl FromStr for Side {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "A" | "a" => Ok(Side::A),
            "B" | "b" => Ok(Side::B),
            other => bail!("Unknown winning team: {}", other),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    Singles,
    Doubles,
}

impl GameMode {
    pub fn team_size(&self) -> usize {
        match self {
            GameMode::Singles => 1,
            GameMode::Doubles => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Singles => "singles",
            GameMode::Doubles => "doubles",
        }
    }
}

impl FromStr for GameMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "singles" => Ok(GameMode::Singles),
            "doubles" => Ok(GameMode::Doubles),
            other => bail!("Unknown game mode: {}", other),
        }
    }
}

/// One side of a game, as session player references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Team {
    Singles(SessionPlayerId),
    Doubles(SessionPlayerId, SessionPlayerId),
}

impl Team {
    pub fn from_ids(ids: &[String]) -> Result<Self> {
        match ids {
            [only] => Ok(Team::Singles(only.clone())),
            [first, second] if first != second => Ok(Team::Doubles(first.clone(), second.clone())),
            [first, _] => bail!("Player {} appears twice in the same team", first),
            _ => bail!("A team must have 1 or 2 players, got {}", ids.len()),
        }
    }

    pub fn members(&self) -> Vec<&str> {
        match self {
            Team::Singles(p) => vec![p.as_str()],
            Team::Doubles(p1, p2) => vec![p1.as_str(), p2.as_str()],
        }
    }

    pub fn mode(&self) -> GameMode {
        match self {
            Team::Singles(_) => GameMode::Singles,
            Team::Doubles(..) => GameMode::Doubles,
        }
    }

    pub fn contains(&self, player_id: &str) -> bool {
        self.members().contains(&player_id)
    }

    pub fn to_ids(&self) -> Vec<String> {
        self.members().into_iter().map(str::to_string).collect()
    }
}

/// A stored game with its teams and result parsed into domain types.
#[derive(Debug, Clone, PartialEq)]
pub struct GameRecord {
    pub id: String,
    pub session_id: String,
    pub game_number: i32,
    pub team_a: Team,
    pub team_b: Team,
    pub winning_team: Option<Side>,
    pub team_a_score: Option<i32>,
    pub team_b_score: Option<i32>,
    pub created_at: NaiveDateTime,
}

impl GameRecord {
    /// Points scored and conceded from `side`'s point of view. Missing scores count as 0.
    pub fn points_for(&self, side: Side) -> (i32, i32) {
        let a = self.team_a_score.unwrap_or(0);
        let b = self.team_b_score.unwrap_or(0);
        match side {
            Side::A => (a, b),
            Side::B => (b, a),
        }
    }
}

impl TryFrom<database::Game> for GameRecord {
    type Error = anyhow::Error;

    fn try_from(row: database::Game) -> Result<Self> {
        let team_a = Team::from_ids(&decode_team(&row.id, &row.team_a)?)?;
        let team_b = Team::from_ids(&decode_team(&row.id, &row.team_b)?)?;
        if team_a.mode() != team_b.mode() {
            bail!("Game {} has teams of different sizes", row.id);
        }
        if team_a.members().iter().any(|p| team_b.contains(p)) {
            bail!("Game {} has a player on both teams", row.id);
        }

        let winning_team = row.winning_team.as_deref().map(Side::from_str).transpose()?;

        Ok(Self {
            id: row.id,
            session_id: row.session_id,
            game_number: row.game_number,
            team_a,
            team_b,
            winning_team,
            team_a_score: row.team_a_score,
            team_b_score: row.team_b_score,
            created_at: row.created_at,
        })
    }
}

fn decode_team(game_id: &str, raw: &str) -> Result<Vec<String>> {
    serde_json::from_str(raw).with_context(|| format!("Game {} has an unreadable team", game_id))
}

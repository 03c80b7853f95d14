use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::database::{Group, GroupPlayer};
use crate::domain::{GameRecord, Side};

#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupResponse {
    pub id: String,
    pub name: String,
    pub created_at: Option<NaiveDateTime>,
}

impl From<Group> for GroupResponse {
    fn from(group: Group) -> Self {
        Self {
            id: group.id,
            name: group.name,
            created_at: group.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddPlayerRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkPlayerRequest {
    pub group_player_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupPlayerResponse {
    pub id: String,
    pub group_id: String,
    pub name: String,
    pub elo_rating: i32,
    pub wins: i32,
    pub losses: i32,
    pub total_games: i32,
    pub is_active: bool,
}

impl From<GroupPlayer> for GroupPlayerResponse {
    fn from(player: GroupPlayer) -> Self {
        Self {
            id: player.id,
            group_id: player.group_id,
            name: player.name,
            elo_rating: player.elo_rating,
            wins: player.wins,
            losses: player.losses,
            total_games: player.total_games,
            is_active: player.is_active,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResponse {
    pub id: String,
    pub session_id: String,
    pub game_number: i32,
    pub team_a: Vec<String>,
    pub team_b: Vec<String>,
    pub winning_team: Option<Side>,
    pub team_a_score: Option<i32>,
    pub team_b_score: Option<i32>,
    pub created_at: NaiveDateTime,
}

impl From<GameRecord> for GameResponse {
    fn from(game: GameRecord) -> Self {
        Self {
            team_a: game.team_a.to_ids(),
            team_b: game.team_b.to_ids(),
            id: game.id,
            session_id: game.session_id,
            game_number: game.game_number,
            winning_team: game.winning_team,
            team_a_score: game.team_a_score,
            team_b_score: game.team_b_score,
            created_at: game.created_at,
        }
    }
}

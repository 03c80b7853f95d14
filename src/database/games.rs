use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use rusqlite::{params, params_from_iter, OptionalExtension};

use super::connection::DbConn;
use super::group_players::placeholders;
use super::models::{Game, NewGameRow};

const COLUMNS: &str = "g.id, g.session_id, g.game_number, g.team_a, g.team_b, g.winning_team, g.team_a_score, g.team_b_score, g.created_at, g.updated_at";

pub fn insert_game(conn: &mut DbConn, game: &NewGameRow) -> Result<Game> {
    let sql = "INSERT INTO games (id, session_id, game_number, team_a, team_b, winning_team, team_a_score, team_b_score, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)";

    conn.execute(
        sql,
        params![
            game.id,
            game.session_id,
            game.game_number,
            encode_team(game.team_a)?,
            encode_team(game.team_b)?,
            game.winning_team,
            game.team_a_score,
            game.team_b_score,
            game.created_at
        ],
    )
    .context("Failed to insert game")?;

    find_by_id(conn, game.session_id, game.id)?
        .ok_or_else(|| anyhow::anyhow!("Game {} missing after insert", game.id))
}

fn encode_team(team: &[String]) -> Result<String> {
    serde_json::to_string(team).context("Failed to encode team")
}

fn parse_game_row(row: &rusqlite::Row) -> rusqlite::Result<Game> {
    Ok(Game {
        id: row.get(0)?,
        session_id: row.get(1)?,
        game_number: row.get(2)?,
        team_a: row.get(3)?,
        team_b: row.get(4)?,
        winning_team: row.get(5)?,
        team_a_score: row.get(6)?,
        team_b_score: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

pub fn find_by_id(conn: &mut DbConn, session_id: &str, id: &str) -> Result<Option<Game>> {
    let sql = format!(
        "SELECT {} FROM games g WHERE g.id = ?1 AND g.session_id = ?2",
        COLUMNS
    );

    conn.query_row(&sql, params![id, session_id], parse_game_row)
        .optional()
        .context("Failed to query game by id")
}

pub fn list_by_session(conn: &mut DbConn, session_id: &str) -> Result<Vec<Game>> {
    let sql = format!(
        "SELECT {} FROM games g WHERE g.session_id = ?1 ORDER BY g.game_number ASC",
        COLUMNS
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![session_id], parse_game_row)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to fetch games")?;

    Ok(rows)
}

/// Games with a recorded winner, oldest first. Replay order depends on this.
pub fn list_recorded_by_sessions(conn: &mut DbConn, session_ids: &[String]) -> Result<Vec<Game>> {
    if session_ids.is_empty() {
        return Ok(Vec::new());
    }

    let sql = format!(
        "SELECT {} FROM games g JOIN sessions s ON s.id = g.session_id \
         WHERE g.session_id IN ({}) AND g.winning_team IS NOT NULL \
         ORDER BY g.created_at ASC, s.date ASC, g.session_id ASC, g.game_number ASC",
        COLUMNS,
        placeholders(session_ids.len())
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(session_ids.iter()), parse_game_row)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to fetch games")?;

    Ok(rows)
}

pub fn next_game_number(conn: &mut DbConn, session_id: &str) -> Result<i32> {
    let sql = "SELECT COALESCE(MAX(game_number), 0) + 1 FROM games WHERE session_id = ?1";

    conn.query_row(sql, params![session_id], |row| row.get(0))
        .context("Failed to compute next game number")
}

pub fn update_result(
    conn: &mut DbConn,
    session_id: &str,
    id: &str,
    winning_team: Option<&str>,
    team_a_score: Option<i32>,
    team_b_score: Option<i32>,
    updated_at: NaiveDateTime,
) -> Result<bool> {
    let sql = "UPDATE games SET winning_team = ?3, team_a_score = ?4, team_b_score = ?5, updated_at = ?6 WHERE id = ?1 AND session_id = ?2";

    let changed = conn
        .execute(
            sql,
            params![id, session_id, winning_team, team_a_score, team_b_score, updated_at],
        )
        .context("Failed to update game")?;
    Ok(changed > 0)
}

pub fn delete_game(conn: &mut DbConn, session_id: &str, id: &str) -> Result<bool> {
    let sql = "DELETE FROM games WHERE id = ?1 AND session_id = ?2";

    let changed = conn
        .execute(sql, params![id, session_id])
        .context("Failed to delete game")?;
    Ok(changed > 0)
}

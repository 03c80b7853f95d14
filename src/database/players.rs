use anyhow::{Context, Result};
use rusqlite::{params, params_from_iter, OptionalExtension};

use super::connection::DbConn;
use super::group_players::placeholders;
use super::models::SessionPlayer;

pub fn insert_player(
    conn: &mut DbConn,
    id: &str,
    session_id: &str,
    name: &str,
    group_player_id: Option<&str>,
) -> Result<SessionPlayer> {
    let sql = "INSERT INTO players (id, session_id, name, group_player_id) VALUES (?1, ?2, ?3, ?4) RETURNING id, session_id, name, group_player_id";

    conn.query_row(sql, params![id, session_id, name, group_player_id], parse_player_row)
        .context("Failed to insert session player")
}

fn parse_player_row(row: &rusqlite::Row) -> rusqlite::Result<SessionPlayer> {
    Ok(SessionPlayer {
        id: row.get(0)?,
        session_id: row.get(1)?,
        name: row.get(2)?,
        group_player_id: row.get(3)?,
    })
}

pub fn find_by_id(conn: &mut DbConn, id: &str) -> Result<Option<SessionPlayer>> {
    let sql = "SELECT id, session_id, name, group_player_id FROM players WHERE id = ?1";

    conn.query_row(sql, params![id], parse_player_row)
        .optional()
        .context("Failed to query session player by id")
}

pub fn list_by_session(conn: &mut DbConn, session_id: &str) -> Result<Vec<SessionPlayer>> {
    list_by_sessions(conn, &[session_id.to_string()])
}

pub fn list_by_sessions(conn: &mut DbConn, session_ids: &[String]) -> Result<Vec<SessionPlayer>> {
    if session_ids.is_empty() {
        return Ok(Vec::new());
    }

    let sql = format!(
        "SELECT id, session_id, name, group_player_id FROM players WHERE session_id IN ({}) ORDER BY id",
        placeholders(session_ids.len())
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(session_ids.iter()), parse_player_row)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to fetch players")?;

    Ok(rows)
}

pub fn set_group_player_link(
    conn: &mut DbConn,
    id: &str,
    group_player_id: Option<&str>,
) -> Result<bool> {
    let sql = "UPDATE players SET group_player_id = ?2 WHERE id = ?1";

    let changed = conn
        .execute(sql, params![id, group_player_id])
        .context("Failed to update player link")?;
    Ok(changed > 0)
}

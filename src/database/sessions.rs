use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use rusqlite::{params, OptionalExtension};

use super::connection::DbConn;
use super::models::Session;

const COLUMNS: &str = "id, group_id, name, date, game_mode, created_at";

pub fn insert_session(
    conn: &mut DbConn,
    id: &str,
    group_id: Option<&str>,
    name: Option<&str>,
    date: NaiveDateTime,
    game_mode: &str,
) -> Result<Session> {
    let sql = format!(
        "INSERT INTO sessions (id, group_id, name, date, game_mode) VALUES (?1, ?2, ?3, ?4, ?5) RETURNING {}",
        COLUMNS
    );

    conn.query_row(
        &sql,
        params![id, group_id, name, date, game_mode],
        parse_session_row,
    )
    .context("Failed to insert session")
}

fn parse_session_row(row: &rusqlite::Row) -> rusqlite::Result<Session> {
    Ok(Session {
        id: row.get(0)?,
        group_id: row.get(1)?,
        name: row.get(2)?,
        date: row.get(3)?,
        game_mode: row.get(4)?,
        created_at: row.get(5)?,
    })
}

pub fn find_by_id(conn: &mut DbConn, id: &str) -> Result<Option<Session>> {
    let sql = format!("SELECT {} FROM sessions WHERE id = ?1", COLUMNS);

    conn.query_row(&sql, params![id], parse_session_row)
        .optional()
        .context("Failed to query session by id")
}

pub fn list_by_group(conn: &mut DbConn, group_id: &str) -> Result<Vec<Session>> {
    let sql = format!(
        "SELECT {} FROM sessions WHERE group_id = ?1 ORDER BY date ASC, id ASC",
        COLUMNS
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![group_id], parse_session_row)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to fetch sessions")?;

    Ok(rows)
}

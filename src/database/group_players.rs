use std::collections::HashMap;

use anyhow::{Context, Result};
use rusqlite::{params, params_from_iter, OptionalExtension};

use super::connection::DbConn;
use super::models::{GroupPlayer, OutcomeWrite};

const COLUMNS: &str =
    "id, group_id, name, elo_rating, wins, losses, total_games, is_active, created_at";

pub fn insert_group_player(
    conn: &mut DbConn,
    id: &str,
    group_id: &str,
    name: &str,
    elo_rating: i32,
) -> Result<GroupPlayer> {
    let sql = format!(
        "INSERT INTO group_players (id, group_id, name, elo_rating) VALUES (?1, ?2, ?3, ?4) RETURNING {}",
        COLUMNS
    );

    conn.query_row(&sql, params![id, group_id, name, elo_rating], parse_group_player_row)
        .context("Failed to insert group player")
}

fn parse_group_player_row(row: &rusqlite::Row) -> rusqlite::Result<GroupPlayer> {
    Ok(GroupPlayer {
        id: row.get(0)?,
        group_id: row.get(1)?,
        name: row.get(2)?,
        elo_rating: row.get(3)?,
        wins: row.get(4)?,
        losses: row.get(5)?,
        total_games: row.get(6)?,
        is_active: row.get(7)?,
        created_at: row.get(8)?,
    })
}

pub fn find_by_id(conn: &mut DbConn, id: &str) -> Result<Option<GroupPlayer>> {
    let sql = format!("SELECT {} FROM group_players WHERE id = ?1", COLUMNS);

    conn.query_row(&sql, params![id], parse_group_player_row)
        .optional()
        .context("Failed to query group player by id")
}

/// All players of a group, including soft-removed ones.
pub fn list_by_group(conn: &mut DbConn, group_id: &str) -> Result<Vec<GroupPlayer>> {
    let sql = format!(
        "SELECT {} FROM group_players WHERE group_id = ?1 ORDER BY id",
        COLUMNS
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![group_id], parse_group_player_row)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to list group players")?;

    Ok(rows)
}

/// Current ratings for the given ids. Ids without a row are absent from the map.
pub fn fetch_ratings(conn: &mut DbConn, ids: &[String]) -> Result<HashMap<String, i32>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let sql = format!(
        "SELECT id, elo_rating FROM group_players WHERE id IN ({})",
        placeholders(ids.len())
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(ids.iter()), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i32>(1)?))
        })?
        .collect::<rusqlite::Result<HashMap<_, _>>>()
        .context("Failed to fetch player ratings")?;

    Ok(rows)
}

/// Writes a new rating and credits one win or loss. Returns false when no row matched.
pub fn apply_outcome(conn: &mut DbConn, id: &str, write: OutcomeWrite) -> Result<bool> {
    let (win, loss) = if write.won { (1, 0) } else { (0, 1) };
    let sql = "UPDATE group_players SET elo_rating = ?2, wins = wins + ?3, losses = losses + ?4, total_games = wins + ?3 + losses + ?4 WHERE id = ?1";

    let changed = conn
        .execute(sql, params![id, write.elo_rating, win, loss])
        .with_context(|| format!("Failed to update rating/stats for {}", id))?;
    Ok(changed > 0)
}

/// Takes back one win or loss, clamping counters at zero. Rating is left untouched.
pub fn revert_outcome(conn: &mut DbConn, id: &str, won: bool) -> Result<bool> {
    let (win, loss) = if won { (1, 0) } else { (0, 1) };
    let sql = "UPDATE group_players SET wins = MAX(0, wins - ?2), losses = MAX(0, losses - ?3), total_games = MAX(0, wins - ?2) + MAX(0, losses - ?3) WHERE id = ?1";

    let changed = conn
        .execute(sql, params![id, win, loss])
        .with_context(|| format!("Failed to reverse stats for {}", id))?;
    Ok(changed > 0)
}

pub fn reset_group(conn: &mut DbConn, group_id: &str, default_rating: i32) -> Result<usize> {
    let sql = "UPDATE group_players SET elo_rating = ?2, wins = 0, losses = 0, total_games = 0 WHERE group_id = ?1";

    conn.execute(sql, params![group_id, default_rating])
        .context("Failed to reset group player ratings")
}

pub fn set_active(conn: &mut DbConn, id: &str, is_active: bool) -> Result<bool> {
    let sql = "UPDATE group_players SET is_active = ?2 WHERE id = ?1";

    let changed = conn
        .execute(sql, params![id, is_active])
        .context("Failed to update group player status")?;
    Ok(changed > 0)
}

pub(crate) fn placeholders(count: usize) -> String {
    (1..=count)
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ")
}

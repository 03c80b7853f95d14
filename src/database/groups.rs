use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension};

use super::connection::DbConn;
use super::models::Group;

pub fn insert_group(conn: &mut DbConn, id: &str, name: &str) -> Result<Group> {
    let sql = "INSERT INTO groups (id, name) VALUES (?1, ?2) RETURNING id, name, created_at";

    conn.query_row(sql, params![id, name], parse_group_row)
        .context("Failed to insert group")
}

pub fn find_by_id(conn: &mut DbConn, id: &str) -> Result<Option<Group>> {
    let sql = "SELECT id, name, created_at FROM groups WHERE id = ?1";

    conn.query_row(sql, params![id], parse_group_row)
        .optional()
        .context("Failed to query group by id")
}

fn parse_group_row(row: &rusqlite::Row) -> rusqlite::Result<Group> {
    Ok(Group {
        id: row.get(0)?,
        name: row.get(1)?,
        created_at: row.get(2)?,
    })
}

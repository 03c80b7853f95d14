//! Seed helpers for service tests, backed by an in-memory database.

use chrono::{NaiveDate, NaiveDateTime};

use crate::database::{self, DbConn, GroupPlayer, NewGameRow};

pub fn memory_conn() -> DbConn {
    let pool = database::create_memory_pool().unwrap();
    let mut conn = database::get_connection(&pool).unwrap();
    database::setup::init_schema(&mut conn).unwrap();
    conn
}

pub fn at(day: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, day)
        .and_then(|d| d.and_hms_opt(18 + minute / 60, minute % 60, 0))
        .unwrap()
}

/// Creates a group and one group player per id (the display name is the id capitalised).
pub fn seed_group(conn: &mut DbConn, group_id: &str, player_ids: &[&str]) {
    database::groups::insert_group(conn, group_id, "Shuttle Club").unwrap();
    for id in player_ids {
        database::group_players::insert_group_player(conn, id, group_id, &capitalise(id), 1500)
            .unwrap();
    }
}

fn capitalise(id: &str) -> String {
    let mut chars = id.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Creates a session on March `day` with one session player per entry.
/// A session player `s1-alice` is linked to group player `alice`; entries
/// starting with `guest` stay unlinked.
pub fn seed_session(
    conn: &mut DbConn,
    session_id: &str,
    group_id: Option<&str>,
    mode: &str,
    day: u32,
    players: &[&str],
) {
    database::sessions::insert_session(conn, session_id, group_id, None, at(day, 0), mode)
        .unwrap();
    for name in players {
        let link = if name.starts_with("guest") { None } else { Some(*name) };
        let id = session_player_id(session_id, name);
        database::players::insert_player(conn, &id, session_id, name, link).unwrap();
    }
}

pub fn session_player_id(session_id: &str, name: &str) -> String {
    format!("{}-{}", session_id, name)
}

/// Inserts a game whose teams are given by player name within the session.
#[allow(clippy::too_many_arguments)]
pub fn seed_game(
    conn: &mut DbConn,
    session_id: &str,
    game_number: i32,
    team_a: &[&str],
    team_b: &[&str],
    winner: Option<&str>,
    scores: Option<(i32, i32)>,
    created_at: NaiveDateTime,
) -> String {
    let id = format!("{}-game-{}", session_id, game_number);
    let team_a: Vec<String> = team_a.iter().map(|n| session_player_id(session_id, n)).collect();
    let team_b: Vec<String> = team_b.iter().map(|n| session_player_id(session_id, n)).collect();
    database::games::insert_game(
        conn,
        &NewGameRow {
            id: &id,
            session_id,
            game_number,
            team_a: &team_a,
            team_b: &team_b,
            winning_team: winner,
            team_a_score: scores.map(|s| s.0),
            team_b_score: scores.map(|s| s.1),
            created_at,
        },
    )
    .unwrap();
    id
}

pub fn group_player(conn: &mut DbConn, id: &str) -> GroupPlayer {
    database::group_players::find_by_id(conn, id).unwrap().unwrap()
}

pub fn linked(ids: &[&str]) -> Vec<Option<String>> {
    ids.iter().map(|id| Some(id.to_string())).collect()
}

/// Makes every write to one group player's row fail.
pub fn break_writes_for(conn: &mut DbConn, id: &str) {
    let sql = format!(
        "CREATE TRIGGER fail_{id} BEFORE UPDATE ON group_players WHEN OLD.id = '{id}' \
         BEGIN SELECT RAISE(ABORT, 'disk on fire'); END"
    );
    conn.execute(&sql, []).unwrap();
}

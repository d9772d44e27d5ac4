//! Event-user join persistence (speakers and hosts of an event).

use crate::repo::record_repo::RepoResult;
use rusqlite::{params, Connection};

/// Links a user to an event; re-linking only updates `order`.
pub fn add_event_user(conn: &Connection, event_id: i64, user_id: i64, order: i64) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO event_user (event_ID, user_ID, event_user_order)
         VALUES (?1, ?2, ?3)
         ON CONFLICT (event_ID, user_ID)
         DO UPDATE SET event_user_order = excluded.event_user_order;",
        params![event_id, user_id, order],
    )?;
    Ok(())
}

pub fn remove_event_user(conn: &Connection, event_id: i64, user_id: i64) -> RepoResult<usize> {
    let removed = conn.execute(
        "DELETE FROM event_user WHERE event_ID = ?1 AND user_ID = ?2;",
        params![event_id, user_id],
    )?;
    Ok(removed)
}

/// User IDs of an event in display order.
pub fn event_user_ids(conn: &Connection, event_id: i64) -> RepoResult<Vec<i64>> {
    let mut stmt = conn.prepare(
        "SELECT user_ID FROM event_user
         WHERE event_ID = ?1
         ORDER BY event_user_order ASC, user_ID ASC;",
    )?;
    let ids = stmt
        .query_map([event_id], |row| row.get::<_, i64>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ids)
}

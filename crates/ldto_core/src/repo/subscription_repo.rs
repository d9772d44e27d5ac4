//! Event subscription persistence.
//!
//! # Invariants
//! - An email subscribes to an event at most once.
//! - Emails are stored trimmed and lowercased.

use crate::repo::record_repo::RepoResult;
use log::info;
use rusqlite::{params, Connection};

pub fn subscription_exists(conn: &Connection, event_id: i64, email: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM subscription
            WHERE event_ID = ?1 AND subscription_email = ?2
        );",
        params![event_id, normalize_email(email)],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

/// Inserts a subscription row and returns its ID.
pub fn insert_subscription(conn: &Connection, event_id: i64, email: &str) -> RepoResult<i64> {
    conn.execute(
        "INSERT INTO subscription (subscription_email, event_ID) VALUES (?1, ?2);",
        params![normalize_email(email), event_id],
    )?;
    let id = conn.last_insert_rowid();
    info!("event=subscription_add module=repo status=ok event_id={event_id} subscription_id={id}");
    Ok(id)
}

/// Subscribed emails of an event, oldest first.
pub fn list_subscriptions(conn: &Connection, event_id: i64) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT subscription_email FROM subscription
         WHERE event_ID = ?1
         ORDER BY subscription_ID ASC;",
    )?;
    let emails = stmt
        .query_map([event_id], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(emails)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

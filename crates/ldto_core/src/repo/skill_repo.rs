//! User-skill join persistence.
//!
//! # Responsibility
//! - Assign, rescore and remove skills on users.
//! - Read per-user skill scores.
//!
//! # Invariants
//! - A user holds a skill at most once; the `(user_ID, skill_ID)` pair is
//!   the join key.
//! - `replace_user_skill` deletes and reinserts in one transaction.

use crate::repo::record_repo::RepoResult;
use log::debug;
use rusqlite::{params, Connection, TransactionBehavior};
use std::collections::BTreeMap;

/// Assigns `skill_id` to `user_id` with `score`, replacing any previous
/// assignment of the same pair.
pub fn replace_user_skill(
    conn: &mut Connection,
    user_id: i64,
    skill_id: i64,
    score: i64,
) -> RepoResult<()> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let removed = tx.execute(
        "DELETE FROM user_skill WHERE user_ID = ?1 AND skill_ID = ?2;",
        params![user_id, skill_id],
    )?;
    tx.execute(
        "INSERT INTO user_skill (user_ID, skill_ID, skill_score) VALUES (?1, ?2, ?3);",
        params![user_id, skill_id, score],
    )?;
    tx.commit()?;

    debug!(
        "event=user_skill_replace module=repo status=ok user_id={user_id} skill_id={skill_id} replaced={}",
        removed > 0
    );
    Ok(())
}

/// Changes the score of one assignment; returns changed rows (0 or 1).
pub fn update_user_skill_score(
    conn: &Connection,
    user_id: i64,
    skill_id: i64,
    score: i64,
) -> RepoResult<usize> {
    let changed = conn.execute(
        "UPDATE user_skill SET skill_score = ?3 WHERE user_ID = ?1 AND skill_ID = ?2;",
        params![user_id, skill_id, score],
    )?;
    Ok(changed)
}

pub fn delete_user_skill(conn: &Connection, user_id: i64, skill_id: i64) -> RepoResult<usize> {
    let deleted = conn.execute(
        "DELETE FROM user_skill WHERE user_ID = ?1 AND skill_ID = ?2;",
        params![user_id, skill_id],
    )?;
    Ok(deleted)
}

/// Scores keyed by skill ID.
pub fn user_skill_scores(conn: &Connection, user_id: i64) -> RepoResult<BTreeMap<i64, i64>> {
    let mut stmt =
        conn.prepare("SELECT skill_ID, skill_score FROM user_skill WHERE user_ID = ?1;")?;
    let mut rows = stmt.query([user_id])?;
    let mut scores = BTreeMap::new();
    while let Some(row) = rows.next()? {
        scores.insert(row.get::<_, i64>(0)?, row.get::<_, i64>(1)?);
    }
    Ok(scores)
}

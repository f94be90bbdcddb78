//! Class notes and meeting links

use campus_common::db::models::{Gmeet, Note};
use campus_common::Result;
use sqlx::SqlitePool;

use super::placeholders;

/// Notes of the given batches, newest first
pub async fn notes_for_batches(pool: &SqlitePool, batch_ids: &[String]) -> Result<Vec<Note>> {
    if batch_ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT * FROM notes WHERE batch_id IN ({}) ORDER BY created_at DESC",
        placeholders(batch_ids.len())
    );
    let mut query = sqlx::query_as::<_, Note>(&sql);
    for id in batch_ids {
        query = query.bind(id);
    }
    Ok(query.fetch_all(pool).await?)
}

/// Meetings of the given batches in schedule order
pub async fn gmeets_for_batches(pool: &SqlitePool, batch_ids: &[String]) -> Result<Vec<Gmeet>> {
    if batch_ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT * FROM gmeets WHERE batch_id IN ({}) ORDER BY date ASC, time ASC",
        placeholders(batch_ids.len())
    );
    let mut query = sqlx::query_as::<_, Gmeet>(&sql);
    for id in batch_ids {
        query = query.bind(id);
    }
    Ok(query.fetch_all(pool).await?)
}

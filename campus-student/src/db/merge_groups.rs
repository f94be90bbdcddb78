//! Merge group membership

use campus_common::Result;
use sqlx::SqlitePool;

/// Every batch sharing a merge group with `batch_id`, itself included
///
/// Empty when the batch is not a member of any group.
pub async fn group_members(pool: &SqlitePool, batch_id: &str) -> Result<Vec<String>> {
    let members: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT peer.batch_id
        FROM batch_merge_members self_row
        JOIN batch_merge_members peer ON peer.merge_group_id = self_row.merge_group_id
        WHERE self_row.batch_id = ?
        "#,
    )
    .bind(batch_id)
    .fetch_all(pool)
    .await?;
    Ok(members)
}

//! States and centers, the lookups behind registration and batch browsing

use campus_common::db::models::{Center, State};
use campus_common::Result;
use sqlx::SqlitePool;

pub async fn list_states(pool: &SqlitePool) -> Result<Vec<State>> {
    let states = sqlx::query_as::<_, State>("SELECT * FROM states ORDER BY state_name")
        .fetch_all(pool)
        .await?;
    Ok(states)
}

pub async fn get_state(pool: &SqlitePool, state_id: &str) -> Result<Option<State>> {
    let state = sqlx::query_as::<_, State>("SELECT * FROM states WHERE state_id = ?")
        .bind(state_id)
        .fetch_optional(pool)
        .await?;
    Ok(state)
}

pub async fn get_center(pool: &SqlitePool, center_id: &str) -> Result<Option<Center>> {
    let center = sqlx::query_as::<_, Center>("SELECT * FROM centers WHERE center_id = ?")
        .bind(center_id)
        .fetch_optional(pool)
        .await?;
    Ok(center)
}

/// Centers of one state, by name
pub async fn centers_in_state(pool: &SqlitePool, state_id: &str) -> Result<Vec<Center>> {
    let centers =
        sqlx::query_as::<_, Center>("SELECT * FROM centers WHERE state = ? ORDER BY center_name")
            .bind(state_id)
            .fetch_all(pool)
            .await?;
    Ok(centers)
}

pub async fn all_centers(pool: &SqlitePool) -> Result<Vec<Center>> {
    let centers = sqlx::query_as::<_, Center>("SELECT * FROM centers ORDER BY center_name")
        .fetch_all(pool)
        .await?;
    Ok(centers)
}

//! Academic calendar
//!
//! Only `active` events are listed, and an event drops out once its last
//! day (`event_end_date`, else `event_start_date`) is before `today`.

use campus_common::db::models::AcademicEvent;
use campus_common::Result;
use sqlx::SqlitePool;

/// Events not yet over, soonest first
pub async fn upcoming(pool: &SqlitePool, today: &str, limit: i64) -> Result<Vec<AcademicEvent>> {
    let events = sqlx::query_as::<_, AcademicEvent>(
        r#"
        SELECT id, title, description, event_type, event_start_date, event_end_date,
               event_start_time, event_end_time, status
        FROM academic_events
        WHERE status = 'active'
          AND COALESCE(event_end_date, event_start_date) >= ?
        ORDER BY event_start_date ASC, event_start_time ASC
        LIMIT ?
        "#,
    )
    .bind(today)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(events)
}

/// Events starting within `[start, end]` that are not yet over
pub async fn starting_between(
    pool: &SqlitePool,
    start: &str,
    end: &str,
    today: &str,
) -> Result<Vec<AcademicEvent>> {
    let events = sqlx::query_as::<_, AcademicEvent>(
        r#"
        SELECT id, title, description, event_type, event_start_date, event_end_date,
               event_start_time, event_end_time, status
        FROM academic_events
        WHERE status = 'active'
          AND event_start_date BETWEEN ? AND ?
          AND COALESCE(event_end_date, event_start_date) >= ?
        ORDER BY event_start_date ASC, event_start_time ASC
        "#,
    )
    .bind(start)
    .bind(end)
    .bind(today)
    .fetch_all(pool)
    .await?;
    Ok(events)
}

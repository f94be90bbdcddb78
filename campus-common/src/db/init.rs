//! Database initialization
//!
//! Creates the database file on first run, applies the schema idempotently,
//! runs versioned migrations and seeds default settings.
//!
//! Invariant-bearing constraints live here, not in handler code:
//! - `enrollments UNIQUE(student_id, batch_id)`
//! - `batch_merge_members UNIQUE(batch_id)`
//! - `student_payment_locks UNIQUE(register_number, scope_key)`
//! - `student_course_payments UNIQUE(payment_id)`
//! - one scored submission per (student, content, batch)

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::{info, warn};

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                // Per-connection pragmas: every pooled connection must enforce
                // foreign keys and wait on the write lock instead of failing fast
                sqlx::query("PRAGMA foreign_keys = ON").execute(&mut *conn).await?;
                sqlx::query("PRAGMA busy_timeout = 5000").execute(&mut *conn).await?;
                Ok(())
            })
        })
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // WAL allows concurrent readers with one writer
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;

    create_schema(&pool).await?;

    crate::db::migrations::run_migrations(&pool).await?;

    init_default_settings(&pool).await?;

    Ok(pool)
}

/// Create every table and index (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS schema_version (
        version INTEGER PRIMARY KEY,
        applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS settings (
        key TEXT PRIMARY KEY,
        value TEXT,
        updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS states (
        state_id TEXT PRIMARY KEY,
        state_name TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS centers (
        center_id TEXT PRIMARY KEY,
        center_name TEXT NOT NULL,
        state TEXT REFERENCES states(state_id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_centers_state ON centers(state)",
    r#"
    CREATE TABLE IF NOT EXISTS courses (
        course_id TEXT PRIMARY KEY,
        course_name TEXT NOT NULL,
        type TEXT,
        language TEXT,
        level TEXT,
        mode TEXT,
        program TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS students (
        student_id TEXT PRIMARY KEY,
        registration_number TEXT UNIQUE,
        name TEXT NOT NULL,
        email TEXT,
        phone TEXT,
        center_id TEXT REFERENCES centers(center_id),
        state_id TEXT REFERENCES states(state_id),
        profile_picture TEXT,
        status INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS batches (
        batch_id TEXT PRIMARY KEY,
        batch_name TEXT NOT NULL,
        course_id TEXT REFERENCES courses(course_id),
        center_id TEXT REFERENCES centers(center_id),
        teacher_name TEXT,
        max_students INTEGER,
        status TEXT NOT NULL DEFAULT 'Pending',
        start_date TEXT,
        end_date TEXT,
        time_from TEXT,
        time_to TEXT,
        duration INTEGER,
        total_sessions INTEGER,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_batches_center ON batches(center_id, status)",
    r#"
    CREATE TABLE IF NOT EXISTS batch_merge_members (
        merge_group_id TEXT NOT NULL,
        batch_id TEXT NOT NULL UNIQUE REFERENCES batches(batch_id),
        PRIMARY KEY (merge_group_id, batch_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS enrollments (
        enrollment_id TEXT PRIMARY KEY,
        student_id TEXT NOT NULL,
        batch_id TEXT NOT NULL REFERENCES batches(batch_id),
        status INTEGER NOT NULL DEFAULT 0,
        is_permanent INTEGER NOT NULL DEFAULT 0,
        end_date TEXT,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        UNIQUE (student_id, batch_id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_enrollments_batch ON enrollments(batch_id)",
    r#"
    CREATE TABLE IF NOT EXISTS student_payment_locks (
        lock_id TEXT PRIMARY KEY,
        register_number TEXT NOT NULL,
        scope_key TEXT NOT NULL,
        payment_type TEXT NOT NULL CHECK (payment_type IN ('full', 'emi')),
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        UNIQUE (register_number, scope_key)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS student_course_payments (
        payment_id TEXT PRIMARY KEY,
        order_id TEXT,
        enrollment_id TEXT,
        registration_number TEXT,
        student_name TEXT,
        email TEXT,
        contact TEXT,
        course_name TEXT,
        course_duration INTEGER NOT NULL DEFAULT 0,
        original_fees REAL NOT NULL DEFAULT 0,
        discount_percentage REAL NOT NULL DEFAULT 0,
        final_fees REAL NOT NULL DEFAULT 0,
        payment_type TEXT NOT NULL DEFAULT 'full',
        emi_duration INTEGER,
        current_emi INTEGER,
        bank_rrn TEXT,
        status INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_payments_registration ON student_course_payments(registration_number)",
    r#"
    CREATE TABLE IF NOT EXISTS notes (
        note_id TEXT PRIMARY KEY,
        batch_id TEXT NOT NULL REFERENCES batches(batch_id),
        title TEXT NOT NULL,
        link TEXT,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS gmeets (
        meet_id TEXT PRIMARY KEY,
        batch_id TEXT NOT NULL REFERENCES batches(batch_id),
        title TEXT,
        meet_link TEXT NOT NULL,
        date TEXT NOT NULL,
        time TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS attendance_sessions (
        id TEXT PRIMARY KEY,
        batch_id TEXT NOT NULL REFERENCES batches(batch_id),
        session_date TEXT NOT NULL,
        notes TEXT,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS attendance_records (
        id TEXT PRIMARY KEY,
        session_id TEXT NOT NULL REFERENCES attendance_sessions(id),
        student_id TEXT NOT NULL,
        status TEXT NOT NULL CHECK (status IN ('present', 'absent', 'late', 'excused')),
        marked_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        UNIQUE (session_id, student_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS lsrw_content (
        id TEXT PRIMARY KEY,
        course_id TEXT REFERENCES courses(course_id),
        module_type TEXT NOT NULL CHECK (module_type IN ('listening', 'speaking', 'reading', 'writing')),
        title TEXT NOT NULL,
        instruction TEXT,
        media_url TEXT,
        session_number INTEGER,
        questions TEXT NOT NULL DEFAULT '[]',
        max_marks INTEGER,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS lsrw_batch_mapping (
        lsrw_content_id TEXT NOT NULL REFERENCES lsrw_content(id),
        batch_id TEXT NOT NULL REFERENCES batches(batch_id),
        student_visible INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        PRIMARY KEY (lsrw_content_id, batch_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS lsrw_student_answers (
        id TEXT PRIMARY KEY,
        student_id TEXT NOT NULL,
        lsrw_content_id TEXT NOT NULL REFERENCES lsrw_content(id),
        batch_id TEXT NOT NULL,
        answers TEXT NOT NULL,
        score INTEGER NOT NULL,
        max_marks INTEGER NOT NULL,
        submitted_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        verified INTEGER NOT NULL DEFAULT 0,
        verified_at TEXT,
        UNIQUE (student_id, lsrw_content_id, batch_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS task_submissions (
        id TEXT PRIMARY KEY,
        student_id TEXT NOT NULL,
        lsrw_content_id TEXT NOT NULL REFERENCES lsrw_content(id),
        batch_id TEXT NOT NULL,
        artifact_url TEXT NOT NULL,
        response_text TEXT,
        score INTEGER,
        feedback TEXT,
        submitted_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        verified INTEGER NOT NULL DEFAULT 0,
        verified_at TEXT,
        UNIQUE (student_id, lsrw_content_id, batch_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS notifications (
        id TEXT PRIMARY KEY,
        student_id TEXT NOT NULL,
        message TEXT NOT NULL,
        kind TEXT,
        related_id TEXT,
        is_read INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_notifications_student ON notifications(student_id, is_read)",
    r#"
    CREATE TABLE IF NOT EXISTS academic_events (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT,
        event_type TEXT,
        event_start_date TEXT NOT NULL,
        event_end_date TEXT,
        event_start_time TEXT,
        event_end_time TEXT,
        status TEXT NOT NULL DEFAULT 'active',
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_events_start ON academic_events(status, event_start_date)",
    r#"
    CREATE TABLE IF NOT EXISTS assessment_marks (
        id TEXT PRIMARY KEY,
        student_id TEXT NOT NULL,
        batch_id TEXT NOT NULL REFERENCES batches(batch_id),
        listening REAL,
        speaking REAL,
        reading REAL,
        writing REAL,
        total_marks REAL,
        remarks TEXT,
        status TEXT NOT NULL DEFAULT 'draft' CHECK (status IN ('draft', 'submitted')),
        updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        UNIQUE (student_id, batch_id)
    )
    "#,
];

/// Initialize or update default settings
async fn init_default_settings(pool: &SqlitePool) -> Result<()> {
    ensure_setting(pool, "default_max_students", "10").await?;
    ensure_setting(pool, "db_max_lock_wait_ms", "5000").await?;
    ensure_setting(pool, "currency", "INR").await?;

    info!("Default settings initialized");
    Ok(())
}

/// Ensure a setting exists with the specified default value
///
/// If the setting doesn't exist, it will be created with the default.
/// If the setting exists but has a NULL value, it will be reset to the default.
pub async fn ensure_setting(pool: &SqlitePool, key: &str, default_value: &str) -> Result<()> {
    let inserted = sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?, ?)")
        .bind(key)
        .bind(default_value)
        .execute(pool)
        .await?
        .rows_affected();

    if inserted > 0 {
        info!("Initialized setting '{}' with default value: {}", key, default_value);
        return Ok(());
    }

    let reset = sqlx::query("UPDATE settings SET value = ? WHERE key = ? AND value IS NULL")
        .bind(default_value)
        .bind(key)
        .execute(pool)
        .await?
        .rows_affected();

    if reset > 0 {
        warn!("Setting '{}' was NULL, reset to default: {}", key, default_value);
    }

    Ok(())
}

/// Read a setting value, if present
pub async fn get_setting(pool: &SqlitePool, key: &str) -> Result<Option<String>> {
    let value: Option<Option<String>> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(pool)
            .await?;
    Ok(value.flatten())
}

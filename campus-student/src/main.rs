//! campus-student - student-facing LMS backend
//!
//! Serves enrollment, class materials, attendance, payments and the
//! learning-skill modules over HTTP. Student identity is supplied by the
//! authenticating proxy in front of this service.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use campus_common::config::{load_toml_config, split_list, CampusConfig, ConfigOverrides};
use campus_common::db::init_database;
use campus_student::gateway::RazorpayClient;
use campus_student::services::enrollment;
use campus_student::{build_router, AppState};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for campus-student
#[derive(Parser, Debug)]
#[command(name = "campus-student")]
#[command(about = "Student backend for the campus LMS")]
#[command(version)]
struct Args {
    /// TOML config file (default: per-user, then /etc/campus/campus.toml)
    #[arg(short, long, env = "CAMPUS_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database file
    #[arg(short, long, env = "CAMPUS_DATABASE")]
    database: Option<PathBuf>,

    /// Listen address, e.g. 0.0.0.0:3006
    #[arg(short, long, env = "CAMPUS_BIND")]
    bind: Option<String>,

    /// Comma-separated course names enrolled as approved and permanent
    #[arg(long, env = "CAMPUS_FREE_COURSES")]
    free_courses: Option<String>,

    /// Comma-separated allowed CORS origins (any origin when unset)
    #[arg(long, env = "CAMPUS_CORS_ORIGINS")]
    cors_origins: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "campus_student=info,campus_common=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Build identification first, before any slow startup work
    info!(
        "Starting campus-student v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    let toml_config = load_toml_config(args.config.as_deref()).context("Failed to load config")?;
    let overrides = ConfigOverrides {
        database_path: args.database,
        bind: args.bind,
        free_courses: args.free_courses.as_deref().map(split_list),
        cors_origins: args.cors_origins.as_deref().map(split_list),
    };
    let config = CampusConfig::resolve(overrides, toml_config).context("Invalid configuration")?;
    info!("Database path: {}", config.database_path.display());
    info!("Free courses: {:?}", config.free_courses);
    if config.razorpay.key_secret.is_none() {
        warn!("Razorpay credentials not configured; payment endpoints will fail");
    }

    let pool = init_database(&config.database_path)
        .await
        .context("Failed to initialize database")?;
    info!("✓ Database ready");

    match enrollment::expire_all_stale(&pool).await {
        Ok(count) => info!("Expired {} lapsed enrollments at startup", count),
        Err(e) => error!("Startup expiry sweep failed: {}", e),
    }

    let gateway = RazorpayClient::new(&config.razorpay).context("Failed to build payment client")?;

    let bind = config.bind.clone();
    let state = AppState::new(pool, config, Arc::new(gateway));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(bind.as_str())
        .await
        .with_context(|| format!("Failed to bind to {}", bind))?;
    info!("campus-student listening on http://{}", bind);
    info!("Health check: http://{}/health", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}

//! # Biblio Library API
//!
//! REST server for library circulation.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Library API Server                               │
//! │                                                                         │
//! │  Client ───► HTTP (3000) ───► Handlers ───► Circulation ───► SQLite    │
//! │    ▲                                             │                      │
//! │    │                                             ▼                      │
//! │    └───────────── /ws ◄─────────────── ChangeNotifier                   │
//! │               (book-updated)           (broadcast)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use library_api::auth::hash_password;
use library_api::config::ApiConfig;
use library_api::routes::router;
use library_api::AppState;
use biblio_core::Role;
use biblio_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("Starting Biblio Library API server...");

    // Load configuration
    let config = ApiConfig::load()?;
    info!(
        port = config.http_port,
        db_path = %config.database_path,
        "Configuration loaded"
    );

    // Connect to database (runs migrations)
    let db = Database::new(DbConfig::new(&config.database_path)).await?;
    info!("Connected to SQLite, migrations complete");

    // Seed an admin account on first startup
    seed_admin(&db, &config).await?;

    // Create shared state and router
    let state = AppState::new(db, config.clone());
    let app = router(state);

    // Start server
    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "Starting HTTP server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Creates the configured admin account when no admin exists yet.
async fn seed_admin(db: &Database, config: &ApiConfig) -> Result<(), Box<dyn std::error::Error>> {
    if db.users().has_admin().await? {
        return Ok(());
    }

    let password_hash = hash_password(&config.seed_admin_password)
        .map_err(|e| format!("Failed to hash seed admin password: {e}"))?;

    match db
        .users()
        .create(
            &config.seed_admin_name,
            &config.seed_admin_email,
            &password_hash,
            Role::Admin,
        )
        .await
    {
        Ok(user) => {
            info!(user_id = %user.id, email = %user.email, "Seeded admin account");
            Ok(())
        }
        // The email may exist as a non-admin account; leave it alone
        Err(biblio_db::DbError::UniqueViolation { .. }) => {
            warn!(
                email = %config.seed_admin_email,
                "Seed admin email already registered, skipping seed"
            );
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}

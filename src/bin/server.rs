//! Scanlist Server
//!
//! Stores users and checklists in SQLite and serves them over a JSON API.
//!
//! # Configuration
//!
//! Environment variables:
//! - `SCANLIST_PORT`: Port to listen on (default: 5000)
//! - `SCANLIST_DATABASE_PATH`: SQLite database file
//!   (default: ~/.local/share/scanlist-server/scanlist.db)
//! - `RUST_LOG`: Log filter (default: scanlist_server=info,scanlist=info,tower_http=info)

use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scanlist::db::init_db;
use scanlist::server::{router, AppState};

/// Server configuration
#[derive(Debug, Clone)]
struct Config {
    /// Port to listen on
    port: u16,
    /// Path to the SQLite database
    database_path: PathBuf,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Self {
        let port = std::env::var("SCANLIST_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(5000);

        let database_path = std::env::var("SCANLIST_DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::data_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("scanlist-server")
                    .join("scanlist.db")
            });

        Self {
            port,
            database_path,
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "scanlist_server=info,scanlist=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();
    tracing::info!("Database: {}", config.database_path.display());

    let pool = match init_db(&config.database_path).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to open database: {}", e);
            std::process::exit(1);
        }
    };

    let app = router(AppState::sqlite(pool));

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Starting server on {}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

//! Laurel - achievement tracking backend

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use laurel::config::Args;
use laurel::db::{connect_postgres, MongoClient};
use laurel::server::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing/logging
    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("laurel={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Validate configuration
    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    // Print startup banner
    info!("======================================");
    info!("  Laurel - achievement tracking");
    info!("======================================");
    info!("Node ID: {}", args.node_id);
    info!("Listen: {}", args.listen);
    info!(
        "Mode: {}",
        if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" }
    );
    info!("MongoDB: {}", args.mongodb_uri);
    info!("Uploads: {}", args.uploads_dir);
    info!("======================================");

    // Connect to Postgres (workflow state, accounts, directory)
    let pg_pool = match connect_postgres(&args.database_url, args.database_max_connections).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Postgres connection failed: {}", e);
            std::process::exit(1);
        }
    };

    // Apply pending schema migrations
    if let Err(e) = sqlx::migrate!().run(&pg_pool).await {
        error!("Migration failed: {}", e);
        std::process::exit(1);
    }

    // Connect to MongoDB (achievement content)
    let mongo = match MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await {
        Ok(client) => client,
        Err(e) => {
            error!("MongoDB connection failed: {}", e);
            std::process::exit(1);
        }
    };

    // Wire services and serve
    let state = AppState::new(args, pg_pool, mongo).await?;
    server::run(Arc::new(state)).await?;

    Ok(())
}

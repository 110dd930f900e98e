use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use phrm_api::cli::{Cli, Commands};
use phrm_api::config::AppConfig;
use phrm_api::database::Database;
use phrm_api::database::models::NewUser;
use phrm_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, SECRET_KEY, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("phrm_api=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env();
    tracing::info!("Starting PHRM API in {:?} mode", config.environment);

    if std::env::var("SECRET_KEY").map_or(true, |v| v.trim().is_empty()) && !config.is_development() {
        tracing::warn!("SECRET_KEY is not set; using a generated key, tokens will not survive a restart");
    }

    let db = Database::connect(&config.database)
        .await
        .context("failed to open database")?;
    db.migrate().await.context("failed to create schema")?;

    match cli.command() {
        Commands::Migrate => {
            tracing::info!("Schema ready at {}", config.database.url);
        }
        Commands::CreateSuperuser { email, password } => {
            create_superuser(AppState::new(config, db.clone()), email, password).await?;
        }
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.api.host = host;
            }
            if let Some(port) = port {
                config.api.port = port;
            }
            serve(AppState::new(config, db.clone())).await?;
        }
    }

    db.close().await;
    Ok(())
}

async fn serve(state: AppState) -> anyhow::Result<()> {
    let bind_addr = format!("{}:{}", state.config.api.host, state.config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("PHRM API listening on http://{}", bind_addr);

    axum::serve(listener, phrm_api::app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}

async fn create_superuser(state: AppState, email: String, password: String) -> anyhow::Result<()> {
    let users = state.users();
    let user = match users.find_by_email(&email).await? {
        Some(user) => user,
        None => {
            users
                .create(NewUser {
                    email: email.clone(),
                    password,
                    full_name: None,
                    phone_number: None,
                    date_of_birth: None,
                })
                .await?
        }
    };

    users
        .set_superuser(user.id, true)
        .await?
        .with_context(|| format!("user {} disappeared", email))?;
    tracing::info!("User {} ({}) is now a superuser", user.id, email);
    Ok(())
}

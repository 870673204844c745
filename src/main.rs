//! Passkeeper CLI entry point

mod cli;

use crate::cli::{AppCommands, Cli, Commands};
use anyhow::{Context, Result};
use clap::Parser;
use passkeeper::auth::{AuthService, Hasher, TokenCodec};
use passkeeper::domain::App;
use passkeeper::rpc::{ApiServer, ApiServerConfig};
use passkeeper::store::{AppStore, MemoryStore, PostgresConfig, PostgresStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // Helper to get database config lazily (only when needed)
    let get_db_config = || -> Result<PostgresConfig> {
        if let Some(url) = &cli.database_url {
            PostgresConfig::from_url(url).context("Invalid DATABASE_URL")
        } else {
            PostgresConfig::from_env().context("DATABASE_URL not set")
        }
    };

    match cli.command {
        Commands::Serve {
            bind,
            token_ttl,
            in_memory,
        } => {
            let db_config = if in_memory { None } else { Some(get_db_config()?) };
            serve(db_config, bind, token_ttl).await
        }
        Commands::Init => init(get_db_config()?).await,
        Commands::App { command } => app(get_db_config()?, command).await,
        Commands::Register { login, password } => {
            register(get_db_config()?, login, password).await
        }
        Commands::Status => status(get_db_config()?).await,
    }
}

async fn serve(db_config: Option<PostgresConfig>, bind: String, token_ttl: u64) -> Result<()> {
    let bind_addr = bind.parse().context("Invalid bind address")?;
    let config = ApiServerConfig {
        bind_addr,
        token_ttl: Duration::from_secs(token_ttl),
    };

    let server = match db_config {
        Some(db_config) => {
            let store = Arc::new(PostgresStore::new(db_config).await?);
            ApiServer::new(config, store.clone(), store.clone(), store, Hasher::new())?
        }
        None => {
            info!("Using in-memory store; data will not survive a restart");
            let store = Arc::new(MemoryStore::new());
            ApiServer::new(config, store.clone(), store.clone(), store, Hasher::new())?
        }
    };

    info!("Starting passkeeper server...");
    server.run().await?;

    Ok(())
}

async fn init(db_config: PostgresConfig) -> Result<()> {
    let _store = PostgresStore::new(db_config).await?;
    println!("Database schema initialized successfully");
    Ok(())
}

async fn app(db_config: PostgresConfig, command: AppCommands) -> Result<()> {
    let store = PostgresStore::new(db_config).await?;

    match command {
        AppCommands::Add { id, name, secret } => {
            store.put_app(App { id, name: name.clone(), secret }).await?;

            println!("Provisioned application {} ({})", id, name);
        }
        AppCommands::Show { id } => {
            let app = store.app(id).await?;

            // The secret stays server-side.
            println!("Application: {}", app.id);
            println!("Name: {}", app.name);
        }
    }

    Ok(())
}

async fn register(db_config: PostgresConfig, login: String, password: String) -> Result<()> {
    let store = Arc::new(PostgresStore::new(db_config).await?);
    let codec = Arc::new(TokenCodec::new(store.clone()));
    let auth = AuthService::new(
        store.clone(),
        store,
        codec,
        Hasher::new(),
        Duration::from_secs(3600),
    )?;

    let user_id = auth.register(&login, &password).await?;

    println!("{}", user_id);
    Ok(())
}

async fn status(db_config: PostgresConfig) -> Result<()> {
    let _store = PostgresStore::new(db_config).await?;

    println!("Passkeeper Status");
    println!("=================");
    println!("Database: Connected");

    Ok(())
}

//! Passkeeper daemon - password manager API server

use anyhow::{Context, Result};
use passkeeper::auth::Hasher;
use passkeeper::rpc::{ApiServer, ApiServerConfig};
use passkeeper::store::{MemoryStore, PostgresConfig, PostgresStore};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "passkeeperd")]
#[command(about = "Passkeeper password manager daemon")]
#[command(version)]
struct Args {
    /// Address to bind to
    #[arg(short, long, default_value = "0.0.0.0:8080", env = "PASSKEEPER_BIND")]
    bind: String,

    /// Session token lifetime in seconds
    #[arg(long, default_value_t = 3600, env = "PASSKEEPER_TOKEN_TTL")]
    token_ttl: u64,

    /// Database URL
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Use the in-memory store instead of Postgres (volatile)
    #[arg(long)]
    in_memory: bool,

    /// Run as daemon (background)
    #[arg(short, long)]
    daemon: bool,

    /// PID file path (only with --daemon)
    #[arg(long, env = "PASSKEEPER_PIDFILE")]
    pidfile: Option<PathBuf>,

    /// Log level
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Daemonize if requested
    if args.daemon {
        daemonize(&args)?;
    }

    run_server(args).await
}

fn daemonize(args: &Args) -> Result<()> {
    use std::fs::File;
    use std::io::Write;

    // Fork and detach
    match unsafe { libc::fork() } {
        -1 => return Err(anyhow::anyhow!("Fork failed")),
        0 => {
            // Child process - continue
        }
        pid => {
            // Parent process - write pidfile and exit
            if let Some(pidfile) = &args.pidfile {
                let mut f = File::create(pidfile)
                    .with_context(|| format!("Failed to create pidfile: {:?}", pidfile))?;
                writeln!(f, "{}", pid)?;
            }
            info!(pid = pid, "Daemon started");
            std::process::exit(0);
        }
    }

    // Create new session
    if unsafe { libc::setsid() } == -1 {
        return Err(anyhow::anyhow!("setsid failed"));
    }

    // Change to root directory
    std::env::set_current_dir("/")?;

    // Close standard file descriptors
    unsafe {
        libc::close(0);
        libc::close(1);
        libc::close(2);
    }

    Ok(())
}

async fn run_server(args: Args) -> Result<()> {
    // Parse bind address
    let bind_addr = args.bind.parse().context("Invalid bind address")?;

    let config = ApiServerConfig {
        bind_addr,
        token_ttl: Duration::from_secs(args.token_ttl),
    };

    // Build the server over the selected store
    let server = if args.in_memory {
        info!("Using in-memory store; data will not survive a restart");
        let store = Arc::new(MemoryStore::new());
        ApiServer::new(config, store.clone(), store.clone(), store, Hasher::new())?
    } else {
        let db_config = match &args.database_url {
            Some(url) => PostgresConfig::from_url(url).context("Invalid DATABASE_URL")?,
            None => PostgresConfig::from_env().context("DATABASE_URL not set")?,
        };
        let store = Arc::new(PostgresStore::new(db_config).await?);
        ApiServer::new(config, store.clone(), store.clone(), store, Hasher::new())?
    };

    info!(addr = %args.bind, "Passkeeper daemon starting");

    // Run server with graceful shutdown on signals
    tokio::select! {
        result = server.run() => {
            result?;
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received, stopping server");
        }
    }

    // Cleanup pidfile if it exists
    if let Some(pidfile) = &args.pidfile {
        if pidfile.exists() {
            if let Err(e) = std::fs::remove_file(pidfile) {
                warn!(error = %e, "Failed to remove pidfile");
            }
        }
    }

    info!("Passkeeper daemon stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

//! CLI command definitions

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "passkeeper")]
#[command(about = "Password manager backend", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database URL
    #[arg(long, env = "DATABASE_URL", global = true)]
    pub database_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the API server
    Serve {
        /// Address to bind to
        #[arg(short, long, default_value = "0.0.0.0:8080", env = "PASSKEEPER_BIND")]
        bind: String,

        /// Session token lifetime in seconds
        #[arg(long, default_value_t = 3600, env = "PASSKEEPER_TOKEN_TTL")]
        token_ttl: u64,

        /// Use the in-memory store instead of Postgres (volatile)
        #[arg(long)]
        in_memory: bool,
    },

    /// Initialize the database schema
    Init,

    /// Manage applications (API consumers and their signing secrets)
    App {
        #[command(subcommand)]
        command: AppCommands,
    },

    /// Register a user
    Register {
        /// Login name
        #[arg(long)]
        login: String,

        /// Password (hashed before it reaches storage)
        #[arg(long)]
        password: String,
    },

    /// Show server status
    Status,
}

#[derive(Subcommand)]
pub enum AppCommands {
    /// Provision an application and its signing secret
    ///
    /// Examples:
    ///   passkeeper app add --id 1 --name web --secret "$(openssl rand -hex 32)"
    Add {
        /// Application id (clients send this at login)
        #[arg(long)]
        id: i64,

        /// Human-readable name
        #[arg(long)]
        name: String,

        /// Token signing secret
        #[arg(long, env = "PASSKEEPER_APP_SECRET")]
        secret: String,
    },

    /// Show an application (never prints the secret)
    Show {
        /// Application id
        id: i64,
    },
}

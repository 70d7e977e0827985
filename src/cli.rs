use clap::{Parser, Subcommand};

/// apollo-proxy: authenticated proxy for the Apollo.io CRM API
#[derive(Parser)]
#[command(name = "apollo-proxy", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the proxy server
    Serve {
        /// Port to bind (defaults to APOLLO_PROXY_PORT)
        #[arg(short, long)]
        port: Option<u16>,
        /// Keep users in memory instead of Postgres (local development only)
        #[arg(long, env = "APOLLO_PROXY_IN_MEMORY")]
        in_memory: bool,
    },

    /// Manage registered users
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Apply pending database migrations and exit
    Migrate,
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Register a user with their Apollo.io API key
    Add {
        #[arg(long)]
        email: String,
        #[arg(long)]
        api_key: String,
    },
    /// List registered users (keys are masked)
    List,
    /// Check a user's API key against Apollo.io now
    Check {
        #[arg(long)]
        email: String,
    },
    /// Replace a user's stored API key
    SetKey {
        #[arg(long)]
        email: String,
        #[arg(long)]
        api_key: String,
    },
}

//! CLI command definitions for the `chatify` binary.

pub mod db;
pub mod user;

use clap::{Parser, Subcommand};

/// One-to-one chat server.
#[derive(Parser)]
#[command(name = "chatify", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true, env = "CHATIFY_OTEL")]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the WebSocket chat server.
    Serve {
        /// Port to listen on (overrides config.toml).
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (overrides config.toml).
        #[arg(long)]
        host: Option<String>,
    },

    /// Create the database and run migrations.
    InitDb,

    /// Register a user account.
    SeedUser {
        /// First name.
        #[arg(long)]
        first: String,

        /// Last name.
        #[arg(long)]
        last: String,

        /// Country calling code, e.g. +94.
        #[arg(long)]
        country_code: String,

        /// Phone number without the country code.
        #[arg(long)]
        contact_no: String,
    },
}

//! Chatify server and admin CLI entry point.
//!
//! Binary name: `chatify`
//!
//! Parses CLI arguments, loads `config.toml` from the data directory, opens
//! the database, then either serves the chat WebSocket or runs an admin
//! command.

mod cli;
mod http;
mod state;

use clap::Parser;

use chatify_infra::config::{load_server_config, resolve_data_dir};
use chatify_observe::TracingOptions;
use chatify_types::user::NewUser;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut tracing_options = TracingOptions::from_verbosity(cli.verbose, cli.quiet);
    tracing_options.json = cli.log_json;
    tracing_options.otel = cli.otel;
    chatify_observe::init_tracing(&tracing_options)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let data_dir = resolve_data_dir();
    let mut config = load_server_config(&data_dir).await;

    if let Commands::Serve { port, host } = &cli.command {
        if let Some(port) = port {
            config.port = *port;
        }
        if let Some(host) = host {
            config.host = host.clone();
        }
    }

    let state = AppState::init(data_dir, config).await?;

    let result = run(cli, state).await;
    chatify_observe::shutdown_tracing();
    result
}

async fn run(cli: Cli, state: AppState) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve { .. } => serve(state).await?,

        Commands::InitDb => cli::db::init_db(&state, cli.json)?,

        Commands::SeedUser {
            first,
            last,
            country_code,
            contact_no,
        } => {
            let user = NewUser {
                first_name: first,
                last_name: last,
                country_code,
                contact_no,
            };
            cli::user::seed_user(&state, user, cli.json).await?;
        }
    }

    Ok(())
}

async fn serve(state: AppState) -> anyhow::Result<()> {
    let addr = format!("{}:{}", state.config.host, state.config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!(
        "  {} Chatify listening on {}",
        console::style("⚡").bold(),
        console::style(format!("ws://{addr}/chat?userId=<id>")).cyan()
    );
    println!("  {}", console::style("Press Ctrl+C to stop").dim());
    tracing::info!(%addr, database = %state.database_url, "Server started");

    let store = state.store.clone();
    let router = http::router::build_router(state);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.pool().close().await;
    println!("\n  Server stopped.");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to install SIGTERM handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

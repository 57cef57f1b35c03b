#![cfg_attr(not(test), deny(clippy::panic))]

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use rift_signal::auth::InMemoryTokenValidator;
use rift_signal::config::{self, validate_config};
use rift_signal::logging;
use rift_signal::registry::Registry;
use rift_signal::relay::NullRelaySpawner;
use rift_signal::websocket::{create_router, AppState};

/// Rift Signal -- lightweight WebSocket signaling server for P2P game networking
#[derive(Parser, Debug)]
#[command(name = "rift-signald")]
#[command(about = "A lightweight, in-memory WebSocket signaling server for P2P lobbies")]
#[command(version)]
struct Cli {
    /// Validate configuration and exit without starting the server.
    #[arg(long, short = 'c', conflicts_with = "print_config")]
    validate_config: bool,

    /// Print the loaded configuration to stdout (as JSON) and exit.
    #[arg(long, conflicts_with = "validate_config")]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = Arc::new(config::load());

    if cli.print_config {
        let json = serde_json::to_string_pretty(&*cfg)
            .map_err(|e| anyhow::anyhow!("Failed to serialize config: {e}"))?;
        println!("{json}");
        return Ok(());
    }

    let validation_result = validate_config(&cfg);

    if cli.validate_config {
        match validation_result {
            Ok(()) => {
                println!("Configuration validation passed");
                println!();
                println!("Configuration summary:");
                println!("  Port: {}", cfg.port);
                println!("  CORS origins: {}", cfg.cors_origins);
                println!("  Auth required: {}", cfg.require_auth);
                println!("  Auth entries: {}", cfg.auth_entries.len());
                println!("  Keepalive payload length: {}", cfg.keepalive_payload_len);
                println!("  Max message bytes: {}", cfg.max_message_bytes);
                return Ok(());
            }
            Err(e) => {
                eprintln!("Configuration validation failed:\n{e}");
                std::process::exit(1);
            }
        }
    }

    validation_result?;

    logging::init_with_config(&cfg.logging);

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    tracing::info!(%addr, "Starting rift-signald");

    let auth = InMemoryTokenValidator::new(cfg.auth_entries.clone(), cfg.require_auth);
    let state = Arc::new(AppState {
        registry: Arc::new(Registry::new()),
        relay_spawner: Arc::new(NullRelaySpawner),
        auth: Arc::new(auth),
        config: cfg,
    });

    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Server started, WebSocket endpoint at /v1/ws");

    axum::serve(listener, router.into_make_service()).await?;

    Ok(())
}

#[cfg(test)]
mod cli_tests {
    use super::Cli;
    use clap::Parser;

    #[test]
    fn default_no_flags() {
        let cli = Cli::try_parse_from(["rift-signald"]).unwrap();
        assert!(!cli.validate_config);
        assert!(!cli.print_config);
    }

    #[test]
    fn validate_config_short_and_long() {
        assert!(Cli::try_parse_from(["rift-signald", "-c"])
            .unwrap()
            .validate_config);
        assert!(Cli::try_parse_from(["rift-signald", "--validate-config"])
            .unwrap()
            .validate_config);
    }

    #[test]
    fn print_config_flag() {
        assert!(Cli::try_parse_from(["rift-signald", "--print-config"])
            .unwrap()
            .print_config);
    }

    #[test]
    fn validate_and_print_config_conflict() {
        let result =
            Cli::try_parse_from(["rift-signald", "--validate-config", "--print-config"]);
        assert!(result.is_err());
    }
}

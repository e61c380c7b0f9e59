//! flintkv server
//!
//! Entry point: parses flags, sets up logging, opens the database (which
//! starts the TTL reaper) and accepts connections until Ctrl+C, then closes
//! the database so the reaper is stopped before exit.

use flintkv::commands::CommandHandler;
use flintkv::connection::{handle_connection, ConnectionStats};
use flintkv::storage::Db;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Server configuration
struct Config {
    /// Host to bind to
    host: String,
    /// Port to listen on
    port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: flintkv::DEFAULT_HOST.to_string(),
            port: flintkv::DEFAULT_PORT,
        }
    }
}

impl Config {
    /// Parse configuration from command-line arguments
    fn from_args() -> Self {
        let mut config = Config::default();
        let args: Vec<String> = std::env::args().collect();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--host" | "-h" => {
                    if i + 1 < args.len() {
                        config.host = args[i + 1].clone();
                        i += 2;
                    } else {
                        eprintln!("Error: --host requires a value");
                        std::process::exit(1);
                    }
                }
                "--port" | "-p" => {
                    if i + 1 < args.len() {
                        config.port = args[i + 1].parse().unwrap_or_else(|_| {
                            eprintln!("Error: invalid port number");
                            std::process::exit(1);
                        });
                        i += 2;
                    } else {
                        eprintln!("Error: --port requires a value");
                        std::process::exit(1);
                    }
                }
                "--help" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("flintkv version {}", flintkv::VERSION);
                    std::process::exit(0);
                }
                _ => {
                    eprintln!("Unknown argument: {}", args[i]);
                    print_help();
                    std::process::exit(1);
                }
            }
        }

        config
    }

    /// Returns the bind address as a string
    fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn print_help() {
    println!(
        r#"
flintkv - An In-Memory Key-Value and Queue Store

USAGE:
    flintkv [OPTIONS]

OPTIONS:
    -h, --host <HOST>    Host to bind to (default: 127.0.0.1)
    -p, --port <PORT>    Port to listen on (default: 7379)
    -v, --version        Print version information
        --help           Print this help message

COMMANDS (one per line, over TCP):
    SET <key> <value> [EX <seconds>] [NX|XX]
    GET <key>
    QPUSH <key> <value> [value ...]
    QPOP <key>
    BQPOP <key> <timeout>

EXAMPLES:
    flintkv                        # Start on 127.0.0.1:7379
    flintkv --port 7380            # Start on port 7380
    flintkv --host 0.0.0.0         # Listen on all interfaces
"#
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_args();

    let _subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    println!(
        "flintkv v{} - in-memory key-value and queue store",
        flintkv::VERSION
    );

    // The database is shared across all connections; opening it starts the
    // background TTL reaper.
    let db = Arc::new(Db::open());
    info!("database opened, TTL reaper running");

    let stats = Arc::new(ConnectionStats::new());

    let listener = TcpListener::bind(config.bind_address()).await?;
    info!("listening on {}", config.bind_address());

    let shutdown = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        info!("shutdown signal received, stopping server...");
    };

    tokio::select! {
        _ = accept_loop(listener, Arc::clone(&db), stats) => {}
        _ = shutdown => {}
    }

    // Stop the reaper before exiting; close waits for its acknowledgement.
    db.close().await;
    info!("server shutdown complete");
    Ok(())
}

/// Main loop that accepts incoming connections
async fn accept_loop(listener: TcpListener, db: Arc<Db>, stats: Arc<ConnectionStats>) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let handler = CommandHandler::new(Arc::clone(&db));
                let stats = Arc::clone(&stats);

                tokio::spawn(async move {
                    handle_connection(stream, addr, handler, stats).await;
                });
            }
            Err(e) => {
                error!("failed to accept connection: {}", e);
            }
        }
    }
}

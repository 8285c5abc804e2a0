//! LiveReload server binary.
//!
//! Listens for browsers and forwards `reload <path>` / `alert <message>`
//! lines from stdin, so any file watcher can drive it through a pipe.

mod cli;

use std::process::ExitCode;

use clap::Parser;
use lr_server::{LiveReloadServer, ServerResult};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinError;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let server = LiveReloadServer::new(cli.config());

    info!("  Client script: http://{}/livereload.js", cli.addr);
    info!("  WebSocket:     ws://{}/livereload", cli.addr);

    let mut serve = {
        let server = server.clone();
        tokio::spawn(async move { server.listen_and_serve().await })
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            result = &mut serve => return exit_code(result),
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) if line.trim().is_empty() => {}
                Ok(Some(line)) => match line.parse::<Command>() {
                    Ok(Command::Reload(path)) => server.reload(path),
                    Ok(Command::Alert(message)) => server.alert(message),
                    Err(e) => warn!("{}", e),
                },
                Ok(None) => {
                    info!("stdin closed, serving until interrupted");
                    stdin_open = false;
                }
                Err(e) => {
                    warn!("Failed to read stdin: {}", e);
                    stdin_open = false;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupt received");
                break;
            }
        }
    }

    if let Err(e) = server.shutdown() {
        warn!("Shutdown: {}", e);
    }
    exit_code(serve.await)
}

fn exit_code(result: Result<ServerResult<()>, JoinError>) -> ExitCode {
    match result {
        Ok(Ok(())) => ExitCode::SUCCESS,
        Ok(Err(e)) => {
            error!("Server error: {}", e);
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("Server task failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

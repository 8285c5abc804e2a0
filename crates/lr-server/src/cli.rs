//! Command-line arguments and stdin commands.

use std::net::SocketAddr;
use std::str::FromStr;

use clap::Parser;
use lr_server::{ServerConfig, DEFAULT_SERVER_NAME};
use thiserror::Error;

/// LiveReload server driven by commands on stdin.
///
/// Each line is either `reload <path>` or `alert <message>`.
#[derive(Parser, Debug, Clone)]
#[command(name = "lrserver")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Address to listen on.
    #[arg(short, long, env = "LRSERVER_ADDR", default_value = "0.0.0.0:35729")]
    pub addr: SocketAddr,

    /// Name reported to browsers.
    #[arg(short, long, env = "LRSERVER_NAME", default_value = DEFAULT_SERVER_NAME)]
    pub name: String,

    /// Always reload the whole page, even for stylesheets.
    #[arg(long)]
    pub no_live_css: bool,
}

impl Cli {
    /// Build the server configuration.
    pub fn config(&self) -> ServerConfig {
        ServerConfig::new(self.addr)
            .with_name(self.name.clone())
            .with_live_css(!self.no_live_css)
    }
}

/// A command read from stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Reload a path.
    Reload(String),
    /// Show a message.
    Alert(String),
}

/// Errors parsing a stdin command.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown verb.
    #[error("unknown command {0:?}, expected \"reload\" or \"alert\"")]
    Unknown(String),

    /// Verb without its argument.
    #[error("{0} needs an argument")]
    MissingArgument(&'static str),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();

        match verb {
            "reload" if rest.is_empty() => Err(CommandError::MissingArgument("reload")),
            "reload" => Ok(Self::Reload(rest.to_string())),
            "alert" if rest.is_empty() => Err(CommandError::MissingArgument("alert")),
            "alert" => Ok(Self::Alert(rest.to_string())),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

//! Command script parsing.
//!
//! A script is an ordered list of commands, one per line, of 3 or 4
//! whitespace-separated tokens: operation, resource path, host, and an
//! optional port defaulting to 8000.

use std::str::FromStr;

use thiserror::Error;
use tracing::warn;

/// Port assumed when a command does not name one
pub const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// GET the resource from the server and persist it locally
    Fetch,
    /// POST the local resource's bytes to the server
    Store,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub operation: Operation,
    pub target: String,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty command line")]
    Empty,

    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    #[error("missing resource path")]
    MissingTarget,

    #[error("missing host")]
    MissingHost,

    #[error("invalid port: {0}")]
    InvalidPort(String),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut tokens = line.split_whitespace();

        let operation = match tokens.next().ok_or(CommandError::Empty)? {
            "get" => Operation::Fetch,
            "post" => Operation::Store,
            other => return Err(CommandError::UnknownOperation(other.to_string())),
        };

        let target = tokens.next().ok_or(CommandError::MissingTarget)?.to_string();
        let host = tokens.next().ok_or(CommandError::MissingHost)?.to_string();
        let port = match tokens.next() {
            Some(token) => token.parse().map_err(|_| CommandError::InvalidPort(token.to_string()))?,
            None => DEFAULT_PORT,
        };

        Ok(Command { operation, target, host, port })
    }
}

/// Parses a whole script, keeping command order.
///
/// Blank lines are skipped; malformed lines are reported and skipped so one
/// bad command does not invalidate the rest of the script.
pub fn parse_script(text: &str) -> Vec<Command> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match line.parse::<Command>() {
            Ok(command) => Some(command),
            Err(e) => {
                warn!(line, cause = %e, "skipping malformed command");
                None
            }
        })
        .collect()
}

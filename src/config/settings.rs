//! Command-line and environment configuration.
//!
//! Every option can be given as a flag or through the environment variable of
//! the same name, so a plain `.env`-style deployment keeps working:
//!
//! ```text
//! IMAP_HOST=imap.example.com IMAP_USER=me IMAP_PASS=secret contact-harvest
//! ```

use std::fmt;
use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;
use thiserror::Error;

use crate::providers::email::{Credentials, ImapConfig, DEFAULT_IMAP_PORT};
use crate::services::DEFAULT_OUTPUT_DIR;

/// Configuration errors. All of them are fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Missing required environment variables: {}", .0.join(", "))]
    MissingVars(Vec<&'static str>),
    #[error("PORT must be a valid number")]
    InvalidPort(String),
}

/// Raw options as given on the command line or in the environment.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about = "Exports the senders of every IMAP mailbox as CSV", long_about = None)]
pub struct Cli {
    /// IMAP server host name
    #[clap(long, env = "IMAP_HOST")]
    pub host: Option<String>,

    /// IMAP server port (implicit TLS)
    #[clap(long, env = "PORT")]
    pub port: Option<String>,

    /// Account user name
    #[clap(long, env = "IMAP_USER")]
    pub user: Option<String>,

    /// Account password
    #[clap(long, env = "IMAP_PASS", hide_env_values = true)]
    pub password: Option<String>,

    /// Directory the CSV files are written to
    #[clap(long, env = "OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,
}

/// Validated configuration.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub user: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub output_dir: PathBuf,
}

impl Config {
    /// Validates raw options.
    ///
    /// Missing or empty host, user and password are reported together. An
    /// absent, empty or zero port means [`DEFAULT_IMAP_PORT`].
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let host = non_empty(cli.host);
        let user = non_empty(cli.user);
        let password = non_empty(cli.password);

        let missing: Vec<&'static str> = [
            ("IMAP_HOST", host.is_none()),
            ("IMAP_USER", user.is_none()),
            ("IMAP_PASS", password.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, is_missing)| is_missing.then_some(name))
        .collect();

        match (host, user, password) {
            (Some(host), Some(user), Some(password)) => Ok(Self {
                host,
                port: parse_port(cli.port.as_deref())?,
                user,
                password,
                output_dir: cli.output_dir,
            }),
            _ => Err(ConfigError::MissingVars(missing)),
        }
    }

    /// Connection settings for the IMAP session.
    pub fn imap(&self) -> ImapConfig {
        ImapConfig::new(self.host.clone(), self.port)
    }

    /// Login credentials.
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.user.clone(), self.password.clone())
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("output_dir", &self.output_dir)
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn parse_port(raw: Option<&str>) -> Result<u16, ConfigError> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(DEFAULT_IMAP_PORT),
        Some(raw) => raw,
    };

    match raw.parse::<u16>() {
        Ok(0) => Ok(DEFAULT_IMAP_PORT),
        Ok(port) => Ok(port),
        Err(_) => Err(ConfigError::InvalidPort(raw.to_string())),
    }
}

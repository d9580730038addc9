//! Command line and environment configuration for the murmur server.

use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

pub(crate) const DEFAULT_BIND: &str = "127.0.0.1:3000";
pub(crate) const DEFAULT_DATABASE: &str = "./murmur.db";
pub(crate) const DEFAULT_CLIENT_ORIGIN: &str = "http://localhost:5173";
pub(crate) const DEFAULT_CALLBACK_URL: &str = "http://localhost:3000/api/auth/github/callback";

/// REST backend for the murmur social network.
///
/// Configuration can be set via CLI arguments or environment variables.
/// CLI arguments take precedence over environment variables. Secrets are
/// only read from the environment.
#[derive(Parser, Debug, Default)]
#[command(name = "murmur", version, about)]
pub struct Cli {
    /// HTTP server bind address [env: MURMUR_BIND] [default: 127.0.0.1:3000]
    #[arg(long, short = 'b')]
    pub bind: Option<String>,

    /// SQLite database file [env: MURMUR_DATABASE] [default: ./murmur.db]
    #[arg(long, short = 'd')]
    pub database: Option<PathBuf>,

    /// Origin of the browser client, used for CORS and login redirects
    /// [env: CLIENT_ORIGIN] [default: http://localhost:5173]
    #[arg(long, short = 'o')]
    pub client_origin: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub database: PathBuf,
    pub client_origin: String,
    pub jwt_secret: String,
    pub github_client_id: String,
    pub github_client_secret: String,
    pub github_callback_url: String,
}

impl Config {
    pub fn from_cli_and_env(cli: Cli) -> Result<Self, ConfigError> {
        Self::from_cli_and_lookup(cli, |key| std::env::var(key).ok())
    }

    /// Same resolution as [`Config::from_cli_and_env`] with an injectable
    /// variable source.
    pub fn from_cli_and_lookup<F>(cli: Cli, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = cli
            .bind
            .or_else(|| non_empty("MURMUR_BIND"))
            .unwrap_or_else(|| DEFAULT_BIND.to_string());

        let database = cli
            .database
            .or_else(|| non_empty("MURMUR_DATABASE").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE));

        let client_origin = cli
            .client_origin
            .or_else(|| non_empty("CLIENT_ORIGIN"))
            .unwrap_or_else(|| DEFAULT_CLIENT_ORIGIN.to_string())
            .trim_end_matches('/')
            .to_string();
        if url::Url::parse(&client_origin).is_err() {
            return Err(ConfigError::Invalid {
                name: "CLIENT_ORIGIN",
                reason: format!("'{client_origin}' is not a URL"),
            });
        }

        let jwt_secret = non_empty("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        let github_client_id =
            non_empty("GITHUB_CLIENT_ID").ok_or(ConfigError::Missing("GITHUB_CLIENT_ID"))?;
        let github_client_secret = non_empty("GITHUB_CLIENT_SECRET")
            .ok_or(ConfigError::Missing("GITHUB_CLIENT_SECRET"))?;
        let github_callback_url =
            non_empty("GITHUB_CALLBACK_URL").unwrap_or_else(|| DEFAULT_CALLBACK_URL.to_string());

        Ok(Self {
            bind_addr,
            database,
            client_origin,
            jwt_secret,
            github_client_id,
            github_client_secret,
            github_callback_url,
        })
    }
}

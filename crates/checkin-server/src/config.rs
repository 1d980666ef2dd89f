use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::warn;

/// Session secret used when none is configured. Fine for local runs only.
const DEV_SESSION_SECRET: &str = "dev-secret-change-me";

pub struct Config {
    pub db_path: PathBuf,
    pub addr: SocketAddr,
    pub session_secret: String,
}

impl Config {
    /// Read settings from the environment (after `.env` has been loaded).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let db_path = var("CHECKIN_DB_PATH").unwrap_or_else(|| "checkin.db".into());
        let host = var("CHECKIN_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = var("CHECKIN_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("CHECKIN_PORT must be a port number")?;

        let session_secret = match var("CHECKIN_SESSION_SECRET") {
            Some(secret) if !secret.is_empty() => secret,
            _ => {
                warn!("CHECKIN_SESSION_SECRET not set, using the development secret");
                DEV_SESSION_SECRET.to_string()
            }
        };

        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .context("CHECKIN_HOST must be an IP address")?;

        Ok(Self {
            db_path: db_path.into(),
            addr,
            session_secret,
        })
    }
}

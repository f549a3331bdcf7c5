//! Process configuration loaded from environment variables.
//!
//! All values are read once at startup. `BOT_TOKEN` is the only required
//! variable; everything else degrades gracefully when absent.

use anyhow::{bail, Context, Result};
use std::env;

/// Runtime configuration for the storefront bot.
#[derive(Debug, Clone)]
pub struct Config {
    /// Telegram bot token. Required.
    pub bot_token: String,
    /// Chat id of the operator who reviews orders. When unset, admin
    /// notifications are skipped and admin actions are refused.
    pub admin_chat_id: Option<i64>,
    /// Display-only UPI payment destination.
    pub upi_id: Option<String>,
    /// Display-only Binance payment destination.
    pub binance_id: Option<String>,
    /// SQLite database file path.
    pub db_path: String,
    /// Port for the liveness probe endpoint.
    pub health_port: u16,
}

impl Config {
    /// Read configuration from the process environment.
    ///
    /// Fails only when `BOT_TOKEN` is missing or an optional numeric value
    /// does not parse.
    pub fn from_env() -> Result<Self> {
        let bot_token = env::var("BOT_TOKEN").unwrap_or_default().trim().to_string();
        if bot_token.is_empty() {
            bail!("BOT_TOKEN is required. Set the BOT_TOKEN environment variable.");
        }

        let admin_chat_id = non_empty(env::var("ADMIN_CHAT_ID").ok())
            .map(|v| v.parse::<i64>())
            .transpose()
            .context("ADMIN_CHAT_ID must be a numeric chat id")?;

        let health_port = non_empty(env::var("HEALTH_PORT").ok())
            .map(|v| v.parse::<u16>())
            .transpose()
            .context("HEALTH_PORT must be a port number")?
            .unwrap_or(8080);

        Ok(Self {
            bot_token,
            admin_chat_id,
            upi_id: non_empty(env::var("UPI_ID").ok()),
            binance_id: non_empty(env::var("BINANCE_ID").ok()),
            db_path: non_empty(env::var("DB_PATH").ok()).unwrap_or_else(|| "orders.db".to_string()),
            health_port,
        })
    }
}

/// Trim a value and drop it entirely when the result is empty.
fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

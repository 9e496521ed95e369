// Environment-driven configuration, read once at startup. Anything invalid
// here should stop the process before it connects anywhere.

use anyhow::{bail, Context};
use std::time::Duration;

use crate::core::announce::DEFAULT_MARKER;

/// How the edit path locates the message to strike through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupStrategy {
    /// The structured correlation log on its own worksheet (default).
    Log,
    /// Grep recent channel history for `Game:` / `Branch:` lines.
    History,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub discord_token: String,
    pub spreadsheet_id: String,
    pub worksheet_name: String,
    pub log_worksheet_name: String,
    pub announce_channel_id: u64,
    pub announce_marker: String,
    pub lookup_strategy: LookupStrategy,
    pub command_prefix: String,
    pub timezone: chrono_tz::Tz,
    pub webhook_port: u16,
    pub dispatch_timeout: Duration,
}

fn var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let discord_token = std::env::var("DISCORD_TOKEN")
            .context("Missing DISCORD_TOKEN environment variable")?;
        let spreadsheet_id = std::env::var("SPREADSHEET_ID")
            .context("Missing SPREADSHEET_ID environment variable")?;

        let announce_channel_id = std::env::var("ANNOUNCE_CHANNEL_ID")
            .context("Missing ANNOUNCE_CHANNEL_ID environment variable")?
            .parse::<u64>()
            .context("ANNOUNCE_CHANNEL_ID must be a numeric channel id")?;

        let lookup_strategy = match var_or("ANNOUNCE_LOOKUP", "log").as_str() {
            "log" => LookupStrategy::Log,
            "history" => LookupStrategy::History,
            other => bail!("ANNOUNCE_LOOKUP must be `log` or `history`, got `{}`", other),
        };

        let timezone = var_or("BOT_TIMEZONE", "Asia/Bangkok")
            .parse::<chrono_tz::Tz>()
            .map_err(|e| anyhow::anyhow!("BOT_TIMEZONE is not a valid timezone: {}", e))?;

        let webhook_port = var_or("WEBHOOK_PORT", "8080")
            .parse::<u16>()
            .context("WEBHOOK_PORT must be a port number")?;

        let dispatch_timeout_secs = var_or("DISPATCH_TIMEOUT_SECS", "10")
            .parse::<u64>()
            .context("DISPATCH_TIMEOUT_SECS must be a number of seconds")?;

        Ok(Self {
            discord_token,
            spreadsheet_id,
            worksheet_name: var_or("WORKSHEET_NAME", "Sheet1"),
            log_worksheet_name: var_or("LOG_WORKSHEET_NAME", "AnnounceLog"),
            announce_channel_id,
            announce_marker: var_or("ANNOUNCE_MARKER", DEFAULT_MARKER),
            lookup_strategy,
            command_prefix: var_or("COMMAND_PREFIX", "!"),
            timezone,
            webhook_port,
            dispatch_timeout: Duration::from_secs(dispatch_timeout_secs),
        })
    }
}

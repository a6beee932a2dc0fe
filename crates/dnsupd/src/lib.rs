// # dnsupd support
//
// Pieces shared by the `dnsupd` daemon and the `dnsup-push` trigger:
// exit codes, logging setup, configuration loading and the one-shot push.
// No update logic lives here; everything else is in dnsup-core.

use anyhow::{Context, Result};
use dnsup_core::traits::UpdateTransport;
use dnsup_core::{DnsupConfig, UpdateOrchestrator};
use std::env;
use std::net::Ipv4Addr;
use std::process::ExitCode;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

/// Environment variable selecting the log level
pub const LOG_LEVEL_ENV: &str = "DNSUP_LOG_LEVEL";

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DnsupExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error, including failed updates in one-shot mode
    RuntimeError = 2,
}

impl From<DnsupExitCode> for ExitCode {
    fn from(code: DnsupExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Parse a log level name (case-insensitive)
pub fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "{} '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            LOG_LEVEL_ENV,
            level
        ),
    }
}

/// Install the global tracing subscriber
///
/// The level comes from `DNSUP_LOG_LEVEL` (default `info`).
pub fn init_tracing() -> Result<()> {
    let level = env::var(LOG_LEVEL_ENV).unwrap_or_else(|_| "info".to_string());
    let level = parse_log_level(&level)?;

    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    Ok(())
}

/// Load the configuration from `DNSUP_CONFIG` or `$HOME/.dnsup.toml`
pub fn load_config() -> Result<DnsupConfig> {
    let path = DnsupConfig::default_path()?;
    let config = DnsupConfig::load(&path)?;
    tracing::info!(
        "Configuration loaded from {}: {} record(s)",
        path.display(),
        config.records.len()
    );
    Ok(config)
}

/// Publish `address` once for every configured record
///
/// No IPv6 addresses are passed, so records with `update-v6` get their
/// AAAA RRset deleted. Returns `RuntimeError` if any record failed.
pub async fn push_address(
    transport: Box<dyn UpdateTransport>,
    config: DnsupConfig,
    address: Ipv4Addr,
) -> DnsupExitCode {
    let (mut engine, _event_rx) = match UpdateOrchestrator::new(transport, config) {
        Ok(engine) => engine,
        Err(e) => {
            error!("Configuration error: {}", e);
            return DnsupExitCode::ConfigError;
        }
    };

    let outcome = engine.on_address_change(&[address.to_string()], &[]).await;

    if outcome.is_success() {
        info!("Published {}: {:?}", address, outcome);
        DnsupExitCode::CleanShutdown
    } else {
        error!("Some records were not updated: {:?}", outcome);
        DnsupExitCode::RuntimeError
    }
}

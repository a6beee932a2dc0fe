// # dnsupd - dynamic DNS update daemon
//
// This daemon is a THIN integration layer. All update logic is in
// dnsup-core.
//
// The dnsupd daemon is responsible for:
// 1. Initializing logging from `DNSUP_LOG_LEVEL`
// 2. Loading the configuration file
// 3. Creating the address monitor and the UDP transport
// 4. Running the engine until SIGTERM/SIGINT
//
// ## Configuration
//
// - `DNSUP_CONFIG`: configuration file (default `$HOME/.dnsup.toml`)
// - `DNSUP_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// export DNSUP_CONFIG=/etc/dnsup.toml
// dnsupd
// ```

use anyhow::Result;
use clap::Parser;
use dnsup_core::traits::AddressMonitor;
use dnsup_core::{DnsupConfig, UdpTransport, UpdateOrchestrator};
use dnsupd::{DnsupExitCode, init_tracing, load_config};
use std::process::ExitCode;
use tracing::{debug, error, info};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Keep DNS records in sync with this host's addresses
#[derive(Parser, Debug)]
#[command(name = "dnsupd", version, about)]
struct Cli {
    /// Build and sign updates but do not send them
    #[arg(long)]
    dry_run: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing() {
        eprintln!("Configuration error: {}", e);
        return DnsupExitCode::ConfigError.into();
    }

    let mut config = match load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Configuration error: {}", e);
            return DnsupExitCode::ConfigError.into();
        }
    };
    config.engine.dry_run |= cli.dry_run;

    info!("Starting dnsupd daemon");
    for record in &config.records {
        info!(
            "Managing record: {} (zone {}, server {}, v4={}, v6={})",
            record.name, record.zone, record.server, record.update_v4, record.update_v6
        );
    }

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DnsupExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        let monitor = match create_monitor() {
            Ok(monitor) => monitor,
            Err(e) => {
                error!("Failed to create address monitor: {}", e);
                return DnsupExitCode::ConfigError;
            }
        };

        if let Err(e) = run_daemon(config, monitor).await {
            error!("Daemon error: {}", e);
            DnsupExitCode::RuntimeError
        } else {
            DnsupExitCode::CleanShutdown
        }
    });

    result.into()
}

#[cfg(feature = "netlink")]
fn create_monitor() -> Result<Box<dyn AddressMonitor>> {
    use dnsup_core::traits::AddressMonitorFactory;

    info!("Using netlink address monitor");
    Ok(dnsup_netlink::NetlinkFactory.create()?)
}

#[cfg(not(feature = "netlink"))]
fn create_monitor() -> Result<Box<dyn AddressMonitor>> {
    anyhow::bail!("dnsupd was built without an address monitor (enable the `netlink` feature)")
}

/// Run the daemon
async fn run_daemon(config: DnsupConfig, monitor: Box<dyn AddressMonitor>) -> Result<()> {
    let transport = UdpTransport::from_config(&config.engine);
    info!(
        "Sending updates over UDP port {} (timeout {:?})",
        config.engine.port,
        transport.timeout()
    );

    let (mut engine, mut event_rx) = UpdateOrchestrator::new(Box::new(transport), config)?;

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            debug!("Engine event: {:?}", event);
        }
    });

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        match wait_for_shutdown().await {
            Ok(signal) => info!("Received shutdown signal: {}", signal),
            Err(e) => error!("Shutdown error: {}", e),
        }
        let _ = shutdown_tx.send(());
    });

    info!("Ready to monitor address changes");
    engine
        .run_with_shutdown(monitor.as_ref(), Some(shutdown_rx))
        .await?;

    info!("Shutting down daemon");
    Ok(())
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let signal = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };

    Ok(signal)
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}

// # dnsup-push - one-shot manual update
//
// Publishes a single IPv4 address for every configured record, without
// watching the network. Useful for testing a server/key setup or for
// hosts whose public address is not on a local interface.
//
// ```bash
// DNSUP_CONFIG=/etc/dnsup.toml dnsup-push 203.0.113.5
// ```
//
// Exits 0 when every record was updated, 1 on a configuration error and
// 2 when any record failed.

use clap::Parser;
use dnsup_core::UdpTransport;
use dnsupd::{DnsupExitCode, init_tracing, load_config, push_address};
use std::net::Ipv4Addr;
use std::process::ExitCode;
use tracing::error;

/// Send one signed update per configured record
#[derive(Parser, Debug)]
#[command(name = "dnsup-push", version, about)]
struct Cli {
    /// IPv4 address to publish
    address: Ipv4Addr,

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

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DnsupExitCode::RuntimeError.into();
        }
    };

    let code = rt.block_on(async {
        let transport = UdpTransport::from_config(&config.engine);
        push_address(Box::new(transport), config, cli.address).await
    });

    code.into()
}

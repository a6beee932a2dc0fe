//! Update engine
//!
//! The UpdateOrchestrator is responsible for:
//! - Turning monitor notifications into address snapshots
//! - Filtering out non-publishable IPv6 addresses
//! - Suppressing updates when the snapshot is unchanged
//! - Building, signing and sending one UPDATE per configured record
//! - Invalidating the cache when any record fails
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────┐
//! │ AddressMonitor │─── notification ───┐
//! └────────────────┘                    │
//!                                       ▼
//!                          ┌──────────────────────┐
//!                          │  UpdateOrchestrator  │
//!                          └──────────────────────┘
//!                                       │
//!       ┌──────────────┬────────────────┼────────────────┬──────────────┐
//!       ▼              ▼                ▼                ▼              ▼
//! ┌───────────┐ ┌─────────────┐ ┌──────────────┐ ┌────────────┐ ┌─────────────┐
//! │  Filter   │ │ StateCache  │ │   Builder    │ │   Signer   │ │  Transport  │
//! └───────────┘ └─────────────┘ └──────────────┘ └────────────┘ └─────────────┘
//! ```
//!
//! ## Event Flow
//!
//! 1. Notification received, addresses queried
//! 2. IPv6 filtered, snapshot compared with the cache
//! 3. If unchanged, nothing is sent
//! 4. Otherwise the snapshot is committed, then every record is updated
//! 5. Any failure invalidates the cache; the next notification retries

use crate::builder::UpdateMessageBuilder;
use crate::config::{DnsupConfig, RecordConfig};
use crate::error::{Error, Result};
use crate::filter::{AddressFilter, parse_v4, parse_v6};
use crate::state::{AddressStateCache, Addresses};
use crate::traits::{AddressMonitor, UpdateTransport, snapshot};
use crate::tsig::TsigSigner;
use std::net::{Ipv4Addr, Ipv6Addr};
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tracing::{debug, error, info, warn};

/// Events emitted by the UpdateOrchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Engine started
    Started { records_count: usize },

    /// A snapshot was taken (IPv6 already filtered)
    AddressesObserved {
        v4: Vec<Ipv4Addr>,
        v6: Vec<Ipv6Addr>,
    },

    /// Snapshot equals the cached one; nothing sent
    UpdateSkipped,

    /// Server accepted the update for a record
    UpdateSent { record_name: String, server: String },

    /// Update for a record failed
    UpdateFailed {
        record_name: String,
        server: String,
        error: String,
    },

    /// Cache cleared after a failure
    CacheInvalidated,

    /// Engine stopped
    Stopped { reason: String },
}

/// Result of handling one address snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Snapshot unchanged, no network activity
    Unchanged,

    /// Updates were attempted for every record
    Applied {
        /// Records whose update was accepted (or signed, in dry-run mode)
        sent: usize,
        /// Records whose update failed
        failed: usize,
        /// Records with both families disabled
        skipped: usize,
    },
}

impl UpdateOutcome {
    /// True unless some record failed
    pub fn is_success(&self) -> bool {
        !matches!(self, UpdateOutcome::Applied { failed, .. } if *failed > 0)
    }
}

/// Core update engine
///
/// ## Lifecycle
///
/// 1. Create with [`UpdateOrchestrator::new()`]
/// 2. Start with [`UpdateOrchestrator::run()`], or call
///    [`UpdateOrchestrator::on_address_change()`] directly
/// 3. Engine runs until shutdown signal received
///
/// ## Threading
///
/// Snapshots are handled one at a time and records are updated strictly
/// in order. A slow server delays the records after it. The cache is owned
/// here and only touched through `&mut self`.
pub struct UpdateOrchestrator {
    /// Records to keep in sync
    records: Vec<RecordConfig>,

    /// IPv6 publication policy
    filter: AddressFilter,

    /// Last committed snapshot
    cache: AddressStateCache,

    /// UPDATE message construction
    builder: UpdateMessageBuilder,

    /// TSIG signing and response verification
    signer: TsigSigner,

    /// Delivery to the servers
    transport: Box<dyn UpdateTransport>,

    /// Sign but do not send
    dry_run: bool,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl UpdateOrchestrator {
    /// Create a new engine
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        transport: Box<dyn UpdateTransport>,
        config: DnsupConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.engine.event_channel_capacity);

        let engine = Self {
            records: config.records,
            filter: AddressFilter::new(),
            cache: AddressStateCache::new(),
            builder: UpdateMessageBuilder::new(),
            signer: TsigSigner::new(),
            transport,
            dry_run: config.engine.dry_run,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Configured records
    pub fn records(&self) -> &[RecordConfig] {
        &self.records
    }

    /// The address cache, for inspection
    pub fn cache(&self) -> &AddressStateCache {
        &self.cache
    }

    /// Run until ctrl-c or until the monitor stops
    pub async fn run(&mut self, monitor: &dyn AddressMonitor) -> Result<()> {
        self.run_with_shutdown(monitor, None).await
    }

    /// Run until `shutdown_rx` fires (or ctrl-c when `None`)
    ///
    /// The current addresses are applied once at start, then again after
    /// every monitor notification.
    pub async fn run_with_shutdown(
        &mut self,
        monitor: &dyn AddressMonitor,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.emit_event(EngineEvent::Started {
            records_count: self.records.len(),
        });

        let mut changes = monitor.watch();

        let shutdown = async move {
            match shutdown_rx {
                Some(rx) => {
                    let _ = rx.await;
                }
                None => {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        error!("Failed to listen for ctrl-c: {}", e);
                    }
                }
            }
        };
        tokio::pin!(shutdown);

        self.poll_monitor(monitor).await;

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    self.emit_event(EngineEvent::Stopped {
                        reason: "Shutdown signal".to_string(),
                    });
                    return Ok(());
                }

                change = changes.next() => {
                    if change.is_none() {
                        self.emit_event(EngineEvent::Stopped {
                            reason: "Address monitor stopped".to_string(),
                        });
                        return Err(Error::monitor("notification stream ended"));
                    }
                    self.poll_monitor(monitor).await;
                }
            }
        }
    }

    async fn poll_monitor(&mut self, monitor: &dyn AddressMonitor) {
        match snapshot(monitor).await {
            Some((v4, v6)) => {
                info!("Found addresses {:?}, {:?}", v4, v6);
                self.on_address_change(&v4, &v6).await;
            }
            None => debug!("No usable addresses, skipping cycle"),
        }
    }

    /// Handle one address snapshot as reported by a monitor
    ///
    /// IPv4 strings pass through (invalid entries are dropped); IPv6 strings
    /// are filtered for publishability. Per-record failures are logged and
    /// invalidate the cache but never stop the remaining records.
    pub async fn on_address_change<S: AsRef<str>>(&mut self, v4: &[S], v6: &[S]) -> UpdateOutcome {
        let addrs = Addresses::new(parse_v4(v4), self.filter.filter(&parse_v6(v6)));

        self.emit_event(EngineEvent::AddressesObserved {
            v4: addrs.v4.clone(),
            v6: addrs.v6.clone(),
        });

        if !self.cache.has_changed(&addrs) {
            info!("Addresses unchanged, skipping update");
            self.emit_event(EngineEvent::UpdateSkipped);
            return UpdateOutcome::Unchanged;
        }

        // Committed before sending; a failure below rolls it back.
        self.cache.commit(addrs.clone());

        let mut sent = 0;
        let mut failed = 0;
        let mut skipped = 0;

        for record in &self.records {
            match self.update_record(record, &addrs).await {
                Ok(true) => sent += 1,
                Ok(false) => skipped += 1,
                Err(e) => {
                    failed += 1;
                    error!(
                        "Failed to update {} via {}: {}",
                        record.name, record.server, e
                    );
                    self.emit_event(EngineEvent::UpdateFailed {
                        record_name: record.name.clone(),
                        server: record.server.clone(),
                        error: e.to_string(),
                    });

                    self.cache.invalidate();
                    self.emit_event(EngineEvent::CacheInvalidated);
                }
            }
        }

        if failed > 0 {
            warn!(
                "{} of {} record(s) failed; will retry on the next address notification",
                failed,
                self.records.len()
            );
        }

        UpdateOutcome::Applied {
            sent,
            failed,
            skipped,
        }
    }

    /// Build, sign and send the update for one record
    ///
    /// Returns `Ok(false)` when the record updates neither family.
    async fn update_record(&self, record: &RecordConfig, addrs: &Addresses) -> Result<bool> {
        let Some(msg) = self.builder.build(record, addrs)? else {
            debug!("Record {} updates neither A nor AAAA, skipping", record.name);
            return Ok(false);
        };

        let signed = self.signer.sign(&msg, &record.name, &record.key)?;

        let ops: Vec<String> = msg.ops().iter().map(ToString::to_string).collect();
        info!(
            "Updating {} in zone {} via {}: [{}]",
            record.name,
            record.zone,
            record.server,
            ops.join(", ")
        );

        if self.dry_run {
            info!("Dry run: not sending update for {}", record.name);
            return Ok(true);
        }

        let response = self.transport.send(&signed, &record.server).await?;
        self.signer
            .verify_response(&signed, &response.bytes, &record.key)?;

        info!(
            "Updated {} via {} ({})",
            record.name,
            record.server,
            self.transport.transport_name()
        );
        self.emit_event(EngineEvent::UpdateSent {
            record_name: record.name.clone(),
            server: record.server.clone(),
        });

        Ok(true)
    }

    /// Emit an engine event
    fn emit_event(&self, event: EngineEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
            // Nobody is listening.
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_success() {
        assert!(UpdateOutcome::Unchanged.is_success());
        assert!(
            UpdateOutcome::Applied {
                sent: 2,
                failed: 0,
                skipped: 1
            }
            .is_success()
        );
        assert!(
            !UpdateOutcome::Applied {
                sent: 1,
                failed: 1,
                skipped: 0
            }
            .is_success()
        );
    }
}

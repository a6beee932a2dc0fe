//! Contract Test: Shutdown Determinism
//!
//! This test verifies that the engine stops promptly and predictably.
//!
//! Constraints verified:
//! - Engine terminates on shutdown signal
//! - Engine terminates with an error when the monitor goes away
//! - No work is done without notifications
//!
//! If this test fails, someone has added:
//! - Polling loops or periodic tasks
//! - Tasks that ignore cancellation

mod common;

use common::*;
use dnsup_core::error::Error;
use dnsup_core::traits::{AddressFamily, AddressMonitor};
use dnsup_core::{EngineEvent, UpdateOrchestrator};
use std::pin::Pin;
use tokio_stream::Stream;

/// A monitor whose notification stream ends immediately
struct ClosedMonitor;

#[async_trait::async_trait]
impl AddressMonitor for ClosedMonitor {
    fn watch(&self) -> Pin<Box<dyn Stream<Item = ()> + Send + 'static>> {
        Box::pin(tokio_stream::empty())
    }

    async fn primary_interface(&self) -> Option<String> {
        None
    }

    async fn addresses(&self, _interface: &str, _family: AddressFamily) -> Vec<String> {
        Vec::new()
    }
}

#[tokio::test]
async fn shutdown_signal_terminates_engine() {
    let (monitor, _handle) = ControlledAddressMonitor::new(&["192.0.2.1"], &[]);
    let (mut engine, _event_rx) = UpdateOrchestrator::new(
        Box::new(MockTransport::new()),
        minimal_config("host.example.com"),
    )
    .expect("engine construction succeeds");

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let engine_handle = tokio::spawn(async move {
        engine.run_with_shutdown(&monitor, Some(shutdown_rx)).await
    });

    tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;
    shutdown_tx.send(()).unwrap();

    let result = tokio::time::timeout(tokio::time::Duration::from_secs(1), engine_handle)
        .await
        .expect("engine stops within a second")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn dropped_shutdown_sender_terminates_engine() {
    let (monitor, _handle) = ControlledAddressMonitor::new(&["192.0.2.1"], &[]);
    let (mut engine, _event_rx) = UpdateOrchestrator::new(
        Box::new(MockTransport::new()),
        minimal_config("host.example.com"),
    )
    .unwrap();

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    drop(shutdown_tx);

    let result = tokio::time::timeout(
        tokio::time::Duration::from_secs(1),
        engine.run_with_shutdown(&monitor, Some(shutdown_rx)),
    )
    .await
    .expect("engine stops within a second");
    assert!(result.is_ok());
}

#[tokio::test]
async fn ended_monitor_stream_is_an_error() {
    let transport = MockTransport::new();
    let (mut engine, mut event_rx) = UpdateOrchestrator::new(
        Box::new(MockTransport::sharing_counters_with(&transport)),
        minimal_config("host.example.com"),
    )
    .unwrap();

    let (_shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let result = engine
        .run_with_shutdown(&ClosedMonitor, Some(shutdown_rx))
        .await;

    assert!(matches!(result, Err(Error::Monitor(_))));
    assert_eq!(transport.send_count(), 0);

    let mut last = None;
    while let Ok(event) = event_rx.try_recv() {
        last = Some(event);
    }
    assert!(matches!(last, Some(EngineEvent::Stopped { .. })));
}

#[tokio::test]
async fn idle_engine_does_no_work() {
    let (monitor, handle) = ControlledAddressMonitor::new(&["192.0.2.1"], &[]);
    let transport = MockTransport::new();

    let (mut engine, _event_rx) = UpdateOrchestrator::new(
        Box::new(MockTransport::sharing_counters_with(&transport)),
        minimal_config("host.example.com"),
    )
    .unwrap();

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let engine_handle = tokio::spawn(async move {
        engine.run_with_shutdown(&monitor, Some(shutdown_rx)).await
    });

    tokio::time::sleep(tokio::time::Duration::from_millis(200)).await;

    shutdown_tx.send(()).unwrap();
    engine_handle.await.unwrap().unwrap();

    // Only the start-up query, no polling afterwards.
    assert_eq!(handle.query_count(), 2);
    assert_eq!(transport.send_count(), 1);
}

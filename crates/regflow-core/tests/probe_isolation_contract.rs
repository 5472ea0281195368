//! Architectural Contract Test: Probe Isolation
//!
//! This test verifies that one provider's failure does not hide the other
//! provider's state.
//!
//! Constraints verified:
//! - A failed edge call leaves only the edge facts unknown
//! - A failed registrar call leaves only the registrar facts unknown
//! - Every failure is attributed to its provider and operation
//!
//! If this test fails, someone has added:
//! - Early return from the probe on the first error
//! - Error propagation out of the engine instead of into the report

mod common;

use common::*;
use regflow_core::{Observed, RunRequest};
use std::sync::{Arc, Mutex};

#[tokio::test]
async fn edge_failure_keeps_registrar_state() {
    // Arrange
    let world = shared(World::fully_configured().failing("zone_exists"));
    let engine = engine(&world);
    let asked = Arc::new(Mutex::new(0));

    // Act
    let report = engine
        .run(&RunRequest::status(domain()), &accept_all(asked))
        .await;

    // Assert
    let state = report.initial_state();
    assert_eq!(state.is_registered, Observed::Known(true));
    assert_eq!(state.registrar_nameservers, Observed::Known(edge_nameservers()));
    assert_eq!(state.zone, Observed::Unknown);
    assert_eq!(state.zone_id(), None);

    assert_eq!(report.probe_failures().len(), 1);
    let failure = &report.probe_failures()[0];
    assert_eq!(failure.provider, "mock-edge");
    assert_eq!(failure.operation, "zone_exists");
    assert!(failure.message.contains("503"));
}

#[tokio::test]
async fn registrar_failure_keeps_edge_state() {
    // Arrange
    let world = shared(World::fully_configured().failing("get_nameservers"));
    let engine = engine(&world);
    let asked = Arc::new(Mutex::new(0));

    // Act
    let report = engine
        .run(&RunRequest::status(domain()), &accept_all(asked))
        .await;

    // Assert
    let state = report.initial_state();
    assert_eq!(state.registrar_nameservers, Observed::Unknown);
    assert_eq!(state.zone_id(), Some("zone-123"));
    assert_eq!(state.edge_nameservers, Observed::Known(edge_nameservers()));
    assert!(state.worker_subdomain_present());
    assert!(!state.nameservers_in_sync());
    assert_eq!(report.probe_failures()[0].provider, "mock-registrar");
}

//! Architectural Contract Test: Status Mode
//!
//! This test verifies that a status pass is strictly read-only.
//!
//! Constraints verified:
//! - No plan is built
//! - Zero mutating provider calls
//! - The confirmation callback is never invoked
//!
//! If this test fails, someone has added:
//! - "Helpful" fixes applied while reporting status

mod common;

use common::*;
use regflow_core::{RunMode, RunRequest};
use std::sync::{Arc, Mutex};

#[test]
fn status_pass_is_read_only() {
    // Arrange: plenty to fix, registration would even be allowed
    let world = shared(World::unregistered());
    let engine = engine(&world);
    let asked = Arc::new(Mutex::new(0));
    let request = RunRequest::status(domain()).with_allow_registration(true);

    // Act
    let report = tokio_test::block_on(engine.run(&request, &accept_all(asked.clone())));

    // Assert
    assert_eq!(report.mode(), RunMode::Status);
    assert!(report.plan_status().is_none());
    assert!(report.entries().is_empty());
    assert!(report.halt().is_none());
    assert!(report.final_state().is_none());
    assert!(report.is_success());
    assert_eq!(*asked.lock().unwrap(), 0);

    let world = world.lock().unwrap();
    assert!(world.mutation_calls().is_empty());
    assert_eq!(world.calls_to("quote_registration"), 0);
}

#[test]
fn status_pass_reports_worker_when_included() {
    // Arrange
    let world = shared(World::fully_configured());
    let engine = engine(&world);
    let asked = Arc::new(Mutex::new(0));

    // Act
    let report = tokio_test::block_on(
        engine.run(&RunRequest::status(domain()), &accept_all(asked)),
    );

    // Assert
    let state = report.initial_state();
    assert!(state.nameservers_in_sync());
    assert!(state.worker_subdomain_present());
    assert_eq!(state.zone_status(), Some("active"));
}

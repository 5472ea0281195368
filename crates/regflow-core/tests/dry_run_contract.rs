//! Architectural Contract Test: Dry Run
//!
//! This test verifies that a dry run never mutates a provider.
//!
//! Constraints verified:
//! - Every planned action is reported as skipped (dry run)
//! - Zero mutating provider calls
//! - The confirmation callback is never invoked
//! - No closing probe is taken
//!
//! If this test fails, someone has added:
//! - A mutation path that bypasses the dry-run gate
//! - Confirmation prompts for simulated actions

mod common;

use common::*;
use regflow_core::{ActionKind, ActionOutcome, RunRequest};
use std::sync::{Arc, Mutex};

#[tokio::test]
async fn dry_run_reports_plan_without_mutations() {
    // Arrange
    let world = shared(World::registered_without_zone());
    let engine = engine(&world);
    let asked = Arc::new(Mutex::new(0));

    // Act
    let request = RunRequest::setup(domain()).with_dry_run(true);
    let report = engine.run(&request, &accept_all(asked.clone())).await;

    // Assert
    assert!(report.dry_run());
    assert_eq!(report.entries().len(), 5);
    assert_eq!(
        report.count(|o| *o == ActionOutcome::SkippedDryRun),
        report.entries().len()
    );
    assert!(report.is_success());
    assert!(report.final_state().is_none());
    assert_eq!(*asked.lock().unwrap(), 0);
    assert!(world.lock().unwrap().mutation_calls().is_empty());
}

#[tokio::test]
async fn dry_run_never_asks_to_register() {
    // Arrange: registration allowed, domain free
    let world = shared(World::unregistered());
    let engine = engine(&world);
    let asked = Arc::new(Mutex::new(0));

    // Act
    let request = RunRequest::setup(domain())
        .with_dry_run(true)
        .with_allow_registration(true);
    let report = engine.run(&request, &accept_all(asked.clone())).await;

    // Assert: the cost action is listed but neither confirmed nor executed
    assert_eq!(report.entries()[0].action.kind(), ActionKind::RegisterDomain);
    assert_eq!(report.entries()[0].outcome, ActionOutcome::SkippedDryRun);
    assert!(report.halt().is_none());
    assert_eq!(*asked.lock().unwrap(), 0);

    let world = world.lock().unwrap();
    assert!(world.mutation_calls().is_empty());
    assert!(!world.registered);
    // Quotes are read-only and still fetched
    assert_eq!(world.calls_to("quote_registration"), 1);
}

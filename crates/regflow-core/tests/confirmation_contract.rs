//! Architectural Contract Test: Confirmation Gating
//!
//! This test verifies that cost-incurring actions need explicit consent.
//!
//! Constraints verified:
//! - Registration never runs without permission to register
//! - A declined registration halts the pass and aborts the rest
//! - Declining is not a failure
//! - Safe actions are never confirmed
//!
//! If this test fails, someone has added:
//! - A registration path without confirmation
//! - Downstream actions that run for a domain the account does not own

mod common;

use common::*;
use regflow_core::{
    ActionKind, ActionOutcome, HaltReason, IncompleteReason, PlanStatus, RunRequest,
};
use std::sync::{Arc, Mutex};

#[tokio::test]
async fn declined_registration_halts_the_pass() {
    // Arrange
    let world = shared(World::unregistered());
    let engine = engine(&world);
    let asked = Arc::new(Mutex::new(0));

    // Act
    let request = RunRequest::setup(domain()).with_allow_registration(true);
    let report = engine.run(&request, &decline_all(asked.clone())).await;

    // Assert
    assert_eq!(report.entries()[0].action.kind(), ActionKind::RegisterDomain);
    assert_eq!(report.entries()[0].outcome, ActionOutcome::SkippedUnconfirmed);
    for entry in &report.entries()[1..] {
        assert_eq!(entry.outcome, ActionOutcome::SkippedAborted);
    }
    assert_eq!(
        report.halt(),
        Some(&HaltReason::UnconfirmedCostAction {
            action: ActionKind::RegisterDomain
        })
    );
    assert!(report.is_success(), "declining is not a failure");
    assert_eq!(*asked.lock().unwrap(), 1);
    assert!(world.lock().unwrap().mutation_calls().is_empty());
}

#[tokio::test]
async fn registration_not_allowed_yields_incomplete_plan() {
    // Arrange
    let world = shared(World::unregistered());
    let engine = engine(&world);
    let asked = Arc::new(Mutex::new(0));

    // Act
    let report = engine
        .run(&RunRequest::setup(domain()), &accept_all(asked.clone()))
        .await;

    // Assert
    assert_eq!(
        report.plan_status(),
        Some(&PlanStatus::Incomplete(IncompleteReason::RegistrationNotAllowed))
    );
    assert!(report.entries().is_empty());
    assert!(report.is_success());
    assert_eq!(*asked.lock().unwrap(), 0);

    let world = world.lock().unwrap();
    assert!(world.mutation_calls().is_empty());
    assert_eq!(world.calls_to("quote_registration"), 0);
}

#[tokio::test]
async fn safe_actions_are_not_confirmed() {
    // Arrange
    let world = shared(World::registered_without_zone());
    let engine = engine(&world);
    let asked = Arc::new(Mutex::new(0));

    // Act: a callback that would decline everything
    let report = engine
        .run(&RunRequest::setup(domain()), &decline_all(asked.clone()))
        .await;

    // Assert
    assert!(report.is_success());
    assert!(report.halt().is_none());
    assert_eq!(*asked.lock().unwrap(), 0);
    assert_eq!(world.lock().unwrap().mutation_calls().len(), 5);
}

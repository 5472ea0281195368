//! Per-pass report
//!
//! A [`Report`] is the only artifact a reconciliation pass returns. It is
//! assembled once by the engine and read-only afterwards.

use crate::plan::{Action, ActionKind, PlanStatus};
use crate::state::{DomainName, DomainState, ProviderFailure};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// What kind of pass produced a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Probe only; no plan is built
    Status,
    /// Probe, plan and execute
    Setup,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Status => f.write_str("status"),
            RunMode::Setup => f.write_str("setup"),
        }
    }
}

/// What happened to one planned action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ActionOutcome {
    /// The provider call succeeded
    Applied,
    /// The precondition no longer held right before execution
    SkippedAlreadySatisfied,
    /// Dry run: no provider mutation was made
    SkippedDryRun,
    /// Confirmation was declined; the pass halted here
    SkippedUnconfirmed,
    /// Not reached because an earlier action halted the pass
    SkippedAborted,
    /// The provider call failed; the pass halted here
    Failed { reason: ProviderFailure },
}

impl ActionOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, ActionOutcome::Failed { .. })
    }
}

impl fmt::Display for ActionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionOutcome::Applied => f.write_str("applied"),
            ActionOutcome::SkippedAlreadySatisfied => f.write_str("skipped (already satisfied)"),
            ActionOutcome::SkippedDryRun => f.write_str("skipped (dry run)"),
            ActionOutcome::SkippedUnconfirmed => f.write_str("skipped (not confirmed)"),
            ActionOutcome::SkippedAborted => f.write_str("skipped (pass halted)"),
            ActionOutcome::Failed { reason } => write!(f, "failed: {}", reason),
        }
    }
}

/// One planned action and its outcome
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    pub action: Action,
    pub outcome: ActionOutcome,
}

/// Why execution stopped before the end of the plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum HaltReason {
    /// A cost-incurring action was not confirmed
    UnconfirmedCostAction { action: ActionKind },
    /// A provider call failed
    PlanHaltedByFailure {
        action: ActionKind,
        failure: ProviderFailure,
    },
}

impl fmt::Display for HaltReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HaltReason::UnconfirmedCostAction { action } => {
                write!(f, "halted: {} was not confirmed", action)
            }
            HaltReason::PlanHaltedByFailure { action, failure } => {
                write!(f, "halted: {} failed ({})", action, failure)
            }
        }
    }
}

/// Result of one reconciliation pass
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub(crate) domain: DomainName,
    pub(crate) mode: RunMode,
    pub(crate) dry_run: bool,
    pub(crate) started_at: DateTime<Utc>,
    pub(crate) finished_at: DateTime<Utc>,
    pub(crate) initial_state: DomainState,
    pub(crate) probe_failures: Vec<ProviderFailure>,
    pub(crate) plan_status: Option<PlanStatus>,
    pub(crate) entries: Vec<ReportEntry>,
    pub(crate) halt: Option<HaltReason>,
    pub(crate) final_state: Option<DomainState>,
    pub(crate) final_probe_failures: Vec<ProviderFailure>,
}

impl Report {
    pub fn domain(&self) -> &DomainName {
        &self.domain
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finished_at(&self) -> DateTime<Utc> {
        self.finished_at
    }

    /// State probed at the start of the pass
    pub fn initial_state(&self) -> &DomainState {
        &self.initial_state
    }

    /// Provider failures captured while probing `initial_state`
    pub fn probe_failures(&self) -> &[ProviderFailure] {
        &self.probe_failures
    }

    /// Plan status; `None` for status passes
    pub fn plan_status(&self) -> Option<&PlanStatus> {
        self.plan_status.as_ref()
    }

    /// One entry per planned action, in plan order
    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    pub fn halt(&self) -> Option<&HaltReason> {
        self.halt.as_ref()
    }

    /// State from the closing probe, if one was taken
    pub fn final_state(&self) -> Option<&DomainState> {
        self.final_state.as_ref()
    }

    pub fn final_probe_failures(&self) -> &[ProviderFailure] {
        &self.final_probe_failures
    }

    /// Most recent state: the closing probe if taken, otherwise the initial one
    pub fn latest_state(&self) -> &DomainState {
        self.final_state.as_ref().unwrap_or(&self.initial_state)
    }

    /// Number of entries with the given outcome discriminant
    pub fn count(&self, predicate: impl Fn(&ActionOutcome) -> bool) -> usize {
        self.entries.iter().filter(|e| predicate(&e.outcome)).count()
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self.plan_status, Some(PlanStatus::Blocked(_)))
    }

    /// `false` iff an action failed or planning was blocked
    ///
    /// Skip-only reports, declined confirmations and incomplete plans are
    /// successful passes.
    pub fn is_success(&self) -> bool {
        !self.is_blocked() && !self.entries.iter().any(|e| e.outcome.is_failed())
    }
}

//! Reconciliation engine
//!
//! The [`ReconcileEngine`] owns a single reconciliation pass for one domain:
//!
//! ```text
//! ┌──────────────┐   DomainState   ┌──────────────┐  DesiredState  ┌────────────┐
//! │ StateProber  │───────────────▶│   resolve    │───────────────▶│ Reconciler │
//! └──────────────┘                 └──────────────┘                └────────────┘
//!        ▲                                                               │ Plan
//!        │ closing probe                                                 ▼
//!        │                                                      ┌────────────────┐
//!        └──────────────────────────────────────────────────────│ ActionExecutor │
//!                                                               └────────────────┘
//!                                                                        │
//!                                                                        ▼
//!                                                                     Report
//! ```
//!
//! ## Pass Flow
//!
//! 1. Probe both providers (never fails; failures are captured)
//! 2. Status mode: stop here and report the snapshot
//! 3. Resolve the desired state from user intent
//! 4. Plan (may be blocked or incomplete)
//! 5. Execute in order with dry-run and confirmation gating
//! 6. Optionally re-probe for the final state
//!
//! There is no control loop and no state between passes. Concurrent passes
//! against the same domain are not coordinated.

mod executor;

pub use executor::{ActionExecutor, Confirm, ExecuteOptions, Execution};

use crate::config::ReconcileConfig;
use crate::plan::{PlanStatus, ResolveOptions, plan, resolve_desired};
use crate::report::{Report, RunMode};
use crate::state::{DomainName, Probe, ProbeOptions, StateProber};
use crate::traits::{DnsProvider, Registrar};
use chrono::Utc;
use tracing::{info, warn};

/// Parameters of one pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub domain: DomainName,
    pub mode: RunMode,
    /// Simulate mutations
    pub dry_run: bool,
    /// Registration may be performed (after confirmation)
    pub allow_registration: bool,
    /// Manage the worker subdomain
    pub include_worker_subdomain: bool,
}

impl RunRequest {
    /// A read-only status pass
    pub fn status(domain: DomainName) -> Self {
        Self {
            domain,
            mode: RunMode::Status,
            dry_run: false,
            allow_registration: false,
            include_worker_subdomain: true,
        }
    }

    /// A setup pass with registration disallowed
    pub fn setup(domain: DomainName) -> Self {
        Self {
            mode: RunMode::Setup,
            ..Self::status(domain)
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_allow_registration(mut self, allow: bool) -> Self {
        self.allow_registration = allow;
        self
    }

    pub fn with_worker_subdomain(mut self, include: bool) -> Self {
        self.include_worker_subdomain = include;
        self
    }
}

/// Composes prober, resolver, reconciler and executor
///
/// Providers are selected once when the engine is built.
pub struct ReconcileEngine {
    registrar: Box<dyn Registrar>,
    dns: Box<dyn DnsProvider>,
    config: ReconcileConfig,
}

impl ReconcileEngine {
    pub fn new(
        registrar: Box<dyn Registrar>,
        dns: Box<dyn DnsProvider>,
        config: ReconcileConfig,
    ) -> Self {
        Self {
            registrar,
            dns,
            config,
        }
    }

    /// Run one pass
    ///
    /// Always returns a complete report; provider failures are recorded in
    /// it rather than returned.
    pub async fn run(&self, request: &RunRequest, confirm: &dyn Confirm) -> Report {
        let started_at = Utc::now();
        let domain = &request.domain;
        info!(
            "Starting {} pass for {} (dry_run: {}, allow_registration: {}, worker: {})",
            request.mode,
            domain,
            request.dry_run,
            request.allow_registration,
            request.include_worker_subdomain
        );

        let prober = StateProber::new(self.registrar.as_ref(), self.dns.as_ref());
        let probe_options = ProbeOptions {
            include_worker_subdomain: request.include_worker_subdomain,
            include_registration_quote: request.mode == RunMode::Setup
                && request.allow_registration
                && self.config.quote_registration,
        };
        let Probe { state, failures } = prober.probe(domain, probe_options).await;

        if request.mode == RunMode::Status {
            info!("Status pass for {} complete", domain);
            return Report {
                domain: domain.clone(),
                mode: request.mode,
                dry_run: request.dry_run,
                started_at,
                finished_at: Utc::now(),
                initial_state: state,
                probe_failures: failures,
                plan_status: None,
                entries: Vec::new(),
                halt: None,
                final_state: None,
                final_probe_failures: Vec::new(),
            };
        }

        let desired = resolve_desired(
            &state,
            ResolveOptions {
                allow_registration: request.allow_registration,
                include_worker_subdomain: request.include_worker_subdomain,
            },
        );
        let plan = plan(&state, &desired);

        match plan.status() {
            PlanStatus::Ready => info!("Plan for {}: {} action(s)", domain, plan.len()),
            PlanStatus::Incomplete(reason) => warn!("Plan for {} is incomplete: {}", domain, reason),
            PlanStatus::Blocked(reason) => warn!("Planning for {} blocked: {}", domain, reason),
        }

        let execution = ActionExecutor::new(self.registrar.as_ref(), self.dns.as_ref())
            .execute(
                &plan,
                &state,
                ExecuteOptions {
                    dry_run: request.dry_run,
                    confirm,
                },
            )
            .await;

        let closing = if !request.dry_run && self.config.closing_probe && execution.applied_any() {
            info!("Taking closing probe for {}", domain);
            let probe_options = ProbeOptions {
                include_registration_quote: false,
                ..probe_options
            };
            Some(prober.probe(domain, probe_options).await)
        } else {
            None
        };
        let (final_state, final_probe_failures) = match closing {
            Some(Probe { state, failures }) => (Some(state), failures),
            None => (None, Vec::new()),
        };

        let report = Report {
            domain: domain.clone(),
            mode: request.mode,
            dry_run: request.dry_run,
            started_at,
            finished_at: Utc::now(),
            initial_state: state,
            probe_failures: failures,
            plan_status: Some(plan.status().clone()),
            entries: execution.entries,
            halt: execution.halt,
            final_state,
            final_probe_failures,
        };

        info!(
            "Setup pass for {} finished (success: {})",
            domain,
            report.is_success()
        );
        report
    }
}

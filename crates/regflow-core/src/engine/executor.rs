//! Action executor
//!
//! Walks a [`Plan`] strictly in order. For every action it:
//!
//! 1. re-probes the cheap facts the action depends on (registration before
//!    `RegisterDomain`, zone existence before `CreateZone`) and skips the
//!    action if its precondition no longer holds,
//! 2. stops short of any provider mutation in dry-run mode,
//! 3. asks for confirmation of non-safe actions, halting if declined,
//! 4. invokes the provider, halting on failure.
//!
//! There is no rollback: every action is idempotent, so a halted pass is
//! fixed by running it again.

use crate::plan::{Action, ActionPayload, Plan};
use crate::report::{ActionOutcome, HaltReason, ReportEntry};
use crate::state::{DomainName, DomainState, Observed, ProviderFailure};
use crate::traits::{DnsProvider, Registrar};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Synchronous confirmation of a non-safe action
///
/// Implemented for any `Fn(&Action) -> bool`. The engine has no knowledge of
/// how the question is presented.
pub trait Confirm: Send + Sync {
    fn confirm(&self, action: &Action) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&Action) -> bool + Send + Sync,
{
    fn confirm(&self, action: &Action) -> bool {
        self(action)
    }
}

/// Execution settings for one pass
#[derive(Clone, Copy)]
pub struct ExecuteOptions<'a> {
    /// Simulate: never call a mutating provider capability
    pub dry_run: bool,
    /// Confirmation callback for non-safe actions
    pub confirm: &'a dyn Confirm,
}

/// Outcome of walking a plan
#[derive(Debug, Clone)]
pub struct Execution {
    /// One entry per planned action, in plan order
    pub entries: Vec<ReportEntry>,
    /// Why the walk stopped early, if it did
    pub halt: Option<HaltReason>,
    /// Working state as last known to the executor
    pub state: DomainState,
}

impl Execution {
    pub fn applied_any(&self) -> bool {
        self.entries
            .iter()
            .any(|e| e.outcome == ActionOutcome::Applied)
    }
}

/// Applies plan actions through the provider capabilities
pub struct ActionExecutor<'a> {
    registrar: &'a dyn Registrar,
    dns: &'a dyn DnsProvider,
}

impl<'a> ActionExecutor<'a> {
    pub fn new(registrar: &'a dyn Registrar, dns: &'a dyn DnsProvider) -> Self {
        Self { registrar, dns }
    }

    /// Execute `plan`, which was computed from `current`
    pub async fn execute(
        &self,
        plan: &Plan,
        current: &DomainState,
        options: ExecuteOptions<'_>,
    ) -> Execution {
        let domain = plan.domain();
        let mut working = current.clone();
        let mut entries = Vec::with_capacity(plan.len());
        let mut halt = None;

        for action in plan.actions() {
            if halt.is_some() {
                entries.push(ReportEntry {
                    action: action.clone(),
                    outcome: ActionOutcome::SkippedAborted,
                });
                continue;
            }

            let outcome = self.step(domain, action, &mut working, options).await;

            match &outcome {
                ActionOutcome::SkippedUnconfirmed => {
                    warn!("{} not confirmed, halting pass for {}", action, domain);
                    halt = Some(HaltReason::UnconfirmedCostAction {
                        action: action.kind(),
                    });
                }
                ActionOutcome::Failed { reason } => {
                    warn!("{} failed for {}: {}", action, domain, reason);
                    halt = Some(HaltReason::PlanHaltedByFailure {
                        action: action.kind(),
                        failure: reason.clone(),
                    });
                }
                _ => {}
            }

            entries.push(ReportEntry {
                action: action.clone(),
                outcome,
            });
        }

        Execution {
            entries,
            halt,
            state: working,
        }
    }

    async fn step(
        &self,
        domain: &DomainName,
        action: &Action,
        working: &mut DomainState,
        options: ExecuteOptions<'_>,
    ) -> ActionOutcome {
        if let Err(reason) = self.refresh(domain, action, working).await {
            return ActionOutcome::Failed { reason };
        }

        if !action.precondition().holds(working) {
            info!("{} already satisfied for {}, skipping", action, domain);
            return ActionOutcome::SkippedAlreadySatisfied;
        }

        if options.dry_run {
            info!("[DRY-RUN] Would {} for {}", action, domain);
            return ActionOutcome::SkippedDryRun;
        }

        if action.requires_confirmation() && !options.confirm.confirm(action) {
            return ActionOutcome::SkippedUnconfirmed;
        }

        match self.apply(domain, action, working).await {
            Ok(()) => {
                info!("Applied {} for {}", action, domain);
                ActionOutcome::Applied
            }
            Err(reason) => ActionOutcome::Failed { reason },
        }
    }

    /// Re-probe the facts that are cheap to re-check for `action`
    async fn refresh(
        &self,
        domain: &DomainName,
        action: &Action,
        working: &mut DomainState,
    ) -> Result<(), ProviderFailure> {
        match action.payload() {
            ActionPayload::Registration { .. } => {
                let registered = self
                    .registrar
                    .is_registered(domain)
                    .await
                    .map_err(failure(self.registrar.provider_name(), "is_registered"))?;
                debug!("Re-probed registration of {}: {}", domain, registered);
                working.is_registered = Observed::Known(registered);
            }
            ActionPayload::Zone => {
                let zone = self
                    .dns
                    .zone_exists(domain)
                    .await
                    .map_err(failure(self.dns.provider_name(), "zone_exists"))?;
                debug!("Re-probed zone of {}: {:?}", domain, zone);
                working.zone = Observed::Known(zone);
            }
            _ => {}
        }
        Ok(())
    }

    /// Invoke the provider capability for `action` and advance `working`
    async fn apply(
        &self,
        domain: &DomainName,
        action: &Action,
        working: &mut DomainState,
    ) -> Result<(), ProviderFailure> {
        match action.payload() {
            ActionPayload::Registration { .. } => {
                let result = self
                    .registrar
                    .register(domain)
                    .await
                    .map_err(failure(self.registrar.provider_name(), "register"))?;
                info!(
                    "Registered {} (order: {:?}, charged: {:?})",
                    domain, result.order_id, result.charged_amount
                );
                working.is_registered = Observed::Known(true);
                // A fresh registration delegates to the registrar's defaults
                working.registrar_nameservers = Observed::Unknown;
            }
            ActionPayload::Zone => {
                let created = self
                    .dns
                    .create_zone(domain)
                    .await
                    .map_err(failure(self.dns.provider_name(), "create_zone"))?;
                info!(
                    "Created zone {} for {} (nameservers: {})",
                    created.zone.id,
                    domain,
                    created.name_servers.join(", ")
                );
                working.zone = Observed::Known(Some(created.zone));
                working.edge_nameservers = Observed::Known(created.name_servers);
                working.baseline_records_present = Observed::Known(BTreeSet::new());
                if working.worker_subdomain_configured.is_some() {
                    working.worker_subdomain_configured = Some(Observed::Known(false));
                }
            }
            ActionPayload::Nameservers { target } => {
                let target = match target {
                    Some(target) if !target.is_empty() => target.clone(),
                    _ => self.edge_nameservers(domain, working).await?,
                };
                if target.is_empty() {
                    return Err(ProviderFailure::engine(
                        "set_nameservers",
                        format!("edge provider assigned no nameservers to {}", domain),
                    ));
                }

                self.registrar
                    .set_nameservers(domain, &target)
                    .await
                    .map_err(failure(self.registrar.provider_name(), "set_nameservers"))?;
                working.registrar_nameservers = Observed::Known(target);
            }
            ActionPayload::BaselineRecord { record } => {
                let zone_id = require_zone(domain, working, "upsert_baseline_records")?;
                let applied = self
                    .dns
                    .upsert_baseline_records(&zone_id, domain, &[*record])
                    .await
                    .map_err(failure(self.dns.provider_name(), "upsert_baseline_records"))?;
                if !applied.contains(record) {
                    return Err(ProviderFailure::engine(
                        "upsert_baseline_records",
                        format!(
                            "{} did not report {} as applied",
                            self.dns.provider_name(),
                            record
                        ),
                    ));
                }

                let mut present = working
                    .baseline_records_present
                    .known()
                    .cloned()
                    .unwrap_or_default();
                present.extend(applied);
                working.baseline_records_present = Observed::Known(present);
            }
            ActionPayload::WorkerSubdomain { hostname } => {
                let zone_id = require_zone(domain, working, "configure_worker_subdomain")?;
                self.dns
                    .configure_worker_subdomain(&zone_id, domain)
                    .await
                    .map_err(failure(self.dns.provider_name(), "configure_worker_subdomain"))?;
                debug!("Worker subdomain {} in place", hostname);
                working.worker_subdomain_configured = Some(Observed::Known(true));
            }
        }
        Ok(())
    }

    /// Edge nameservers from the working state, or fetched from the zone
    async fn edge_nameservers(
        &self,
        domain: &DomainName,
        working: &mut DomainState,
    ) -> Result<Vec<String>, ProviderFailure> {
        if let Some(edge) = working.edge_nameservers.known()
            && !edge.is_empty()
        {
            return Ok(edge.clone());
        }

        let zone_id = require_zone(domain, working, "get_assigned_nameservers")?;
        let nameservers = self
            .dns
            .get_assigned_nameservers(&zone_id)
            .await
            .map_err(failure(self.dns.provider_name(), "get_assigned_nameservers"))?;
        working.edge_nameservers = Observed::Known(nameservers.clone());
        Ok(nameservers)
    }
}

fn require_zone(
    domain: &DomainName,
    working: &DomainState,
    operation: &str,
) -> Result<String, ProviderFailure> {
    working.zone_id().map(str::to_string).ok_or_else(|| {
        ProviderFailure::engine(operation, format!("no zone is known for {}", domain))
    })
}

fn failure(
    provider: &'static str,
    operation: &'static str,
) -> impl FnOnce(crate::Error) -> ProviderFailure {
    move |e| ProviderFailure::new(provider, operation, &e)
}

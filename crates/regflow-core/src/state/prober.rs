//! State prober
//!
//! Queries both providers and assembles a [`DomainState`]. Failures are
//! captured per fact; one provider being down never hides what the other
//! one reports.

use super::{DomainName, DomainState, Observed, ProviderFailure};
use crate::traits::{DnsProvider, Registrar};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// What to probe beyond the always-probed facts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProbeOptions {
    /// Probe the worker subdomain
    pub include_worker_subdomain: bool,
    /// Fetch a registration quote when the domain is not registered
    pub include_registration_quote: bool,
}

/// A (possibly partial) snapshot and the failures encountered building it
#[derive(Debug, Clone, PartialEq)]
pub struct Probe {
    pub state: DomainState,
    pub failures: Vec<ProviderFailure>,
}

impl Probe {
    /// Whether every provider call succeeded
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Read-only view of both providers
pub struct StateProber<'a> {
    registrar: &'a dyn Registrar,
    dns: &'a dyn DnsProvider,
}

impl<'a> StateProber<'a> {
    pub fn new(registrar: &'a dyn Registrar, dns: &'a dyn DnsProvider) -> Self {
        Self { registrar, dns }
    }

    /// Probe `domain` across both providers
    ///
    /// Never fails: every provider error becomes an `Unknown` fact plus an
    /// entry in [`Probe::failures`].
    pub async fn probe(&self, domain: &DomainName, options: ProbeOptions) -> Probe {
        let registrar = self.registrar.provider_name();
        let edge = self.dns.provider_name();
        let mut state = DomainState::new(domain.clone());
        let mut failures = Vec::new();

        // Registrar side
        let registered = self.registrar.is_registered(domain).await;
        state.is_registered = capture(&mut failures, registrar, "is_registered", registered);

        state.registrar_nameservers = match state.is_registered {
            Observed::Known(true) => {
                let nameservers = self.registrar.get_nameservers(domain).await;
                capture(&mut failures, registrar, "get_nameservers", nameservers)
            }
            // An unregistered domain has no delegation
            Observed::Known(false) => Observed::Known(Vec::new()),
            Observed::Unknown => Observed::Unknown,
        };

        if options.include_registration_quote && state.is_registered == Observed::Known(false) {
            let quote = self.registrar.quote_registration(domain).await;
            state.registration_quote =
                Some(capture(&mut failures, registrar, "quote_registration", quote));
        }

        // Edge side
        let zone = self.dns.zone_exists(domain).await;
        state.zone = capture(&mut failures, edge, "zone_exists", zone);

        match state.zone.clone() {
            Observed::Known(Some(zone)) => {
                let nameservers = self.dns.get_assigned_nameservers(&zone.id).await;
                state.edge_nameservers =
                    capture(&mut failures, edge, "get_assigned_nameservers", nameservers);

                let records = self.dns.baseline_records_present(&zone.id, domain).await;
                state.baseline_records_present =
                    capture(&mut failures, edge, "baseline_records_present", records);

                if options.include_worker_subdomain {
                    let worker = self.dns.worker_subdomain_configured(&zone.id, domain).await;
                    state.worker_subdomain_configured =
                        Some(capture(&mut failures, edge, "worker_subdomain_configured", worker));
                }
            }
            Observed::Known(None) => {
                state.edge_nameservers = Observed::Known(Vec::new());
                state.baseline_records_present = Observed::Known(BTreeSet::new());
                if options.include_worker_subdomain {
                    state.worker_subdomain_configured = Some(Observed::Known(false));
                }
            }
            Observed::Unknown => {
                if options.include_worker_subdomain {
                    state.worker_subdomain_configured = Some(Observed::Unknown);
                }
            }
        }

        debug!(
            "Probed {}: registered={:?} zone_exists={:?} failures={}",
            domain,
            state.is_registered,
            state.zone_exists(),
            failures.len()
        );

        Probe { state, failures }
    }
}

fn capture<T>(
    failures: &mut Vec<ProviderFailure>,
    provider: &str,
    operation: &str,
    result: crate::Result<T>,
) -> Observed<T> {
    match result {
        Ok(value) => Observed::Known(value),
        Err(e) => {
            warn!("{}.{} failed during probe: {}", provider, operation, e);
            failures.push(ProviderFailure::new(provider, operation, &e));
            Observed::Unknown
        }
    }
}

//! Reconciler: diff current against desired state into a [`Plan`]

use super::{Action, BlockReason, DesiredState, IncompleteReason, Plan};
use crate::state::{DomainState, Observed};
use tracing::debug;

/// Compute the ordered plan that moves `current` to `desired`
///
/// Pure and deterministic: the same inputs always yield the same plan. A
/// facet already in its desired state produces no action.
///
/// - Unknown registration state blocks planning entirely.
/// - An unregistered domain without permission to register yields an empty,
///   incomplete plan: nothing downstream of registration is attempted.
/// - A registration quote that was requested but could not be fetched, or
///   that rules the registration out, blocks planning.
pub fn plan(current: &DomainState, desired: &DesiredState) -> Plan {
    let domain = current.domain.clone();
    let mut actions = Vec::new();

    match current.is_registered {
        Observed::Unknown => {
            debug!("Registration state of {} unknown, refusing to plan", domain);
            return Plan::blocked(domain, BlockReason::AmbiguousRegistrationState);
        }
        Observed::Known(false) if !desired.allow_registration => {
            debug!("{} is not registered and registration is not allowed", domain);
            return Plan::incomplete(domain, IncompleteReason::RegistrationNotAllowed);
        }
        Observed::Known(false) => {
            let quote = match &current.registration_quote {
                // Requested but unanswered: never register without price and balance
                Some(Observed::Unknown) => {
                    debug!("Registration quote for {} unavailable, refusing to plan", domain);
                    return Plan::blocked(domain, BlockReason::QuoteUnavailable);
                }
                Some(Observed::Known(quote)) => Some(quote.clone()),
                None => None,
            };

            if let Some(quote) = &quote {
                if !quote.available {
                    return Plan::blocked(domain, BlockReason::DomainUnavailable);
                }
                if let Some((required, available)) = quote.shortfall() {
                    return Plan::blocked(
                        domain,
                        BlockReason::InsufficientBalance {
                            required,
                            available,
                        },
                    );
                }
            }

            actions.push(Action::register_domain(quote));
        }
        Observed::Known(true) => {}
    }

    if desired.zone_present && !current.zone_exists().is_known_and(|exists| *exists) {
        actions.push(Action::create_zone());
    }

    if !current.nameservers_in_sync() {
        actions.push(Action::update_registrar_nameservers(
            desired.nameservers.clone(),
        ));
    }

    for record in &desired.baseline_records {
        if !current.has_baseline_record(*record) {
            actions.push(Action::upsert_baseline_record(*record));
        }
    }

    if desired.worker_subdomain && !current.worker_subdomain_present() {
        actions.push(Action::configure_worker_subdomain(&domain));
    }

    debug!("Planned {} action(s) for {}", actions.len(), domain);
    Plan::ready(domain, actions)
}

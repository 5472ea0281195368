//! Desired-state resolution
//!
//! Pure policy: what a fully set-up domain looks like, given user intent.

use crate::state::{BaselineRecord, DomainName, DomainState};
use std::collections::BTreeSet;

/// User intent for a setup pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Registration may be attempted (cost-incurring)
    pub allow_registration: bool,
    /// Set up the worker subdomain
    pub include_worker_subdomain: bool,
}

/// Target state of a domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredState {
    pub domain: DomainName,
    /// The domain should be registered (always `true`)
    pub registered: bool,
    /// Whether registration is actionable in this pass
    pub allow_registration: bool,
    /// A zone should exist at the edge provider (always `true`)
    pub zone_present: bool,
    /// Delegation target: the edge nameservers, when already known
    ///
    /// `None` means "whatever the zone gets assigned", learned once the zone
    /// exists.
    pub nameservers: Option<Vec<String>>,
    /// Baseline records that should be present
    pub baseline_records: BTreeSet<BaselineRecord>,
    /// The worker subdomain should be configured
    pub worker_subdomain: bool,
}

/// Resolve the desired state for `current` under `options`
pub fn resolve_desired(current: &DomainState, options: ResolveOptions) -> DesiredState {
    let nameservers = match (current.zone_exists().known(), current.edge_nameservers.known()) {
        (Some(true), Some(edge)) if !edge.is_empty() => Some(edge.clone()),
        _ => None,
    };

    DesiredState {
        domain: current.domain.clone(),
        registered: true,
        allow_registration: options.allow_registration,
        zone_present: true,
        nameservers,
        baseline_records: BaselineRecord::ALL.into_iter().collect(),
        worker_subdomain: options.include_worker_subdomain,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Observed, ZoneInfo};

    #[test]
    fn test_nameserver_target_known_only_with_zone() {
        let mut state = DomainState::new(DomainName::parse("example.com").unwrap());
        state.edge_nameservers = Observed::Known(vec!["ns1.cf.com".to_string()]);

        let desired = resolve_desired(&state, ResolveOptions::default());
        assert_eq!(desired.nameservers, None);

        state.zone = Observed::Known(Some(ZoneInfo {
            id: "z".to_string(),
            status: "active".to_string(),
        }));
        let desired = resolve_desired(&state, ResolveOptions::default());
        assert_eq!(desired.nameservers, Some(vec!["ns1.cf.com".to_string()]));
    }

    #[test]
    fn test_options_carry_through() {
        let state = DomainState::new(DomainName::parse("example.com").unwrap());
        let desired = resolve_desired(
            &state,
            ResolveOptions {
                allow_registration: true,
                include_worker_subdomain: true,
            },
        );

        assert!(desired.registered && desired.zone_present);
        assert!(desired.allow_registration);
        assert!(desired.worker_subdomain);
        assert_eq!(desired.baseline_records.len(), BaselineRecord::ALL.len());
    }
}

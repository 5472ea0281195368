// # DNS Provider Trait
//
// Defines the interface for the edge provider hosting the authoritative
// zone for a domain.
//
// ## Implementations
//
// - Cloudflare: `regflow-provider-cloudflare` crate

use crate::state::{BaselineRecord, DomainName, ZoneInfo};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A zone created by [`DnsProvider::create_zone`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedZone {
    /// Zone identifier and initial status
    pub zone: ZoneInfo,
    /// Nameservers the registrar must delegate to
    pub name_servers: Vec<String>,
}

/// Trait for DNS provider implementations
///
/// # Trust Level: Untrusted
///
/// DNS providers follow the same limitations as registrars:
///
/// - ✅ Perform HTTP/HTTPS API calls to their endpoints only
/// - ✅ Return success or failure
/// - ❌ Retry or back off (a failed call halts the pass; the pass is re-run)
/// - ❌ Decide whether an operation is needed (owned by the `Reconciler`)
/// - ❌ Access the registrar or any other provider
///
/// # Idempotency
///
/// Every mutating method must be safe to call again after it succeeded.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Look up the zone for `domain`; `Ok(None)` when no zone exists
    async fn zone_exists(&self, domain: &DomainName) -> Result<Option<ZoneInfo>, crate::Error>;

    /// Create a zone for `domain`
    async fn create_zone(&self, domain: &DomainName) -> Result<CreatedZone, crate::Error>;

    /// Nameservers assigned to the zone, in provider order
    async fn get_assigned_nameservers(&self, zone_id: &str) -> Result<Vec<String>, crate::Error>;

    /// Baseline records already present in the zone
    async fn baseline_records_present(
        &self,
        zone_id: &str,
        domain: &DomainName,
    ) -> Result<BTreeSet<BaselineRecord>, crate::Error>;

    /// Create or update each of `records`, returning the records now in place
    async fn upsert_baseline_records(
        &self,
        zone_id: &str,
        domain: &DomainName,
        records: &[BaselineRecord],
    ) -> Result<BTreeSet<BaselineRecord>, crate::Error>;

    /// Whether the worker subdomain exists in the zone
    async fn worker_subdomain_configured(
        &self,
        zone_id: &str,
        domain: &DomainName,
    ) -> Result<bool, crate::Error>;

    /// Create or update the worker subdomain
    async fn configure_worker_subdomain(
        &self,
        zone_id: &str,
        domain: &DomainName,
    ) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing DNS providers from configuration
pub trait DnsProviderFactory: Send + Sync {
    /// Create a DnsProvider instance from configuration
    fn create(
        &self,
        config: &crate::config::ProviderConfig,
    ) -> Result<Box<dyn DnsProvider>, crate::Error>;
}

//! Domain state model
//!
//! A [`DomainState`] is a point-in-time snapshot of everything regflow can
//! observe about one domain across the registrar and the edge provider. It
//! is produced fresh by the [`StateProber`] at the start of every pass and
//! never persisted: the two providers are the state.
//!
//! Facts that may fail to load are [`Observed`] values. A failed provider
//! call leaves the fact `Unknown` and is recorded as a [`ProviderFailure`]
//! next to the snapshot instead of aborting the probe.

mod domain;
mod prober;
mod records;

pub use domain::DomainName;
pub use prober::{Probe, ProbeOptions, StateProber};
pub use records::{
    BaselineRecord, PLACEHOLDER_ORIGIN, RecordSpec, WORKER_SUBDOMAIN_LABEL, worker_subdomain_spec,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A fact that was either observed or could not be determined
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum Observed<T> {
    /// The provider answered
    Known(T),
    /// The provider call failed (see the accompanying [`ProviderFailure`])
    Unknown,
}

impl<T> Observed<T> {
    /// The observed value, if any
    pub fn known(&self) -> Option<&T> {
        match self {
            Observed::Known(value) => Some(value),
            Observed::Unknown => None,
        }
    }

    /// Whether the fact was observed
    pub fn is_known(&self) -> bool {
        matches!(self, Observed::Known(_))
    }

    /// `true` only when the fact is known and satisfies `predicate`
    pub fn is_known_and(&self, predicate: impl FnOnce(&T) -> bool) -> bool {
        self.known().is_some_and(predicate)
    }

    /// Map the observed value
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Observed<U> {
        match self {
            Observed::Known(value) => Observed::Known(f(value)),
            Observed::Unknown => Observed::Unknown,
        }
    }
}

impl<T> From<Option<T>> for Observed<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Observed::Unknown, Observed::Known)
    }
}

/// A zone provisioned at the edge provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneInfo {
    /// Provider-specific zone identifier
    pub id: String,
    /// Zone status as reported by the provider (e.g. "active", "pending")
    pub status: String,
}

/// Quote for registering a domain that is not yet registered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationQuote {
    /// The name can be registered
    pub available: bool,
    /// The name is a premium name with special pricing
    pub premium: bool,
    /// One-year registration price, if the registrar reported one
    pub price: Option<f64>,
    /// Currency of `price` and `balance`
    pub currency: Option<String>,
    /// Available account balance, if the registrar reported one
    pub balance: Option<f64>,
}

impl RegistrationQuote {
    /// `(required, available)` when the known balance cannot cover the known price
    pub fn shortfall(&self) -> Option<(f64, f64)> {
        match (self.price, self.balance) {
            (Some(price), Some(balance)) if balance < price => Some((price, balance)),
            _ => None,
        }
    }
}

/// A provider call that failed while probing or executing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderFailure {
    /// Provider name (e.g. "namecheap", "cloudflare")
    pub provider: String,
    /// Capability that was invoked (e.g. "is_registered")
    pub operation: String,
    /// Error message
    pub message: String,
}

impl ProviderFailure {
    pub fn new(
        provider: impl Into<String>,
        operation: impl Into<String>,
        error: &crate::Error,
    ) -> Self {
        Self {
            provider: provider.into(),
            operation: operation.into(),
            message: error.to_string(),
        }
    }

    /// A failure that was detected by the engine rather than reported by a provider
    pub fn engine(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            provider: "regflow".to_string(),
            operation: operation.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}: {}", self.provider, self.operation, self.message)
    }
}

/// Snapshot of one domain across both providers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainState {
    /// The domain this snapshot describes
    pub domain: DomainName,

    /// When the snapshot was taken
    pub probed_at: DateTime<Utc>,

    /// Whether the domain is registered in the registrar account
    pub is_registered: Observed<bool>,

    /// Zone at the edge provider: `Known(None)` means no zone exists
    pub zone: Observed<Option<ZoneInfo>>,

    /// Nameservers delegated at the registrar, in registrar order
    pub registrar_nameservers: Observed<Vec<String>>,

    /// Nameservers the edge provider assigned to the zone, in provider order
    ///
    /// Empty when no zone exists.
    pub edge_nameservers: Observed<Vec<String>>,

    /// Baseline records found in the zone
    pub baseline_records_present: Observed<BTreeSet<BaselineRecord>>,

    /// Whether the worker subdomain exists; `None` when it was not probed
    pub worker_subdomain_configured: Option<Observed<bool>>,

    /// Registration quote; `None` when it was not requested
    pub registration_quote: Option<Observed<RegistrationQuote>>,
}

impl DomainState {
    /// A snapshot in which nothing is known yet
    pub fn new(domain: DomainName) -> Self {
        Self {
            domain,
            probed_at: Utc::now(),
            is_registered: Observed::Unknown,
            zone: Observed::Unknown,
            registrar_nameservers: Observed::Unknown,
            edge_nameservers: Observed::Unknown,
            baseline_records_present: Observed::Unknown,
            worker_subdomain_configured: None,
            registration_quote: None,
        }
    }

    /// Tri-state zone existence
    pub fn zone_exists(&self) -> Observed<bool> {
        self.zone.clone().map(|zone| zone.is_some())
    }

    /// Zone identifier, present iff the zone is known to exist
    pub fn zone_id(&self) -> Option<&str> {
        self.zone.known().and_then(|z| z.as_ref()).map(|z| z.id.as_str())
    }

    /// Zone status, present iff the zone is known to exist
    pub fn zone_status(&self) -> Option<&str> {
        self.zone
            .known()
            .and_then(|z| z.as_ref())
            .map(|z| z.status.as_str())
    }

    /// Whether the registrar already delegates to the edge nameservers
    ///
    /// `false` whenever either side is unknown or empty.
    pub fn nameservers_in_sync(&self) -> bool {
        match (self.registrar_nameservers.known(), self.edge_nameservers.known()) {
            (Some(registrar), Some(edge)) => nameservers_match(registrar, edge),
            _ => false,
        }
    }

    /// Whether `record` is known to be present
    pub fn has_baseline_record(&self, record: BaselineRecord) -> bool {
        self.baseline_records_present
            .is_known_and(|present| present.contains(&record))
    }

    /// Whether the worker subdomain is known to be configured
    pub fn worker_subdomain_present(&self) -> bool {
        self.worker_subdomain_configured
            .as_ref()
            .is_some_and(|configured| configured.is_known_and(|c| *c))
    }
}

/// Order-insensitive, case-insensitive set equality over hostnames
///
/// A trailing dot is ignored. Two empty lists never match: an empty
/// delegation is never a desired state.
pub fn nameservers_match(a: &[String], b: &[String]) -> bool {
    let normalize = |hosts: &[String]| -> BTreeSet<String> {
        hosts
            .iter()
            .map(|h| h.trim().trim_end_matches('.').to_ascii_lowercase())
            .filter(|h| !h.is_empty())
            .collect()
    };

    let a = normalize(a);
    !a.is_empty() && a == normalize(b)
}

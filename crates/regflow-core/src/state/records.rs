//! Baseline DNS records and the worker subdomain
//!
//! The baseline is a small fixed set. Record content points at the
//! documentation address `192.0.2.1`; traffic is proxied at the edge so the
//! placeholder origin is never contacted directly.

use super::DomainName;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder origin for proxied records
pub const PLACEHOLDER_ORIGIN: &str = "192.0.2.1";

/// Label of the optional worker subdomain
pub const WORKER_SUBDOMAIN_LABEL: &str = "app";

/// Identity of a baseline record
///
/// Ordering follows declaration order, which is the order records are
/// upserted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaselineRecord {
    /// `A` record at the zone apex
    Apex,
    /// `CNAME www` pointing at the apex
    Www,
}

impl BaselineRecord {
    /// Every baseline record, in upsert order
    pub const ALL: [BaselineRecord; 2] = [BaselineRecord::Apex, BaselineRecord::Www];

    /// Concrete record to publish for `domain`
    pub fn spec(self, domain: &DomainName) -> RecordSpec {
        match self {
            BaselineRecord::Apex => RecordSpec {
                record_type: "A",
                name: domain.as_str().to_string(),
                content: PLACEHOLDER_ORIGIN.to_string(),
                proxied: true,
            },
            BaselineRecord::Www => RecordSpec {
                record_type: "CNAME",
                name: domain.subdomain("www"),
                content: domain.as_str().to_string(),
                proxied: true,
            },
        }
    }

    /// Whether an existing record `(record_type, name)` is this record
    pub fn matches(self, domain: &DomainName, record_type: &str, name: &str) -> bool {
        let spec = self.spec(domain);
        spec.record_type.eq_ignore_ascii_case(record_type)
            && spec.name.eq_ignore_ascii_case(name.trim_end_matches('.'))
    }
}

impl fmt::Display for BaselineRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaselineRecord::Apex => f.write_str("apex A"),
            BaselineRecord::Www => f.write_str("www CNAME"),
        }
    }
}

/// Worker subdomain record for `domain`
pub fn worker_subdomain_spec(domain: &DomainName) -> RecordSpec {
    RecordSpec {
        record_type: "A",
        name: domain.subdomain(WORKER_SUBDOMAIN_LABEL),
        content: PLACEHOLDER_ORIGIN.to_string(),
        proxied: true,
    }
}

/// A DNS record as published at the edge provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordSpec {
    /// Record type (`A`, `CNAME`)
    pub record_type: &'static str,
    /// Fully qualified record name
    pub name: String,
    /// Record content
    pub content: String,
    /// Whether traffic is proxied through the edge
    pub proxied: bool,
}

//! Test doubles and common utilities for reconciliation contract tests
//!
//! Both mock providers operate on one shared [`World`], so a mutation made
//! through the registrar is visible to later probes of either side, exactly
//! like the real providers being the only state.

#![allow(dead_code)]

use async_trait::async_trait;
use regflow_core::error::{Error, Result};
use regflow_core::traits::{CreatedZone, DnsProvider, Registrar, RegistrationResult};
use regflow_core::{
    BaselineRecord, DomainName, ReconcileConfig, ReconcileEngine, RegistrationQuote, ZoneInfo,
};
use std::collections::{BTreeSet, HashSet};
use std::sync::{Arc, Mutex};

/// Operations that change provider state
pub const MUTATIONS: &[&str] = &[
    "register",
    "set_nameservers",
    "create_zone",
    "upsert_baseline_records",
    "configure_worker_subdomain",
];

/// Nameservers the mock edge assigns to new zones
pub fn edge_nameservers() -> Vec<String> {
    vec![
        "ada.ns.cloudflare.com".to_string(),
        "bob.ns.cloudflare.com".to_string(),
    ]
}

/// Nameservers a fresh registration delegates to
pub fn registrar_default_nameservers() -> Vec<String> {
    vec![
        "dns1.registrar-servers.com".to_string(),
        "dns2.registrar-servers.com".to_string(),
    ]
}

/// Provider-side truth shared by both mocks
#[derive(Debug, Clone)]
pub struct World {
    pub registered: bool,
    pub registrar_nameservers: Vec<String>,
    pub zone: Option<ZoneInfo>,
    pub zone_nameservers: Vec<String>,
    pub records: BTreeSet<BaselineRecord>,
    pub worker: bool,
    pub quote: RegistrationQuote,
    /// Operations that fail every time they are called
    pub failing: HashSet<&'static str>,
    /// Every provider call in order
    pub calls: Vec<&'static str>,
    /// Third-party changes applied right before a given call is answered
    pub drift: Vec<Drift>,
    /// Zone ids passed to zone-scoped edge calls, in order
    pub zone_ids: Vec<String>,
}

/// A change someone else makes to the providers during a pass
#[derive(Debug, Clone)]
pub struct Drift {
    pub operation: &'static str,
    /// 1-based call number of `operation` that observes the change first
    pub call: usize,
    pub apply: fn(&mut World),
}

impl World {
    /// Registered, no zone at the edge
    pub fn registered_without_zone() -> Self {
        Self {
            registered: true,
            registrar_nameservers: registrar_default_nameservers(),
            zone: None,
            zone_nameservers: Vec::new(),
            records: BTreeSet::new(),
            worker: false,
            quote: affordable_quote(),
            failing: HashSet::new(),
            calls: Vec::new(),
            drift: Vec::new(),
            zone_ids: Vec::new(),
        }
    }

    /// Not registered anywhere
    pub fn unregistered() -> Self {
        Self {
            registered: false,
            registrar_nameservers: Vec::new(),
            ..Self::registered_without_zone()
        }
    }

    /// Fully set up: registered, delegated, records and worker in place
    pub fn fully_configured() -> Self {
        Self {
            registered: true,
            registrar_nameservers: edge_nameservers(),
            zone: Some(active_zone()),
            zone_nameservers: edge_nameservers(),
            records: BaselineRecord::ALL.iter().copied().collect(),
            worker: true,
            ..Self::registered_without_zone()
        }
    }

    pub fn failing(mut self, operation: &'static str) -> Self {
        self.failing.insert(operation);
        self
    }

    pub fn drifting(mut self, operation: &'static str, call: usize, apply: fn(&mut World)) -> Self {
        self.drift.push(Drift {
            operation,
            call,
            apply,
        });
        self
    }

    pub fn calls_to(&self, operation: &str) -> usize {
        self.calls.iter().filter(|c| **c == operation).count()
    }

    pub fn mutation_calls(&self) -> Vec<&'static str> {
        self.calls
            .iter()
            .copied()
            .filter(|c| MUTATIONS.contains(c))
            .collect()
    }
}

pub fn active_zone() -> ZoneInfo {
    ZoneInfo {
        id: "zone-123".to_string(),
        status: "active".to_string(),
    }
}

pub fn affordable_quote() -> RegistrationQuote {
    RegistrationQuote {
        available: true,
        premium: false,
        price: Some(10.98),
        currency: Some("USD".to_string()),
        balance: Some(50.0),
    }
}

pub type SharedWorld = Arc<Mutex<World>>;

pub fn shared(world: World) -> SharedWorld {
    Arc::new(Mutex::new(world))
}

/// Record a call and fail it if scripted to
fn enter<'a>(
    world: &'a SharedWorld,
    operation: &'static str,
) -> Result<std::sync::MutexGuard<'a, World>> {
    let mut guard = world.lock().unwrap();
    guard.calls.push(operation);
    let call = guard.calls_to(operation);
    let changes: Vec<fn(&mut World)> = guard
        .drift
        .iter()
        .filter(|d| d.operation == operation && d.call == call)
        .map(|d| d.apply)
        .collect();
    for apply in changes {
        apply(&mut *guard);
    }
    if guard.failing.contains(operation) {
        return Err(Error::http(format!("{} unavailable (503)", operation)));
    }
    Ok(guard)
}

/// Registrar backed by a [`World`]
pub struct MockRegistrar {
    world: SharedWorld,
}

impl MockRegistrar {
    pub fn new(world: SharedWorld) -> Self {
        Self { world }
    }
}

#[async_trait]
impl Registrar for MockRegistrar {
    async fn is_registered(&self, _domain: &DomainName) -> Result<bool> {
        Ok(enter(&self.world, "is_registered")?.registered)
    }

    async fn register(&self, domain: &DomainName) -> Result<RegistrationResult> {
        let mut world = enter(&self.world, "register")?;
        world.registered = true;
        world.registrar_nameservers = registrar_default_nameservers();
        Ok(RegistrationResult {
            domain: domain.clone(),
            order_id: Some("order-1".to_string()),
            charged_amount: world.quote.price,
        })
    }

    async fn get_nameservers(&self, _domain: &DomainName) -> Result<Vec<String>> {
        Ok(enter(&self.world, "get_nameservers")?
            .registrar_nameservers
            .clone())
    }

    async fn set_nameservers(&self, _domain: &DomainName, nameservers: &[String]) -> Result<()> {
        enter(&self.world, "set_nameservers")?.registrar_nameservers = nameservers.to_vec();
        Ok(())
    }

    async fn quote_registration(&self, _domain: &DomainName) -> Result<RegistrationQuote> {
        Ok(enter(&self.world, "quote_registration")?.quote.clone())
    }

    fn provider_name(&self) -> &'static str {
        "mock-registrar"
    }
}

/// DNS provider backed by a [`World`]
pub struct MockDnsProvider {
    world: SharedWorld,
}

impl MockDnsProvider {
    pub fn new(world: SharedWorld) -> Self {
        Self { world }
    }
}

#[async_trait]
impl DnsProvider for MockDnsProvider {
    async fn zone_exists(&self, _domain: &DomainName) -> Result<Option<ZoneInfo>> {
        Ok(enter(&self.world, "zone_exists")?.zone.clone())
    }

    async fn create_zone(&self, _domain: &DomainName) -> Result<CreatedZone> {
        let mut world = enter(&self.world, "create_zone")?;
        let zone = ZoneInfo {
            id: "zone-123".to_string(),
            status: "pending".to_string(),
        };
        world.zone = Some(zone.clone());
        world.zone_nameservers = edge_nameservers();
        Ok(CreatedZone {
            zone,
            name_servers: edge_nameservers(),
        })
    }

    async fn get_assigned_nameservers(&self, zone_id: &str) -> Result<Vec<String>> {
        let mut world = enter(&self.world, "get_assigned_nameservers")?;
        world.zone_ids.push(zone_id.to_string());
        Ok(world.zone_nameservers.clone())
    }

    async fn baseline_records_present(
        &self,
        _zone_id: &str,
        _domain: &DomainName,
    ) -> Result<BTreeSet<BaselineRecord>> {
        Ok(enter(&self.world, "baseline_records_present")?
            .records
            .clone())
    }

    async fn upsert_baseline_records(
        &self,
        zone_id: &str,
        _domain: &DomainName,
        records: &[BaselineRecord],
    ) -> Result<BTreeSet<BaselineRecord>> {
        let mut world = enter(&self.world, "upsert_baseline_records")?;
        world.zone_ids.push(zone_id.to_string());
        world.records.extend(records.iter().copied());
        Ok(records.iter().copied().collect())
    }

    async fn worker_subdomain_configured(
        &self,
        _zone_id: &str,
        _domain: &DomainName,
    ) -> Result<bool> {
        Ok(enter(&self.world, "worker_subdomain_configured")?.worker)
    }

    async fn configure_worker_subdomain(&self, zone_id: &str, _domain: &DomainName) -> Result<()> {
        let mut world = enter(&self.world, "configure_worker_subdomain")?;
        world.zone_ids.push(zone_id.to_string());
        world.worker = true;
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "mock-edge"
    }
}

/// Engine over both mocks with default reconcile settings
pub fn engine(world: &SharedWorld) -> ReconcileEngine {
    ReconcileEngine::new(
        Box::new(MockRegistrar::new(world.clone())),
        Box::new(MockDnsProvider::new(world.clone())),
        ReconcileConfig::default(),
    )
}

pub fn domain() -> DomainName {
    DomainName::parse("example.com").unwrap()
}

/// Confirmation callback that accepts everything and counts how often it was asked
pub fn accept_all(asked: Arc<Mutex<usize>>) -> impl Fn(&regflow_core::Action) -> bool + Send + Sync {
    move |_| {
        *asked.lock().unwrap() += 1;
        true
    }
}

pub fn decline_all(asked: Arc<Mutex<usize>>) -> impl Fn(&regflow_core::Action) -> bool + Send + Sync {
    move |_| {
        *asked.lock().unwrap() += 1;
        false
    }
}

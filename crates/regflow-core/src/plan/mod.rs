//! Actions and plans
//!
//! A [`Plan`] is the ordered list of [`Action`]s that moves a domain from
//! its probed state to the desired state. Plans are built once per pass by
//! [`plan`] and never modified afterwards; the executor only reads them.
//!
//! ## Ordering
//!
//! ```text
//! RegisterDomain → CreateZone → UpdateRegistrarNameservers
//!                → UpsertBaselineRecord (×N) → ConfigureWorkerSubdomain
//! ```
//!
//! Nameserver sync needs a zone to learn the edge nameservers from, record
//! upserts need a zone, and the worker subdomain is additive.

mod desired;
mod reconciler;

pub use desired::{DesiredState, ResolveOptions, resolve_desired};
pub use reconciler::plan;

use crate::state::{BaselineRecord, DomainName, DomainState, RegistrationQuote};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// What an action does; declaration order is dependency order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    RegisterDomain,
    CreateZone,
    UpdateRegistrarNameservers,
    UpsertBaselineRecord,
    ConfigureWorkerSubdomain,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionKind::RegisterDomain => "register domain",
            ActionKind::CreateZone => "create zone",
            ActionKind::UpdateRegistrarNameservers => "update registrar nameservers",
            ActionKind::UpsertBaselineRecord => "upsert baseline record",
            ActionKind::ConfigureWorkerSubdomain => "configure worker subdomain",
        };
        f.write_str(name)
    }
}

/// How an action affects the account it runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskClass {
    /// Free and additive
    Safe,
    /// Charges the account
    CostIncurring,
    /// Removes existing configuration
    Destructive,
}

impl fmt::Display for RiskClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskClass::Safe => f.write_str("safe"),
            RiskClass::CostIncurring => f.write_str("cost-incurring"),
            RiskClass::Destructive => f.write_str("destructive"),
        }
    }
}

/// Action-specific parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionPayload {
    /// The quote obtained while probing, if any
    Registration { quote: Option<RegistrationQuote> },
    /// No parameters; the zone is named after the domain
    Zone,
    /// Target delegation; `None` when it is learned once the zone exists
    Nameservers { target: Option<Vec<String>> },
    /// The record to upsert
    BaselineRecord { record: BaselineRecord },
    /// Hostname of the worker subdomain
    WorkerSubdomain { hostname: String },
}

/// Predicate over [`DomainState`] that must hold right before execution
///
/// If it no longer holds, the action's effect is already in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "record", rename_all = "snake_case")]
pub enum Precondition {
    DomainUnregistered,
    ZoneAbsent,
    NameserversOutOfSync,
    BaselineRecordMissing(BaselineRecord),
    WorkerSubdomainMissing,
}

impl Precondition {
    /// Evaluate against `state`
    ///
    /// Unknown facts count as "still needed": only a positively observed
    /// effect makes an action redundant.
    pub fn holds(&self, state: &DomainState) -> bool {
        match self {
            Precondition::DomainUnregistered => !state.is_registered.is_known_and(|r| *r),
            Precondition::ZoneAbsent => !state.zone_exists().is_known_and(|e| *e),
            Precondition::NameserversOutOfSync => !state.nameservers_in_sync(),
            Precondition::BaselineRecordMissing(record) => !state.has_baseline_record(*record),
            Precondition::WorkerSubdomainMissing => !state.worker_subdomain_present(),
        }
    }
}

/// A single idempotent operation against one provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    kind: ActionKind,
    risk_class: RiskClass,
    payload: ActionPayload,
    precondition: Precondition,
}

impl Action {
    pub fn register_domain(quote: Option<RegistrationQuote>) -> Self {
        Self {
            kind: ActionKind::RegisterDomain,
            risk_class: RiskClass::CostIncurring,
            payload: ActionPayload::Registration { quote },
            precondition: Precondition::DomainUnregistered,
        }
    }

    pub fn create_zone() -> Self {
        Self {
            kind: ActionKind::CreateZone,
            risk_class: RiskClass::Safe,
            payload: ActionPayload::Zone,
            precondition: Precondition::ZoneAbsent,
        }
    }

    pub fn update_registrar_nameservers(target: Option<Vec<String>>) -> Self {
        Self {
            kind: ActionKind::UpdateRegistrarNameservers,
            risk_class: RiskClass::Safe,
            payload: ActionPayload::Nameservers { target },
            precondition: Precondition::NameserversOutOfSync,
        }
    }

    pub fn upsert_baseline_record(record: BaselineRecord) -> Self {
        Self {
            kind: ActionKind::UpsertBaselineRecord,
            risk_class: RiskClass::Safe,
            payload: ActionPayload::BaselineRecord { record },
            precondition: Precondition::BaselineRecordMissing(record),
        }
    }

    pub fn configure_worker_subdomain(domain: &DomainName) -> Self {
        Self {
            kind: ActionKind::ConfigureWorkerSubdomain,
            risk_class: RiskClass::Safe,
            payload: ActionPayload::WorkerSubdomain {
                hostname: domain.subdomain(crate::state::WORKER_SUBDOMAIN_LABEL),
            },
            precondition: Precondition::WorkerSubdomainMissing,
        }
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    pub fn risk_class(&self) -> RiskClass {
        self.risk_class
    }

    pub fn payload(&self) -> &ActionPayload {
        &self.payload
    }

    pub fn precondition(&self) -> Precondition {
        self.precondition
    }

    /// Whether the action needs confirmation before it runs
    pub fn requires_confirmation(&self) -> bool {
        self.risk_class != RiskClass::Safe
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.payload {
            ActionPayload::Nameservers {
                target: Some(target),
            } => write!(f, "{} → {}", self.kind, target.join(", ")),
            ActionPayload::Nameservers { target: None } => {
                write!(f, "{} → zone nameservers", self.kind)
            }
            ActionPayload::BaselineRecord { record } => write!(f, "{} ({})", self.kind, record),
            ActionPayload::WorkerSubdomain { hostname } => write!(f, "{} ({})", self.kind, hostname),
            ActionPayload::Registration { .. } | ActionPayload::Zone => {
                write!(f, "{}", self.kind)
            }
        }
    }
}

/// Why planning refused to produce any action
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum BlockReason {
    /// Registration state could not be determined
    #[error("registration state could not be determined; refusing to plan")]
    AmbiguousRegistrationState,

    /// A registration quote was requested but could not be obtained
    #[error("registration quote could not be obtained; refusing to register")]
    QuoteUnavailable,

    /// The registrar reports the name as unavailable
    #[error("domain is not available for registration")]
    DomainUnavailable,

    /// The account balance cannot cover the registration price
    #[error("insufficient balance: required {required:.2}, available {available:.2}")]
    InsufficientBalance { required: f64, available: f64 },
}

/// Why a plan stops short of the desired state
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncompleteReason {
    /// Domain is unregistered and registration was not allowed
    #[error("domain is not registered and registration was not allowed")]
    RegistrationNotAllowed,
}

/// Whether a plan covers the whole desired state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum PlanStatus {
    /// The actions reach the desired state (possibly zero actions)
    Ready,
    /// Some facets cannot be reached in this pass
    Incomplete(IncompleteReason),
    /// Planning was refused; the plan is empty
    Blocked(BlockReason),
}

/// Immutable ordered list of actions for one pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    domain: DomainName,
    actions: Vec<Action>,
    status: PlanStatus,
}

impl Plan {
    pub(crate) fn ready(domain: DomainName, actions: Vec<Action>) -> Self {
        Self {
            domain,
            actions,
            status: PlanStatus::Ready,
        }
    }

    pub(crate) fn incomplete(domain: DomainName, reason: IncompleteReason) -> Self {
        Self {
            domain,
            actions: Vec::new(),
            status: PlanStatus::Incomplete(reason),
        }
    }

    pub(crate) fn blocked(domain: DomainName, reason: BlockReason) -> Self {
        Self {
            domain,
            actions: Vec::new(),
            status: PlanStatus::Blocked(reason),
        }
    }

    pub fn domain(&self) -> &DomainName {
        &self.domain
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn status(&self) -> &PlanStatus {
        &self.status
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self.status, PlanStatus::Blocked(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Observed, ZoneInfo};

    #[test]
    fn test_only_registration_is_cost_incurring() {
        let domain = DomainName::parse("example.com").unwrap();
        let actions = [
            Action::register_domain(None),
            Action::create_zone(),
            Action::update_registrar_nameservers(None),
            Action::upsert_baseline_record(BaselineRecord::Apex),
            Action::configure_worker_subdomain(&domain),
        ];

        for action in &actions {
            let expected = action.kind() == ActionKind::RegisterDomain;
            assert_eq!(action.requires_confirmation(), expected, "{}", action);
        }
        assert_eq!(actions[0].risk_class(), RiskClass::CostIncurring);
    }

    #[test]
    fn test_preconditions_treat_unknown_as_needed() {
        let domain = DomainName::parse("example.com").unwrap();
        let mut state = DomainState::new(domain);

        assert!(Precondition::DomainUnregistered.holds(&state));
        assert!(Precondition::ZoneAbsent.holds(&state));
        assert!(Precondition::BaselineRecordMissing(BaselineRecord::Www).holds(&state));

        state.is_registered = Observed::Known(true);
        state.zone = Observed::Known(Some(ZoneInfo {
            id: "z".to_string(),
            status: "active".to_string(),
        }));
        assert!(!Precondition::DomainUnregistered.holds(&state));
        assert!(!Precondition::ZoneAbsent.holds(&state));
    }

    #[test]
    fn test_action_display() {
        let action = Action::update_registrar_nameservers(Some(vec![
            "ns1.cf.com".to_string(),
            "ns2.cf.com".to_string(),
        ]));
        assert_eq!(
            action.to_string(),
            "update registrar nameservers → ns1.cf.com, ns2.cf.com"
        );
    }
}

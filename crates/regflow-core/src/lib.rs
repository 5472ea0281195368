// # regflow-core
//
// Reconciliation core that brings a domain's registrar and DNS edge
// provider into a consistent, desired state.
//
// ## Architecture Overview
//
// - **Registrar** / **DnsProvider**: Capability traits implemented by provider crates
// - **StateProber**: Assembles a `DomainState` snapshot from both providers
// - **resolve_desired** / **plan**: Pure policy and diff into an ordered `Plan`
// - **ActionExecutor**: Walks the plan with dry-run and confirmation gating
// - **ReconcileEngine**: One probe → plan → execute pass, returning a `Report`
// - **ProviderRegistry**: Composition-time provider selection
//
// ## Design Principles
//
// 1. **Providers are the state**: Nothing is persisted between passes
// 2. **Idempotent actions**: A halted pass is repaired by running it again
// 3. **Fail closed**: Unknown registration state never leads to action
// 4. **Errors are data**: Provider failures land in the report, never abort a pass
// 5. **Library-first**: The binary is a thin shell over this crate

pub mod config;
pub mod engine;
pub mod error;
pub mod plan;
pub mod registry;
pub mod report;
pub mod state;
pub mod traits;

// Re-export core types for convenience
pub use config::{
    ProviderConfig, ReconcileConfig, RegflowConfig, RegistrantContact, RegistrarConfig,
};
pub use engine::{ActionExecutor, Confirm, ExecuteOptions, ReconcileEngine, RunRequest};
pub use error::{Error, Result};
pub use plan::{
    Action, ActionKind, ActionPayload, BlockReason, IncompleteReason, Plan, PlanStatus, RiskClass,
};
pub use registry::ProviderRegistry;
pub use report::{ActionOutcome, HaltReason, Report, ReportEntry, RunMode};
pub use state::{
    BaselineRecord, DomainName, DomainState, Observed, ProviderFailure, RegistrationQuote,
    StateProber, ZoneInfo,
};
pub use traits::{DnsProvider, Registrar};

// # Registrar Trait
//
// Defines the interface for the service of record for domain ownership and
// nameserver delegation.
//
// ## Implementations
//
// - Namecheap: `regflow-registrar-namecheap` crate
//
// ## Usage
//
// ```rust,ignore
// use regflow_core::{DomainName, Registrar};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let registrar = /* Registrar implementation */;
//     let domain = DomainName::parse("example.com")?;
//
//     if registrar.is_registered(&domain).await? {
//         let nameservers = registrar.get_nameservers(&domain).await?;
//         println!("{:?}", nameservers);
//     }
//
//     Ok(())
// }
// ```

use crate::state::{DomainName, RegistrationQuote};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result of a successful registration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationResult {
    /// The registered domain
    pub domain: DomainName,
    /// Registrar order identifier, if reported
    pub order_id: Option<String>,
    /// Amount charged to the account, if reported
    pub charged_amount: Option<f64>,
}

/// Trait for registrar implementations
///
/// # Trust Level: Untrusted
///
/// Registrars are isolated, stateless, single-shot components:
///
/// - ✅ Perform HTTP/HTTPS API calls to their endpoints only
/// - ✅ Parse provider-specific responses
/// - ✅ Return success or failure
/// - ❌ Retry, back off or rate limit (owned by the provider client config, not the core)
/// - ❌ Decide whether an operation is needed (owned by the `Reconciler`)
/// - ❌ Ask for confirmation (owned by the `ActionExecutor` via its callback)
/// - ❌ Spawn tasks or cache state between calls
#[async_trait]
pub trait Registrar: Send + Sync {
    /// Whether the domain is registered in this account
    async fn is_registered(&self, domain: &DomainName) -> Result<bool, crate::Error>;

    /// Register the domain
    ///
    /// ⚠️ Cost-incurring. Only ever called by the executor after the
    /// confirm callback accepted the `RegisterDomain` action.
    async fn register(&self, domain: &DomainName) -> Result<RegistrationResult, crate::Error>;

    /// Nameservers currently delegated for the domain, in registrar order
    async fn get_nameservers(&self, domain: &DomainName) -> Result<Vec<String>, crate::Error>;

    /// Replace the domain's delegation with `nameservers`
    ///
    /// Idempotent: setting the current list again is a no-op at the registrar.
    async fn set_nameservers(
        &self,
        domain: &DomainName,
        nameservers: &[String],
    ) -> Result<(), crate::Error>;

    /// Availability, price and balance for registering an unregistered domain
    async fn quote_registration(
        &self,
        domain: &DomainName,
    ) -> Result<RegistrationQuote, crate::Error>;

    /// Get the registrar name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing registrars from configuration
pub trait RegistrarFactory: Send + Sync {
    /// Create a Registrar instance from configuration
    fn create(
        &self,
        config: &crate::config::RegistrarConfig,
    ) -> Result<Box<dyn Registrar>, crate::Error>;
}

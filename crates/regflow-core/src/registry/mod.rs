//! Composition-time provider registry
//!
//! Provider crates register factories under a type name; the binary then
//! builds exactly one registrar and one DNS provider from configuration
//! before a pass starts. Nothing is selected at call time.
//!
//! ## Registration
//!
//! ```rust,ignore
//! # use regflow_core::registry::ProviderRegistry;
//! // In regflow-provider-cloudflare
//! pub fn register(registry: &ProviderRegistry) {
//!     registry.register_dns_provider("cloudflare", Box::new(CloudflareFactory));
//! }
//! ```

use crate::config::{ProviderConfig, RegistrarConfig};
use crate::error::{Error, Result};
use crate::traits::{DnsProvider, DnsProviderFactory, Registrar, RegistrarFactory};
use std::collections::HashMap;
use std::sync::RwLock;

/// Registry of registrar and DNS provider factories
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct ProviderRegistry {
    /// Registered registrar factories
    registrars: RwLock<HashMap<String, Box<dyn RegistrarFactory>>>,

    /// Registered DNS provider factories
    dns_providers: RwLock<HashMap<String, Box<dyn DnsProviderFactory>>>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a registrar factory under `name` (e.g. "namecheap")
    pub fn register_registrar(&self, name: impl Into<String>, factory: Box<dyn RegistrarFactory>) {
        let mut registrars = self
            .registrars
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        registrars.insert(name.into(), factory);
    }

    /// Register a DNS provider factory under `name` (e.g. "cloudflare")
    pub fn register_dns_provider(
        &self,
        name: impl Into<String>,
        factory: Box<dyn DnsProviderFactory>,
    ) {
        let mut providers = self
            .dns_providers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        providers.insert(name.into(), factory);
    }

    /// Create a registrar from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn Registrar>)`: Created registrar instance
    /// - `Err(Error)`: If the registrar type is not registered or creation fails
    pub fn create_registrar(&self, config: &RegistrarConfig) -> Result<Box<dyn Registrar>> {
        let registrar_type = config.type_name();
        let registrars = self
            .registrars
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let factory = registrars
            .get(registrar_type)
            .ok_or_else(|| Error::config(format!("Unknown registrar type: {}", registrar_type)))?;

        factory.create(config)
    }

    /// Create a DNS provider from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn DnsProvider>)`: Created provider instance
    /// - `Err(Error)`: If the provider type is not registered or creation fails
    pub fn create_dns_provider(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>> {
        let provider_type = config.type_name();
        let providers = self
            .dns_providers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let factory = providers
            .get(provider_type)
            .ok_or_else(|| Error::config(format!("Unknown provider type: {}", provider_type)))?;

        factory.create(config)
    }

    /// List all registered registrar types
    pub fn list_registrars(&self) -> Vec<String> {
        let registrars = self
            .registrars
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        registrars.keys().cloned().collect()
    }

    /// List all registered DNS provider types
    pub fn list_dns_providers(&self) -> Vec<String> {
        let providers = self
            .dns_providers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        providers.keys().cloned().collect()
    }

    /// Check if a registrar type is registered
    pub fn has_registrar(&self, name: &str) -> bool {
        let registrars = self
            .registrars
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        registrars.contains_key(name)
    }

    /// Check if a DNS provider type is registered
    pub fn has_dns_provider(&self, name: &str) -> bool {
        let providers = self
            .dns_providers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        providers.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockProviderFactory;

    impl DnsProviderFactory for MockProviderFactory {
        fn create(&self, _config: &ProviderConfig) -> Result<Box<dyn DnsProvider>> {
            Err(Error::not_found("Mock provider not implemented"))
        }
    }

    struct MockRegistrarFactory;

    impl RegistrarFactory for MockRegistrarFactory {
        fn create(&self, _config: &RegistrarConfig) -> Result<Box<dyn Registrar>> {
            Err(Error::not_found("Mock registrar not implemented"))
        }
    }

    #[test]
    fn test_registry_registration() {
        let registry = ProviderRegistry::new();

        assert!(!registry.has_dns_provider("mock"));
        assert!(!registry.has_registrar("mock"));

        registry.register_dns_provider("mock", Box::new(MockProviderFactory));
        registry.register_registrar("mock", Box::new(MockRegistrarFactory));

        assert!(registry.has_dns_provider("mock"));
        assert!(registry.has_registrar("mock"));
        assert!(registry.list_dns_providers().contains(&"mock".to_string()));
        assert!(registry.list_registrars().contains(&"mock".to_string()));
    }

    #[test]
    fn test_unknown_type_is_config_error() {
        let registry = ProviderRegistry::new();
        let config = ProviderConfig::Cloudflare {
            api_token: "token".to_string(),
            account_id: None,
        };

        match registry.create_dns_provider(&config) {
            Err(Error::Config(message)) => assert!(message.contains("cloudflare")),
            other => panic!("expected config error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_factory_errors_propagate() {
        let registry = ProviderRegistry::new();
        registry.register_dns_provider("custom-edge", Box::new(MockProviderFactory));
        let config = ProviderConfig::Custom {
            factory: "custom-edge".to_string(),
            config: serde_json::json!({}),
        };

        assert!(matches!(
            registry.create_dns_provider(&config),
            Err(Error::NotFound(_))
        ));
    }
}

//! Provider capability traits
//!
//! This module defines the abstract interfaces the reconciliation core
//! consumes. The core never performs network I/O itself.
//!
//! - [`Registrar`]: Domain ownership and nameserver delegation
//! - [`DnsProvider`]: Zone hosting, baseline records and the worker subdomain

pub mod dns_provider;
pub mod registrar;

pub use dns_provider::{CreatedZone, DnsProvider, DnsProviderFactory};
pub use registrar::{RegistrarFactory, Registrar, RegistrationResult};

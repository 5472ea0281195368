//! Configuration types for regflow
//!
//! This module defines the configuration structures used to compose a
//! reconciliation engine: which registrar and edge provider to talk to, with
//! which credentials, and how the engine behaves around a pass.

use serde::{Deserialize, Serialize};

/// Main regflow configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegflowConfig {
    /// Registrar configuration
    pub registrar: RegistrarConfig,

    /// DNS/edge provider configuration
    pub provider: ProviderConfig,

    /// Optional engine settings
    #[serde(default)]
    pub reconcile: ReconcileConfig,
}

impl RegflowConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.registrar.validate()?;
        self.provider.validate()?;
        Ok(())
    }
}

/// Registrar configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegistrarConfig {
    /// Namecheap XML API
    Namecheap {
        /// API user
        api_user: String,
        /// API key
        api_key: String,
        /// Account username
        username: String,
        /// Whitelisted client IP address
        client_ip: String,
        /// Use the sandbox endpoint
        #[serde(default)]
        sandbox: bool,
        /// Registration period in years
        #[serde(default = "default_registration_years")]
        registration_years: u32,
        /// Contact used for registrant, tech, admin and billing roles
        #[serde(default)]
        registrant: Option<RegistrantContact>,
    },

    /// Custom registrar
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl RegistrarConfig {
    /// Validate the registrar configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            RegistrarConfig::Namecheap {
                api_user,
                api_key,
                username,
                client_ip,
                registration_years,
                registrant,
                ..
            } => {
                for (name, value) in [
                    ("api_user", api_user),
                    ("api_key", api_key),
                    ("username", username),
                    ("client_ip", client_ip),
                ] {
                    if value.trim().is_empty() {
                        return Err(crate::Error::config(format!(
                            "Namecheap {} cannot be empty",
                            name
                        )));
                    }
                }
                if client_ip.parse::<std::net::IpAddr>().is_err() {
                    return Err(crate::Error::config(format!(
                        "Namecheap client_ip must be an IP address. Got: {}",
                        client_ip
                    )));
                }
                if !(1..=10).contains(registration_years) {
                    return Err(crate::Error::config(format!(
                        "Namecheap registration_years must be between 1 and 10. Got: {}",
                        registration_years
                    )));
                }
                if let Some(contact) = registrant {
                    contact.validate()?;
                }
                Ok(())
            }
            RegistrarConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom registrar factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config(
                        "Custom registrar config cannot be null",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Whether a registration can be submitted with this configuration
    ///
    /// Namecheap requires a registrant contact; custom registrars are
    /// expected to check their own configuration.
    pub fn can_register(&self) -> bool {
        match self {
            RegistrarConfig::Namecheap { registrant, .. } => registrant.is_some(),
            RegistrarConfig::Custom { .. } => true,
        }
    }

    /// Get the registrar type name
    pub fn type_name(&self) -> &str {
        match self {
            RegistrarConfig::Namecheap { .. } => "namecheap",
            RegistrarConfig::Custom { factory, .. } => factory,
        }
    }
}

// Credentials stay out of Debug output
impl std::fmt::Debug for RegistrarConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistrarConfig::Namecheap {
                api_user,
                username,
                client_ip,
                sandbox,
                registration_years,
                registrant,
                ..
            } => f
                .debug_struct("Namecheap")
                .field("api_user", api_user)
                .field("api_key", &"<REDACTED>")
                .field("username", username)
                .field("client_ip", client_ip)
                .field("sandbox", sandbox)
                .field("registration_years", registration_years)
                .field("registrant", &registrant.is_some())
                .finish(),
            RegistrarConfig::Custom { factory, .. } => f
                .debug_struct("Custom")
                .field("factory", factory)
                .finish_non_exhaustive(),
        }
    }
}

/// Contact details submitted with a registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrantContact {
    pub first_name: String,
    pub last_name: String,
    pub address1: String,
    pub city: String,
    pub state_province: String,
    pub postal_code: String,
    /// ISO 3166-1 alpha-2 country code
    pub country: String,
    /// Phone in `+NNN.NNNNNNNNNN` format
    pub phone: String,
    pub email_address: String,
}

impl RegistrantContact {
    /// Validate that every field is present and plausibly formatted
    pub fn validate(&self) -> Result<(), crate::Error> {
        for (name, value) in [
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
            ("address1", &self.address1),
            ("city", &self.city),
            ("state_province", &self.state_province),
            ("postal_code", &self.postal_code),
            ("country", &self.country),
            ("phone", &self.phone),
            ("email_address", &self.email_address),
        ] {
            if value.trim().is_empty() {
                return Err(crate::Error::config(format!(
                    "Registrant {} cannot be empty",
                    name
                )));
            }
        }

        if self.country.len() != 2 {
            return Err(crate::Error::config(format!(
                "Registrant country must be a two-letter code. Got: {}",
                self.country
            )));
        }

        if !self.phone.starts_with('+') || !self.phone.contains('.') {
            return Err(crate::Error::config(format!(
                "Registrant phone must look like +1.5551234567. Got: {}",
                self.phone
            )));
        }

        if !self.email_address.contains('@') {
            return Err(crate::Error::config(format!(
                "Registrant email_address is not an email address: {}",
                self.email_address
            )));
        }

        Ok(())
    }
}

/// DNS provider configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Cloudflare provider
    Cloudflare {
        /// Cloudflare API token
        api_token: String,
        /// Account ID zones are created under
        account_id: Option<String>,
    },

    /// Custom provider
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::Cloudflare {
                api_token,
                account_id,
            } => {
                if api_token.is_empty() {
                    return Err(crate::Error::config("Cloudflare API token cannot be empty"));
                }
                if account_id.as_ref().is_some_and(|id| id.trim().is_empty()) {
                    return Err(crate::Error::config(
                        "Cloudflare account ID cannot be blank when set",
                    ));
                }
                Ok(())
            }
            ProviderConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom provider factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config(
                        "Custom provider config cannot be null",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::Cloudflare { .. } => "cloudflare",
            ProviderConfig::Custom { factory, .. } => factory,
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::Cloudflare { account_id, .. } => f
                .debug_struct("Cloudflare")
                .field("api_token", &"<REDACTED>")
                .field("account_id", account_id)
                .finish(),
            ProviderConfig::Custom { factory, .. } => f
                .debug_struct("Custom")
                .field("factory", factory)
                .finish_non_exhaustive(),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Re-probe both providers after a setup pass that applied changes
    #[serde(default = "default_true")]
    pub closing_probe: bool,

    /// Ask the registrar for availability, price and balance before
    /// planning a registration
    #[serde(default = "default_true")]
    pub quote_registration: bool,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            closing_probe: true,
            quote_registration: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_registration_years() -> u32 {
    1
}

//! Environment configuration
//!
//! Configuration is read from environment variables only. Parsing goes
//! through a lookup function so it can be exercised without touching the
//! process environment.

use anyhow::{Context, Result};
use regflow_core::{
    ProviderConfig, ReconcileConfig, RegflowConfig, RegistrantContact, RegistrarConfig,
};
use std::env;

/// Registrant variables, in `RegistrantContact` field order
const REGISTRANT_VARS: [&str; 9] = [
    "NAMECHEAP_REGISTRANT_FIRST_NAME",
    "NAMECHEAP_REGISTRANT_LAST_NAME",
    "NAMECHEAP_REGISTRANT_ADDRESS1",
    "NAMECHEAP_REGISTRANT_CITY",
    "NAMECHEAP_REGISTRANT_STATE_PROVINCE",
    "NAMECHEAP_REGISTRANT_POSTAL_CODE",
    "NAMECHEAP_REGISTRANT_COUNTRY",
    "NAMECHEAP_REGISTRANT_PHONE",
    "NAMECHEAP_REGISTRANT_EMAIL",
];

/// Application configuration
pub struct Config {
    pub regflow: RegflowConfig,
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`
    ///
    /// Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |key: &str| {
            get(key).with_context(|| {
                format!("{} is required. Set it via: export {}=...", key, key)
            })
        };

        let registrar = RegistrarConfig::Namecheap {
            api_user: require("NAMECHEAP_API_USER")?,
            api_key: require("NAMECHEAP_API_KEY")?,
            username: require("NAMECHEAP_USERNAME")?,
            client_ip: require("NAMECHEAP_CLIENT_IP")?,
            sandbox: parse_flag("NAMECHEAP_SANDBOX", get("NAMECHEAP_SANDBOX"), false)?,
            registration_years: match get("NAMECHEAP_REGISTRATION_YEARS") {
                Some(years) => years.parse().with_context(|| {
                    format!(
                        "NAMECHEAP_REGISTRATION_YEARS must be a whole number. Got: {}",
                        years
                    )
                })?,
                None => 1,
            },
            registrant: registrant(&get)?,
        };

        let provider = ProviderConfig::Cloudflare {
            api_token: require("CLOUDFLARE_API_TOKEN")?,
            account_id: get("CLOUDFLARE_ACCOUNT_ID"),
        };

        let reconcile = ReconcileConfig {
            closing_probe: parse_flag("REGFLOW_CLOSING_PROBE", get("REGFLOW_CLOSING_PROBE"), true)?,
            ..ReconcileConfig::default()
        };

        Ok(Self {
            regflow: RegflowConfig {
                registrar,
                provider,
                reconcile,
            },
            log_level: get("REGFLOW_LOG_LEVEL").unwrap_or_else(|| "warn".to_string()),
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.regflow.validate()?;

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "REGFLOW_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    /// Check that a registration could be submitted if one is planned
    pub fn validate_registration(&self) -> Result<()> {
        if !self.regflow.registrar.can_register() {
            anyhow::bail!(
                "Registration requires a registrant contact. Set {}",
                REGISTRANT_VARS.join(", ")
            );
        }
        Ok(())
    }
}

/// Registrant contact: all variables or none
fn registrant(get: &impl Fn(&str) -> Option<String>) -> Result<Option<RegistrantContact>> {
    let values: Vec<Option<String>> = REGISTRANT_VARS.iter().map(|key| get(key)).collect();

    if values.iter().all(Option::is_none) {
        return Ok(None);
    }

    let missing: Vec<&str> = REGISTRANT_VARS
        .iter()
        .zip(&values)
        .filter(|(_, value)| value.is_none())
        .map(|(key, _)| *key)
        .collect();
    if !missing.is_empty() {
        anyhow::bail!(
            "Registrant contact is incomplete. Missing: {}",
            missing.join(", ")
        );
    }

    let mut fields = values.into_iter().flatten();
    let mut next = || fields.next().unwrap_or_default();
    Ok(Some(RegistrantContact {
        first_name: next(),
        last_name: next(),
        address1: next(),
        city: next(),
        state_province: next(),
        postal_code: next(),
        country: next(),
        phone: next(),
        email_address: next(),
    }))
}

fn parse_flag(key: &str, value: Option<String>, default: bool) -> Result<bool> {
    match value.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None => Ok(default),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => anyhow::bail!("{} must be true or false. Got: {}", key, other),
    }
}

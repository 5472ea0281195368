// # Namecheap Registrar
//
// This crate provides the Namecheap registrar for regflow over the
// Namecheap XML API: account membership, delegation, registration and the
// pre-registration quote.
//
// ## Implementation Notes
//
// - ✅ One logical API operation per capability call (the quote is three reads)
// - ✅ Full error propagation; a failed lookup is never read as "not registered"
// - ✅ HTTP timeout configured (60 seconds)
// - ✅ `Status="ERROR"` responses reported with Namecheap's own messages
// - ✅ Sandbox endpoint support
// - ❌ NO retry logic, NO backoff
// - ❌ NO caching between calls
//
// ### Trust Level: Untrusted (Registrar)
//
// - ✅ Perform HTTP/HTTPS API calls to the Namecheap API only
// - ❌ Decide whether a registration should happen (owned by the reconciler
//   and the confirmation callback)
//
// ## Security Requirements
//
// - API key NEVER appears in logs or Debug output
// - Requests are only accepted from the whitelisted client IP
//
// ## API Reference
//
// - https://www.namecheap.com/support/api/methods/
// - `namecheap.domains.getList`, `namecheap.domains.getInfo`
// - `namecheap.domains.dns.setCustom`, `namecheap.domains.create`
// - `namecheap.domains.check`, `namecheap.users.getPricing`,
//   `namecheap.users.getBalances`

mod xml;

use async_trait::async_trait;
use regflow_core::config::RegistrarConfig;
use regflow_core::traits::{Registrar, RegistrarFactory, RegistrationResult};
use regflow_core::{DomainName, Error, RegistrantContact, RegistrationQuote, Result};
use std::time::Duration;
use xml::ApiResponse;

/// Production API endpoint
const NAMECHEAP_API_BASE: &str = "https://api.namecheap.com/xml.response";

/// Sandbox API endpoint
const NAMECHEAP_SANDBOX_BASE: &str = "https://api.sandbox.namecheap.com/xml.response";

/// Default HTTP timeout for API requests (60 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// Page size for `domains.getList`
const LIST_PAGE_SIZE: &str = "100";

const NO_PARAMS: &[(&str, String)] = &[];

/// Contact roles `domains.create` requires, each taking the full contact
const CONTACT_ROLES: [&str; 4] = ["Registrant", "Tech", "Admin", "AuxBilling"];

/// Namecheap registrar
///
/// # Trust Level: Untrusted
///
/// Stateless and single-shot; every capability call maps to Namecheap API
/// commands and nothing is remembered between calls.
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the API key.
pub struct NamecheapRegistrar {
    api_user: String,

    /// Namecheap API key
    /// ⚠️ NEVER log this value
    api_key: String,

    username: String,
    client_ip: String,

    /// API endpoint (production or sandbox)
    base_url: String,

    /// Registration period passed to `domains.create`
    registration_years: u32,

    /// Contact for every role of a new registration
    registrant: Option<RegistrantContact>,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for NamecheapRegistrar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamecheapRegistrar")
            .field("api_user", &self.api_user)
            .field("api_key", &"<REDACTED>")
            .field("username", &self.username)
            .field("client_ip", &self.client_ip)
            .field("base_url", &self.base_url)
            .field("registration_years", &self.registration_years)
            .field("registrant", &self.registrant.is_some())
            .finish()
    }
}

impl NamecheapRegistrar {
    /// Create a new Namecheap registrar
    ///
    /// # Parameters
    ///
    /// - `api_user` / `username`: Account the API acts on
    /// - `api_key`: API key from the Namecheap profile
    /// - `client_ip`: IP address whitelisted for API access
    /// - `sandbox`: Use the sandbox endpoint
    pub fn new(
        api_user: impl Into<String>,
        api_key: impl Into<String>,
        username: impl Into<String>,
        client_ip: impl Into<String>,
        sandbox: bool,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::config("Namecheap API key cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = if sandbox {
            NAMECHEAP_SANDBOX_BASE
        } else {
            NAMECHEAP_API_BASE
        };

        Ok(Self {
            api_user: api_user.into(),
            api_key,
            username: username.into(),
            client_ip: client_ip.into(),
            base_url: base_url.to_string(),
            registration_years: 1,
            registrant: None,
            client,
        })
    }

    /// Set the registration period and contact used by `register`
    pub fn with_registration(mut self, years: u32, registrant: Option<RegistrantContact>) -> Self {
        self.registration_years = years;
        self.registrant = registrant;
        self
    }

    /// Point the registrar at a different endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Run one API command
    async fn call<K>(&self, command: &str, params: &[(K, String)]) -> Result<ApiResponse>
    where
        K: AsRef<str> + Sync,
    {
        tracing::debug!("Namecheap {}", command);

        let mut query: Vec<(&str, &str)> = vec![
            ("ApiUser", self.api_user.as_str()),
            ("ApiKey", self.api_key.as_str()),
            ("UserName", self.username.as_str()),
            ("ClientIp", self.client_ip.as_str()),
            ("Command", command),
        ];
        query.extend(params.iter().map(|(k, v)| (k.as_ref(), v.as_str())));

        let response = self
            .client
            .get(&self.base_url)
            .query(&query)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::http(format!("API request timed out for command: {}", command))
                } else {
                    Error::http(format!("API request failed for command {}: {}", command, e))
                }
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Error::http(format!("Failed to read {} response: {}", command, e)))?;

        if !(200..300).contains(&status) {
            return Err(map_status(status, command));
        }

        ApiResponse::parse(&body, command)
    }

    /// Query parameters for `domains.create`
    fn registration_params(&self, domain: &DomainName) -> Result<Vec<(String, String)>> {
        let contact = self.registrant.as_ref().ok_or_else(|| {
            Error::config(format!(
                "No registrant contact configured; cannot register {}",
                domain
            ))
        })?;

        let mut params = vec![
            ("DomainName".to_string(), domain.as_str().to_string()),
            ("Years".to_string(), self.registration_years.to_string()),
        ];
        params.extend(contact_params(contact));
        Ok(params)
    }
}

#[async_trait]
impl Registrar for NamecheapRegistrar {
    async fn is_registered(&self, domain: &DomainName) -> Result<bool> {
        let response = self
            .call(
                "namecheap.domains.getList",
                &[
                    ("ListType", "ALL".to_string()),
                    ("SearchTerm", domain.as_str().to_string()),
                    ("PageSize", LIST_PAGE_SIZE.to_string()),
                ],
            )
            .await?;
        Ok(domain_listed(&response, domain))
    }

    async fn register(&self, domain: &DomainName) -> Result<RegistrationResult> {
        let params = self.registration_params(domain)?;
        tracing::info!(
            "Registering {} with Namecheap for {} year(s)",
            domain,
            self.registration_years
        );
        let response = self.call("namecheap.domains.create", &params).await?;
        registration_result(&response, domain)
    }

    async fn get_nameservers(&self, domain: &DomainName) -> Result<Vec<String>> {
        let response = self
            .call(
                "namecheap.domains.getInfo",
                &[("DomainName", domain.as_str().to_string())],
            )
            .await?;
        Ok(delegated_nameservers(&response))
    }

    async fn set_nameservers(&self, domain: &DomainName, nameservers: &[String]) -> Result<()> {
        if nameservers.is_empty() {
            return Err(Error::invalid_input(format!(
                "Refusing to delegate {} to an empty nameserver list",
                domain
            )));
        }

        tracing::info!(
            "Setting Namecheap nameservers for {}: {}",
            domain,
            nameservers.join(", ")
        );
        let response = self
            .call(
                "namecheap.domains.dns.setCustom",
                &[
                    ("SLD", domain.sld().to_string()),
                    ("TLD", domain.tld().to_string()),
                    ("Nameservers", nameservers.join(",")),
                ],
            )
            .await?;
        nameservers_updated(&response, domain)
    }

    async fn quote_registration(&self, domain: &DomainName) -> Result<RegistrationQuote> {
        let check = self
            .call(
                "namecheap.domains.check",
                &[("DomainList", domain.as_str().to_string())],
            )
            .await?;
        let availability = availability(&check, domain)?;

        if !availability.available {
            return Ok(RegistrationQuote {
                available: false,
                premium: availability.premium,
                price: None,
                currency: None,
                balance: None,
            });
        }

        let (price, currency) = match availability.premium_price {
            Some(price) => (Some(price), None),
            None => {
                let pricing = self
                    .call(
                        "namecheap.users.getPricing",
                        &[
                            ("ProductType", "DOMAIN".to_string()),
                            ("ProductCategory", "DOMAINS".to_string()),
                            ("ActionName", "REGISTER".to_string()),
                            ("ProductName", domain.tld().to_ascii_uppercase()),
                        ],
                    )
                    .await?;
                match one_year_price(&pricing, domain.tld()) {
                    Some((price, currency)) => (Some(price), currency),
                    None => {
                        tracing::warn!("No one-year pricing found for .{}", domain.tld());
                        (None, None)
                    }
                }
            }
        };

        let balances = self.call("namecheap.users.getBalances", NO_PARAMS).await?;
        let (balance, balance_currency) = available_balance(&balances)?;

        Ok(RegistrationQuote {
            available: true,
            premium: availability.premium,
            price,
            currency: currency.or(balance_currency),
            balance: Some(balance),
        })
    }

    fn provider_name(&self) -> &'static str {
        "namecheap"
    }
}

/// Contact fields under every role prefix
fn contact_params(contact: &RegistrantContact) -> Vec<(String, String)> {
    let fields: [(&str, &str); 9] = [
        ("FirstName", &contact.first_name),
        ("LastName", &contact.last_name),
        ("Address1", &contact.address1),
        ("City", &contact.city),
        ("StateProvince", &contact.state_province),
        ("PostalCode", &contact.postal_code),
        ("Country", &contact.country),
        ("Phone", &contact.phone),
        ("EmailAddress", &contact.email_address),
    ];

    let mut params = Vec::with_capacity(CONTACT_ROLES.len() * fields.len());
    for role in CONTACT_ROLES {
        for (field, value) in fields {
            params.push((format!("{}{}", role, field), value.to_string()));
        }
    }
    params
}

/// Whether `domains.getList` lists `domain`
fn domain_listed(response: &ApiResponse, domain: &DomainName) -> bool {
    response.find_all("Domain").any(|d| {
        d.attr("Name")
            .is_some_and(|name| name.eq_ignore_ascii_case(domain.as_str()))
    })
}

/// Nameservers from `domains.getInfo`
fn delegated_nameservers(response: &ApiResponse) -> Vec<String> {
    response
        .find_all("Nameserver")
        .map(|ns| ns.text.trim().to_ascii_lowercase())
        .filter(|ns| !ns.is_empty())
        .collect()
}

fn nameservers_updated(response: &ApiResponse, domain: &DomainName) -> Result<()> {
    let result = response.require("DomainDNSSetCustomResult", "namecheap.domains.dns.setCustom")?;
    if result.flag("Updated") {
        Ok(())
    } else {
        Err(Error::registrar(format!(
            "Namecheap did not update nameservers for {}",
            domain
        )))
    }
}

fn registration_result(response: &ApiResponse, domain: &DomainName) -> Result<RegistrationResult> {
    let result = response.require("DomainCreateResult", "namecheap.domains.create")?;
    if !result.flag("Registered") {
        return Err(Error::registrar(format!(
            "Namecheap did not register {}",
            domain
        )));
    }

    Ok(RegistrationResult {
        domain: domain.clone(),
        order_id: result.attr("OrderID").map(str::to_string),
        charged_amount: result.amount("ChargedAmount"),
    })
}

struct Availability {
    available: bool,
    premium: bool,
    premium_price: Option<f64>,
}

fn availability(response: &ApiResponse, domain: &DomainName) -> Result<Availability> {
    let result = response
        .find_all("DomainCheckResult")
        .find(|r| {
            r.attr("Domain")
                .is_some_and(|d| d.eq_ignore_ascii_case(domain.as_str()))
        })
        .ok_or_else(|| {
            Error::provider(
                "namecheap",
                format!("Could not find domain check result for {}", domain),
            )
        })?;

    let premium = result.flag("IsPremiumName");
    Ok(Availability {
        available: result.flag("Available"),
        premium,
        premium_price: result
            .amount("PremiumRegistrationPrice")
            .filter(|price| premium && *price > 0.0),
    })
}

/// One-year registration price and currency for `tld`
fn one_year_price(response: &ApiResponse, tld: &str) -> Option<(f64, Option<String>)> {
    // Price elements follow their Product element in document order
    let mut in_product = false;
    for element in response.find_all_of(&["Product", "Price"]) {
        match element.name.as_str() {
            "Product" => {
                in_product = element
                    .attr("Name")
                    .is_some_and(|name| name.eq_ignore_ascii_case(tld));
            }
            _ if in_product && element.attr("Duration") == Some("1") => {
                if let Some(price) = element.amount("Price") {
                    return Some((price, element.attr("Currency").map(str::to_string)));
                }
            }
            _ => {}
        }
    }
    None
}

fn available_balance(response: &ApiResponse) -> Result<(f64, Option<String>)> {
    let result = response.require("UserGetBalancesResult", "namecheap.users.getBalances")?;
    let balance = result.amount("AvailableBalance").ok_or_else(|| {
        Error::provider("namecheap", "Could not retrieve account balance")
    })?;
    Ok((balance, result.attr("Currency").map(str::to_string)))
}

/// Map HTTP status codes to specific errors
fn map_status(status: u16, command: &str) -> Error {
    match status {
        401 | 403 => Error::auth(format!(
            "Namecheap rejected {} (status {}); check the API key and client IP whitelist",
            command, status
        )),
        429 => Error::rate_limited(format!("Namecheap rate limit exceeded for {}", command)),
        500..=599 => Error::provider(
            "namecheap",
            format!("Namecheap server error (transient) for {}: {}", command, status),
        ),
        _ => Error::provider(
            "namecheap",
            format!("Namecheap request {} failed with status {}", command, status),
        ),
    }
}

/// Factory for creating Namecheap registrars
pub struct NamecheapFactory;

impl RegistrarFactory for NamecheapFactory {
    fn create(&self, config: &RegistrarConfig) -> Result<Box<dyn Registrar>> {
        match config {
            RegistrarConfig::Namecheap {
                api_user,
                api_key,
                username,
                client_ip,
                sandbox,
                registration_years,
                registrant,
            } => {
                config.validate()?;
                if *sandbox {
                    tracing::warn!("Namecheap registrar using the sandbox endpoint");
                }

                let registrar = NamecheapRegistrar::new(
                    api_user.clone(),
                    api_key.clone(),
                    username.clone(),
                    client_ip.clone(),
                    *sandbox,
                )?
                .with_registration(*registration_years, registrant.clone());
                Ok(Box::new(registrar))
            }
            _ => Err(Error::config("Invalid config for Namecheap registrar")),
        }
    }
}

/// Register the Namecheap registrar with a registry
///
/// # Example
///
/// ```rust
/// use regflow_core::ProviderRegistry;
///
/// let registry = ProviderRegistry::new();
/// regflow_registrar_namecheap::register(&registry);
/// assert!(registry.has_registrar("namecheap"));
/// ```
pub fn register(registry: &regflow_core::ProviderRegistry) {
    registry.register_registrar("namecheap", Box::new(NamecheapFactory));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domain() -> DomainName {
        DomainName::parse("example.com").unwrap()
    }

    fn ok(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<ApiResponse Status="OK" xmlns="http://api.namecheap.com/xml.response">
  <Errors />
  <CommandResponse>{}</CommandResponse>
</ApiResponse>"#,
            body
        )
    }

    fn parse(body: &str) -> ApiResponse {
        ApiResponse::parse(&ok(body), "test").unwrap()
    }

    fn contact() -> RegistrantContact {
        RegistrantContact {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            address1: "1 Analytical Way".to_string(),
            city: "London".to_string(),
            state_province: "London".to_string(),
            postal_code: "N1 9GU".to_string(),
            country: "GB".to_string(),
            phone: "+44.2071234567".to_string(),
            email_address: "ada@example.org".to_string(),
        }
    }

    fn registrar() -> NamecheapRegistrar {
        NamecheapRegistrar::new("user", "secret_key_98765", "user", "203.0.113.7", true).unwrap()
    }

    #[test]
    fn test_domain_listed() {
        let response = parse(
            r#"<DomainGetListResult>
                 <Domain ID="127" Name="Example.com" User="user" IsExpired="false" />
                 <Domain ID="128" Name="example.net" User="user" IsExpired="false" />
               </DomainGetListResult>"#,
        );
        assert!(domain_listed(&response, &domain()));
        assert!(!domain_listed(&parse("<DomainGetListResult />"), &domain()));
    }

    #[test]
    fn test_delegated_nameservers() {
        let response = parse(
            r#"<DomainGetInfoResult DomainName="example.com">
                 <DnsDetails ProviderType="CUSTOM" IsUsingOurDNS="false">
                   <Nameserver>ADA.NS.CLOUDFLARE.COM</Nameserver>
                   <Nameserver>bob.ns.cloudflare.com</Nameserver>
                 </DnsDetails>
               </DomainGetInfoResult>"#,
        );
        assert_eq!(
            delegated_nameservers(&response),
            vec!["ada.ns.cloudflare.com", "bob.ns.cloudflare.com"]
        );
    }

    #[test]
    fn test_set_custom_result() {
        let updated = parse(r#"<DomainDNSSetCustomResult Domain="example.com" Updated="true" />"#);
        assert!(nameservers_updated(&updated, &domain()).is_ok());

        let rejected = parse(r#"<DomainDNSSetCustomResult Domain="example.com" Updated="false" />"#);
        assert!(nameservers_updated(&rejected, &domain()).is_err());

        assert!(nameservers_updated(&parse(""), &domain()).is_err());
    }

    #[test]
    fn test_registration_result() {
        let response = parse(
            r#"<DomainCreateResult Domain="example.com" Registered="true" ChargedAmount="10.9800"
                 DomainID="9007" OrderID="196074" TransactionID="380716" />"#,
        );
        let result = registration_result(&response, &domain()).unwrap();
        assert_eq!(result.order_id.as_deref(), Some("196074"));
        assert_eq!(result.charged_amount, Some(10.98));

        let failed = parse(r#"<DomainCreateResult Domain="example.com" Registered="false" />"#);
        assert!(registration_result(&failed, &domain()).is_err());
    }

    #[test]
    fn test_availability() {
        let response = parse(
            r#"<DomainCheckResult Domain="example.com" Available="true" IsPremiumName="false"
                 PremiumRegistrationPrice="0" />"#,
        );
        let availability = availability(&response, &domain()).unwrap();
        assert!(availability.available);
        assert!(!availability.premium);
        assert_eq!(availability.premium_price, None);

        let premium = parse(
            r#"<DomainCheckResult Domain="example.com" Available="true" IsPremiumName="true"
                 PremiumRegistrationPrice="1500.0000" />"#,
        );
        assert_eq!(
            super::availability(&premium, &domain()).unwrap().premium_price,
            Some(1500.0)
        );

        let other = parse(r#"<DomainCheckResult Domain="example.net" Available="true" />"#);
        assert!(super::availability(&other, &domain()).is_err());
    }

    #[test]
    fn test_one_year_price() {
        let response = parse(
            r#"<UserGetPricingResult>
                 <ProductType Name="domains">
                   <ProductCategory Name="register">
                     <Product Name="net">
                       <Price Duration="1" DurationType="YEAR" Price="12.98" Currency="USD" />
                     </Product>
                     <Product Name="com">
                       <Price Duration="1" DurationType="YEAR" Price="10.98" Currency="USD" />
                       <Price Duration="2" DurationType="YEAR" Price="10.48" Currency="USD" />
                     </Product>
                   </ProductCategory>
                 </ProductType>
               </UserGetPricingResult>"#,
        );
        assert_eq!(
            one_year_price(&response, "com"),
            Some((10.98, Some("USD".to_string())))
        );
        assert_eq!(one_year_price(&response, "org"), None);
    }

    #[test]
    fn test_available_balance() {
        let response = parse(
            r#"<UserGetBalancesResult Currency="USD" AvailableBalance="4932.96"
                 AccountBalance="4932.96" EarnedAmount="381.70" />"#,
        );
        assert_eq!(
            available_balance(&response).unwrap(),
            (4932.96, Some("USD".to_string()))
        );
        assert!(available_balance(&parse("")).is_err());
    }

    #[test]
    fn test_contact_params_cover_every_role() {
        let params = contact_params(&contact());
        assert_eq!(params.len(), 36);
        for role in CONTACT_ROLES {
            let key = format!("{}EmailAddress", role);
            assert!(
                params
                    .iter()
                    .any(|(k, v)| *k == key && v == "ada@example.org")
            );
        }
        assert!(params.iter().all(|(k, _)| !k.is_empty()));
    }

    #[test]
    fn test_registration_requires_registrant() {
        let without = registrar();
        assert!(matches!(
            without.registration_params(&domain()),
            Err(Error::Config(_))
        ));

        let with = registrar().with_registration(2, Some(contact()));
        let params = with.registration_params(&domain()).unwrap();
        let has = |key: &str, value: &str| params.iter().any(|(k, v)| k == key && v == value);
        assert!(has("DomainName", "example.com"));
        assert!(has("Years", "2"));
        assert!(has("AuxBillingCountry", "GB"));
    }

    #[test]
    fn test_api_key_not_exposed_in_debug() {
        let debug_str = format!("{:?}", registrar());
        assert!(!debug_str.contains("secret_key"));
        assert!(debug_str.contains("NamecheapRegistrar"));
    }

    #[test]
    fn test_sandbox_endpoint() {
        assert_eq!(registrar().base_url, NAMECHEAP_SANDBOX_BASE);
        let live = NamecheapRegistrar::new("u", "k", "u", "203.0.113.7", false).unwrap();
        assert_eq!(live.base_url, NAMECHEAP_API_BASE);
    }

    #[test]
    fn test_http_status_mapping() {
        assert!(matches!(map_status(403, "cmd"), Error::Authentication(_)));
        assert!(matches!(map_status(429, "cmd"), Error::RateLimited(_)));
        assert!(matches!(
            map_status(503, "cmd"),
            Error::Provider { message, .. } if message.contains("transient")
        ));
    }

    #[test]
    fn test_factory_validates_config() {
        let factory = NamecheapFactory;
        let config = RegistrarConfig::Namecheap {
            api_user: "user".to_string(),
            api_key: "key".to_string(),
            username: "user".to_string(),
            client_ip: "not-an-ip".to_string(),
            sandbox: true,
            registration_years: 1,
            registrant: None,
        };
        assert!(factory.create(&config).is_err());

        let config = RegistrarConfig::Namecheap {
            api_user: "user".to_string(),
            api_key: "key".to_string(),
            username: "user".to_string(),
            client_ip: "203.0.113.7".to_string(),
            sandbox: true,
            registration_years: 1,
            registrant: Some(contact()),
        };
        assert_eq!(factory.create(&config).unwrap().provider_name(), "namecheap");
    }
}

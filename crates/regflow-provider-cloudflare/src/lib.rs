// # Cloudflare DNS Provider
//
// This crate provides the Cloudflare edge provider for regflow: zone
// lookup and creation, assigned nameservers, baseline records and the
// worker subdomain.
//
// ## Implementation Notes
//
// - ✅ One logical API operation per capability call
// - ✅ Full error propagation to the engine (captured into the report)
// - ✅ HTTP timeout configured (30 seconds)
// - ✅ Specific error handling for HTTP status codes (401, 403, 404, 409, 429, 5xx)
// - ✅ `success: false` envelopes reported with Cloudflare's own messages
// - ✅ Existing records are never overwritten
// - ❌ NO retry logic (a failed call halts the pass; the pass is re-run)
// - ❌ NO backoff or rate limiting
// - ❌ NO caching between calls
// - ❌ NO background tasks
//
// ### Trust Level: Untrusted (DNS Provider)
//
// **Allowed Capabilities**:
// - ✅ Perform HTTP/HTTPS API calls to the Cloudflare API only
// - ✅ Parse provider-specific responses
//
// **Forbidden Capabilities** (enforced by code review):
// - ❌ Spawn tasks or threads
// - ❌ Access the registrar
// - ❌ Decide whether an operation is needed (owned by the reconciler)
//
// ## Security Requirements
//
// - API token NEVER appears in logs
// - API token MUST be provided via environment variables only
// - Provider MUST fail fast if token is empty
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List Zones: GET `/zones?name=...`
// - Create Zone: POST `/zones`
// - Zone Details: GET `/zones/:zone_id`
// - List DNS Records: GET `/zones/:zone_id/dns_records?name=...&type=...`
// - Create DNS Record: POST `/zones/:zone_id/dns_records`

use async_trait::async_trait;
use regflow_core::config::ProviderConfig;
use regflow_core::state::{RecordSpec, worker_subdomain_spec};
use regflow_core::traits::{CreatedZone, DnsProvider, DnsProviderFactory};
use regflow_core::{BaselineRecord, DomainName, Error, Result, ZoneInfo};
use reqwest::Method;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::collections::BTreeSet;
use std::time::Duration;

/// Cloudflare API base URL
const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// TTL value Cloudflare interprets as "automatic"
const AUTOMATIC_TTL: u32 = 1;

/// Cloudflare response envelope
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: Option<i64>,
    message: String,
}

#[derive(Debug, Clone, Deserialize)]
struct Zone {
    id: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    name_servers: Vec<String>,
}

impl Zone {
    fn info(&self) -> ZoneInfo {
        ZoneInfo {
            id: self.id.clone(),
            status: self.status.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct DnsRecord {
    #[serde(rename = "type")]
    record_type: String,
    name: String,
    #[serde(default)]
    content: String,
}

/// Cloudflare DNS provider
///
/// # Trust Level: Untrusted
///
/// This provider is isolated, stateless, and single-shot. Whether an
/// operation is needed at all is decided by the reconciler.
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the API token.
pub struct CloudflareProvider {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// Account that owns newly created zones
    account_id: Option<String>,

    /// API base URL
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("api_token", &"<REDACTED>")
            .field("account_id", &self.account_id)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider
    ///
    /// # Parameters
    ///
    /// - `api_token`: Cloudflare API token with Zone:Edit and DNS:Edit permissions
    /// - `account_id`: Account new zones are created in
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an empty token and an HTTP error if
    /// the client cannot be built.
    pub fn new(api_token: impl Into<String>, account_id: Option<String>) -> Result<Self> {
        let api_token = api_token.into();

        // Validate token is not empty
        if api_token.trim().is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }

        // Build HTTP client with timeout
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_token,
            account_id: account_id.filter(|id| !id.trim().is_empty()),
            base_url: CLOUDFLARE_API_BASE.to_string(),
            client,
        })
    }

    /// Point the provider at a different API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Perform one API request and unwrap its envelope
    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<Value>,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("Cloudflare {} {}", method, path);

        let mut request = self
            .client
            .request(method, &url)
            .bearer_auth(&self.api_token)
            .header("Content-Type", "application/json")
            .query(query);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(|e| {
            Error::provider("cloudflare", format!("HTTP request failed: {}", e))
        })?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response".to_string());

        decode(status, &text, path)
    }

    /// First record named `name`, optionally restricted to `record_type`
    async fn find_record(
        &self,
        zone_id: &str,
        name: &str,
        record_type: Option<&str>,
    ) -> Result<Option<DnsRecord>> {
        let mut query = vec![("name", name)];
        if let Some(record_type) = record_type {
            query.push(("type", record_type));
        }

        let records: Vec<DnsRecord> = self
            .request(
                Method::GET,
                &format!("/zones/{}/dns_records", zone_id),
                &query,
                None,
            )
            .await?;

        Ok(records.into_iter().find(|r| {
            r.name.eq_ignore_ascii_case(name)
                && record_type.is_none_or(|t| r.record_type.eq_ignore_ascii_case(t))
        }))
    }

    /// Create `spec` unless a record with its name and type already exists
    async fn ensure_record(&self, zone_id: &str, spec: &RecordSpec) -> Result<()> {
        if let Some(existing) = self
            .find_record(zone_id, &spec.name, Some(spec.record_type))
            .await?
        {
            tracing::debug!(
                "Keeping existing {} {} -> {}",
                existing.record_type,
                existing.name,
                existing.content
            );
            return Ok(());
        }

        tracing::info!(
            "Creating {} {} -> {} (proxied: {})",
            spec.record_type,
            spec.name,
            spec.content,
            spec.proxied
        );
        let _: Value = self
            .request(
                Method::POST,
                &format!("/zones/{}/dns_records", zone_id),
                &[],
                Some(record_payload(spec)),
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    async fn zone_exists(&self, domain: &DomainName) -> Result<Option<ZoneInfo>> {
        let zones: Vec<Zone> = self
            .request(Method::GET, "/zones", &[("name", domain.as_str())], None)
            .await?;

        let zone = zones.first().map(Zone::info);
        tracing::debug!("Zone lookup for {}: {:?}", domain, zone);
        Ok(zone)
    }

    async fn create_zone(&self, domain: &DomainName) -> Result<CreatedZone> {
        tracing::info!("Creating Cloudflare zone for {}", domain);
        let zone: Zone = self
            .request(
                Method::POST,
                "/zones",
                &[],
                Some(zone_payload(domain, self.account_id.as_deref())),
            )
            .await?;

        Ok(CreatedZone {
            zone: zone.info(),
            name_servers: zone.name_servers,
        })
    }

    async fn get_assigned_nameservers(&self, zone_id: &str) -> Result<Vec<String>> {
        let zone: Zone = self
            .request(Method::GET, &format!("/zones/{}", zone_id), &[], None)
            .await?;
        Ok(zone.name_servers)
    }

    async fn baseline_records_present(
        &self,
        zone_id: &str,
        domain: &DomainName,
    ) -> Result<BTreeSet<BaselineRecord>> {
        let mut present = BTreeSet::new();
        for record in BaselineRecord::ALL {
            let spec = record.spec(domain);
            if let Some(found) = self
                .find_record(zone_id, &spec.name, Some(spec.record_type))
                .await?
                && record.matches(domain, &found.record_type, &found.name)
            {
                present.insert(record);
            }
        }
        Ok(present)
    }

    async fn upsert_baseline_records(
        &self,
        zone_id: &str,
        domain: &DomainName,
        records: &[BaselineRecord],
    ) -> Result<BTreeSet<BaselineRecord>> {
        let mut applied = BTreeSet::new();
        for record in records {
            self.ensure_record(zone_id, &record.spec(domain)).await?;
            applied.insert(*record);
        }
        Ok(applied)
    }

    async fn worker_subdomain_configured(
        &self,
        zone_id: &str,
        domain: &DomainName,
    ) -> Result<bool> {
        let spec = worker_subdomain_spec(domain);
        Ok(self.find_record(zone_id, &spec.name, None).await?.is_some())
    }

    async fn configure_worker_subdomain(&self, zone_id: &str, domain: &DomainName) -> Result<()> {
        let spec = worker_subdomain_spec(domain);
        if self.find_record(zone_id, &spec.name, None).await?.is_some() {
            return Ok(());
        }
        self.ensure_record(zone_id, &spec).await
    }

    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }
}

/// Body for POST `/zones`
fn zone_payload(domain: &DomainName, account_id: Option<&str>) -> Value {
    let mut payload = json!({
        "name": domain.as_str(),
        "type": "full",
    });
    if let Some(account_id) = account_id {
        payload["account"] = json!({ "id": account_id });
    }
    payload
}

/// Body for POST `/zones/:zone_id/dns_records`
fn record_payload(spec: &RecordSpec) -> Value {
    json!({
        "type": spec.record_type,
        "name": spec.name,
        "content": spec.content,
        "ttl": AUTOMATIC_TTL,
        "proxied": spec.proxied,
    })
}

/// Turn a raw response into the envelope's result
fn decode<T: DeserializeOwned>(status: u16, body: &str, path: &str) -> Result<T> {
    if !(200..300).contains(&status) {
        let detail = serde_json::from_str::<Envelope<Value>>(body)
            .ok()
            .and_then(|envelope| join_messages(&envelope.errors))
            .unwrap_or_else(|| body.trim().to_string());
        return Err(map_status(status, &detail, path));
    }

    let envelope: Envelope<T> = serde_json::from_str(body).map_err(|e| {
        Error::dns_provider(format!("Failed to parse Cloudflare response from {}: {}", path, e))
    })?;

    if !envelope.success {
        let detail = join_messages(&envelope.errors)
            .unwrap_or_else(|| "Request failed but no error details provided".to_string());
        return Err(Error::provider("cloudflare", detail));
    }

    envelope.result.ok_or_else(|| {
        Error::dns_provider(format!(
            "Invalid Cloudflare response format: {} returned no result",
            path
        ))
    })
}

fn join_messages(errors: &[ApiMessage]) -> Option<String> {
    if errors.is_empty() {
        return None;
    }
    Some(
        errors
            .iter()
            .map(|e| match e.code {
                Some(code) => format!("{} (code {})", e.message, code),
                None => e.message.clone(),
            })
            .collect::<Vec<_>>()
            .join(", "),
    )
}

/// Map HTTP status codes to specific errors
fn map_status(status: u16, detail: &str, path: &str) -> Error {
    match status {
        401 | 403 => Error::auth(format!(
            "Invalid Cloudflare API token or insufficient permissions. Status: {} - {}",
            status, detail
        )),
        404 => Error::not_found(format!("Cloudflare resource not found: {} - {}", path, detail)),
        409 => Error::provider(
            "cloudflare",
            format!("Conflict: {} was modified concurrently - {}", path, detail),
        ),
        429 => Error::rate_limited(format!(
            "Cloudflare rate limit exceeded. Please retry later. Status: {}",
            status
        )),
        500..=599 => Error::provider(
            "cloudflare",
            format!("Cloudflare server error (transient): {} - {}", status, detail),
        ),
        _ => Error::provider(
            "cloudflare",
            format!("Request to {} failed: {} - {}", path, status, detail),
        ),
    }
}

/// Factory for creating Cloudflare providers
pub struct CloudflareFactory;

impl DnsProviderFactory for CloudflareFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>> {
        match config {
            ProviderConfig::Cloudflare {
                api_token,
                account_id,
            } => {
                if api_token.is_empty() {
                    return Err(Error::config("Cloudflare API token is required"));
                }

                Ok(Box::new(CloudflareProvider::new(
                    api_token.clone(),
                    account_id.clone(),
                )?))
            }
            _ => Err(Error::config("Invalid config for Cloudflare provider")),
        }
    }
}

/// Register the Cloudflare provider with a registry
///
/// # Example
///
/// ```rust
/// use regflow_core::ProviderRegistry;
///
/// let registry = ProviderRegistry::new();
/// regflow_provider_cloudflare::register(&registry);
/// assert!(registry.has_dns_provider("cloudflare"));
/// ```
pub fn register(registry: &regflow_core::ProviderRegistry) {
    registry.register_dns_provider("cloudflare", Box::new(CloudflareFactory));
}

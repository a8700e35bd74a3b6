// # Route 53 Domains Gateway
//
// RegistrarGateway implementation backed by the Amazon Route 53 Domains API.
//
// ## Behavior
//
// - One signed HTTP request per gateway call (list calls follow pagination)
// - HTTP timeout of 30 seconds
// - Status codes and `__type` error codes mapped to gateway errors
// - Dry-run mode: reads go through, mutations are logged and skipped
// - No retry or backoff; the caller decides what a failure means
//
// ## Security
//
// - The secret key and session token never appear in logs or Debug output
// - Transfer auth codes are redacted from dry-run payload logs
//
// ## API Reference
//
// - JSON 1.1 protocol: `POST /` with `X-Amz-Target: Route53Domains_v20140515.<Operation>`
// - Endpoint: `https://route53domains.us-east-1.amazonaws.com/`
// - Signature Version 4, service name `route53domains`

pub mod sigv4;
mod wire;

use std::time::Duration;

use async_trait::async_trait;
use domreg_core::config::GatewayConfig;
use domreg_core::model::{
    Availability, Contact, ContactDetail, DomainDetail, DomainSummary, Nameserver,
    OperationDetail, OperationFilter, OperationSummary, RegisterDomainRequest,
    TransferDomainRequest, Transferability,
};
use domreg_core::registry::GatewayRegistry;
use domreg_core::traits::{GatewayFactory, RegistrarGateway};
use domreg_core::{Error, Result};
use reqwest::Url;
use serde::Serialize;
use serde::de::DeserializeOwned;

pub use sigv4::Credentials;

const GATEWAY_NAME: &str = "route53";

/// Prefix of every `X-Amz-Target` header value
const TARGET_PREFIX: &str = "Route53Domains_v20140515";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Operation id reported for mutations skipped in dry-run mode
pub const DRY_RUN_OPERATION_ID: &str = "dry-run";

/// Route 53 Domains gateway
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the gateway will:
/// - Perform all read calls (listings, detail, eligibility checks)
/// - Log the payload of each mutation
/// - **NOT** send any mutation
///
/// # Security
///
/// The Debug implementation does NOT expose credentials.
pub struct Route53Gateway {
    credentials: Credentials,
    region: String,
    endpoint: Url,
    /// `Host` header value the signature covers
    host: String,
    client: reqwest::Client,
    dry_run: bool,
}

impl std::fmt::Debug for Route53Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route53Gateway")
            .field("credentials", &self.credentials)
            .field("region", &self.region)
            .field("endpoint", &self.endpoint.as_str())
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl Route53Gateway {
    /// Create a new gateway
    ///
    /// # Parameters
    ///
    /// - `credentials`: AWS credentials allowed to call `route53domains:*`
    /// - `region`: Signing region (the API is only served from us-east-1)
    /// - `endpoint`: Endpoint override; defaults to the regional endpoint
    /// - `dry_run`: Skip mutations, logging them instead
    ///
    /// # Errors
    ///
    /// `Error::Fatal` when credentials are missing, the endpoint cannot be
    /// parsed, or the HTTP client cannot be built.
    pub fn new(
        credentials: Credentials,
        region: impl Into<String>,
        endpoint: Option<&str>,
        dry_run: bool,
    ) -> Result<Self> {
        if credentials.is_empty() {
            return Err(Error::fatal("AWS credentials are required for Route 53"));
        }

        let region = region.into();
        if region.is_empty() {
            return Err(Error::fatal("Route 53 region cannot be empty"));
        }

        let endpoint = match endpoint {
            Some(endpoint) => endpoint.to_string(),
            None => format!("https://route53domains.{}.amazonaws.com/", region),
        };
        let endpoint = Url::parse(&endpoint)
            .map_err(|e| Error::fatal(format!("Invalid Route 53 endpoint {}: {}", endpoint, e)))?;

        let host = match (endpoint.host_str(), endpoint.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => {
                return Err(Error::fatal(format!(
                    "Route 53 endpoint has no host: {}",
                    endpoint
                )));
            }
        };

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::fatal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            credentials,
            region,
            endpoint,
            host,
            client,
            dry_run,
        })
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Send one signed API call and decode its response
    async fn call<Req, Resp>(&self, operation: &str, request: &Req) -> Result<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let body = serde_json::to_vec(request)?;
        let target = format!("{}.{}", TARGET_PREFIX, operation);

        let signed = sigv4::sign(
            &self.credentials,
            &sigv4::SigningInput {
                region: &self.region,
                host: &self.host,
                target: &target,
                body: &body,
            },
            chrono::Utc::now(),
        )?;

        tracing::debug!("Calling Route 53 Domains {}", operation);

        let mut builder = self
            .client
            .post(self.endpoint.clone())
            .header(reqwest::header::CONTENT_TYPE, sigv4::CONTENT_TYPE)
            .header("x-amz-target", &target);
        for (name, value) in signed {
            builder = builder.header(name, value);
        }

        let response = builder.body(body).send().await.map_err(|e| {
            Error::gateway(
                GATEWAY_NAME,
                format!("{}: HTTP request failed: {}", operation, e),
            )
        })?;

        let status = response.status();
        let body = response.text().await;

        if !status.is_success() {
            let text = body.unwrap_or_else(|_| "Unable to read response body".to_string());
            return Err(map_error(operation, status.as_u16(), &text));
        }

        let text = body.map_err(|e| {
            Error::gateway(
                GATEWAY_NAME,
                format!("{}: failed to read response body: {}", operation, e),
            )
        })?;

        let text = if text.trim().is_empty() { "{}" } else { text.as_str() };
        serde_json::from_str(text).map_err(|e| {
            Error::gateway(
                GATEWAY_NAME,
                format!("{}: failed to parse response: {}", operation, e),
            )
        })
    }

    /// Send a mutation, or log it in dry-run mode
    async fn mutate<Req>(&self, operation: &str, request: &Req) -> Result<String>
    where
        Req: Serialize + ?Sized,
    {
        if self.dry_run {
            let mut payload = serde_json::to_value(request)?;
            if let Some(code) = payload.get_mut("AuthCode") {
                *code = serde_json::Value::from("<REDACTED>");
            }
            tracing::info!("[DRY-RUN] Would call {} with payload: {}", operation, payload);
            return Ok(DRY_RUN_OPERATION_ID.to_string());
        }

        let response: wire::OperationIdResponse = self.call(operation, request).await?;
        tracing::info!(
            "{} submitted as operation {}",
            operation,
            response.operation_id
        );
        Ok(response.operation_id)
    }

    /// Mutation without an operation id in its response
    async fn mutate_unit<Req>(&self, operation: &str, request: &Req) -> Result<()>
    where
        Req: Serialize + ?Sized,
    {
        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would call {} with payload: {}",
                operation,
                serde_json::to_value(request)?
            );
            return Ok(());
        }

        let _: wire::Empty = self.call(operation, request).await?;
        Ok(())
    }
}

/// Map an unsuccessful response to a gateway error
fn map_error(operation: &str, status: u16, body: &str) -> Error {
    let parsed = wire::ErrorBody::parse(body);
    let code = parsed.code().unwrap_or("Unknown");
    let message = parsed.message.as_deref().unwrap_or(body);

    let detail = match (status, code) {
        (401 | 403, _) => format!(
            "Authentication failed: invalid credentials or insufficient permissions. Status: {} ({})",
            status, code
        ),
        (429, _) | (_, "ThrottlingException") | (_, "OperationLimitExceeded") => format!(
            "Rate limit exceeded. Please retry later. Status: {} ({})",
            status, code
        ),
        (500..=599, _) => format!(
            "Route 53 Domains server error (transient): {} - {}",
            status, message
        ),
        _ => format!("{} rejected: {} ({}) - {}", operation, status, code, message),
    };

    Error::gateway(GATEWAY_NAME, format!("{}: {}", operation, detail))
}

#[async_trait]
impl RegistrarGateway for Route53Gateway {
    async fn list_domains(&self) -> Result<Vec<DomainSummary>> {
        let mut domains = Vec::new();
        let mut marker = None;

        loop {
            let page: wire::ListDomainsResponse = self
                .call(
                    "ListDomains",
                    &wire::ListDomainsRequest {
                        marker: marker.take(),
                        max_items: wire::PAGE_SIZE,
                    },
                )
                .await?;
            domains.extend(page.domains);

            match page.next_page_marker {
                Some(next) if !next.is_empty() => marker = Some(next),
                _ => break,
            }
        }

        Ok(domains)
    }

    async fn list_operations(&self, filter: &OperationFilter) -> Result<Vec<OperationSummary>> {
        let mut operations = Vec::new();
        let mut marker = None;

        loop {
            let page: wire::ListOperationsResponse = self
                .call(
                    "ListOperations",
                    &wire::ListOperationsRequest {
                        submitted_since: filter.submitted_since.map(|t| t.timestamp()),
                        marker: marker.take(),
                        max_items: wire::PAGE_SIZE,
                        status: filter.statuses.clone(),
                        operation_type: filter.types.clone(),
                    },
                )
                .await?;
            operations.extend(page.operations);

            match page.next_page_marker {
                Some(next) if !next.is_empty() => marker = Some(next),
                _ => break,
            }
        }

        Ok(operations)
    }

    async fn get_domain_detail(&self, domain_name: &str) -> Result<DomainDetail> {
        self.call("GetDomainDetail", &wire::DomainNameRequest { domain_name })
            .await
    }

    async fn get_operation_detail(&self, operation_id: &str) -> Result<OperationDetail> {
        self.call("GetOperationDetail", &wire::OperationIdRequest { operation_id })
            .await
    }

    async fn check_domain_availability(&self, domain_name: &str) -> Result<Availability> {
        let response: wire::CheckDomainAvailabilityResponse = self
            .call(
                "CheckDomainAvailability",
                &wire::DomainNameRequest { domain_name },
            )
            .await?;
        tracing::debug!("{} availability: {:?}", domain_name, response.availability);
        Ok(response.availability)
    }

    async fn register_domain(&self, request: &RegisterDomainRequest) -> Result<String> {
        tracing::info!(
            "Registering {} for {} year(s) [mode: {}]",
            request.domain_name,
            request.duration_in_years,
            if self.dry_run { "DRY-RUN" } else { "LIVE" }
        );
        self.mutate("RegisterDomain", request).await
    }

    async fn check_domain_transferability(
        &self,
        domain_name: &str,
        auth_code: &str,
    ) -> Result<Transferability> {
        let response: wire::CheckDomainTransferabilityResponse = self
            .call(
                "CheckDomainTransferability",
                &wire::CheckDomainTransferabilityRequest {
                    domain_name,
                    auth_code,
                },
            )
            .await?;
        let transferable = response.transferability.transferable;
        tracing::debug!("{} transferability: {:?}", domain_name, transferable);
        Ok(transferable)
    }

    async fn transfer_domain(&self, request: &TransferDomainRequest) -> Result<String> {
        tracing::info!(
            "Transferring {} in [mode: {}]",
            request.domain_name,
            if self.dry_run { "DRY-RUN" } else { "LIVE" }
        );
        self.mutate("TransferDomain", request).await
    }

    async fn update_domain_nameservers(
        &self,
        domain_name: &str,
        name_servers: &[String],
    ) -> Result<String> {
        self.mutate(
            "UpdateDomainNameservers",
            &wire::UpdateDomainNameserversRequest {
                domain_name,
                nameservers: name_servers
                    .iter()
                    .map(|ns| Nameserver::new(ns.clone()))
                    .collect(),
            },
        )
        .await
    }

    async fn update_domain_contact(&self, domain_name: &str, contact: &Contact) -> Result<String> {
        let detail = ContactDetail::from(contact);
        self.mutate(
            "UpdateDomainContact",
            &wire::UpdateDomainContactRequest {
                domain_name,
                admin_contact: &detail,
                registrant_contact: &detail,
                tech_contact: &detail,
            },
        )
        .await
    }

    async fn enable_domain_auto_renew(&self, domain_name: &str) -> Result<()> {
        self.mutate_unit(
            "EnableDomainAutoRenew",
            &wire::DomainNameRequest { domain_name },
        )
        .await
    }

    async fn disable_domain_auto_renew(&self, domain_name: &str) -> Result<()> {
        self.mutate_unit(
            "DisableDomainAutoRenew",
            &wire::DomainNameRequest { domain_name },
        )
        .await
    }

    fn gateway_name(&self) -> &'static str {
        GATEWAY_NAME
    }
}

/// Factory for creating Route 53 gateways
pub struct Route53Factory;

impl GatewayFactory for Route53Factory {
    fn create(&self, config: &GatewayConfig) -> Result<Box<dyn RegistrarGateway>> {
        match config {
            GatewayConfig::Route53 {
                region,
                access_key_id,
                secret_access_key,
                session_token,
                endpoint,
                dry_run,
            } => {
                if *dry_run {
                    tracing::warn!(
                        "Route 53 gateway running in DRY-RUN mode - no changes will be made"
                    );
                }

                Ok(Box::new(Route53Gateway::new(
                    Credentials::new(
                        access_key_id.clone(),
                        secret_access_key.clone(),
                        session_token.clone(),
                    ),
                    region.clone(),
                    endpoint.as_deref(),
                    *dry_run,
                )?))
            }
            other => Err(Error::fatal(format!(
                "Invalid config for Route 53 gateway: {}",
                other.type_name()
            ))),
        }
    }
}

/// Register the Route 53 gateway with a registry
///
/// # Example
///
/// ```rust
/// use domreg_core::GatewayRegistry;
///
/// let registry = GatewayRegistry::with_builtin();
/// domreg_gateway_route53::register(&registry);
/// assert!(registry.has_gateway("route53"));
/// ```
pub fn register(registry: &GatewayRegistry) {
    registry.register_gateway(GATEWAY_NAME, Box::new(Route53Factory));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> Credentials {
        Credentials::new("AKIDEXAMPLE", "secret-key-12345", None)
    }

    fn config(access_key_id: &str, dry_run: bool) -> GatewayConfig {
        GatewayConfig::Route53 {
            region: "us-east-1".to_string(),
            access_key_id: access_key_id.to_string(),
            secret_access_key: "secret-key-12345".to_string(),
            session_token: None,
            endpoint: None,
            dry_run,
        }
    }

    #[test]
    fn test_factory_creation() {
        let gateway = Route53Factory.create(&config("AKIDEXAMPLE", false)).unwrap();
        assert_eq!(gateway.gateway_name(), "route53");
    }

    #[test]
    fn test_factory_missing_credentials_is_fatal() {
        let err = Route53Factory.create(&config("", false)).err().unwrap();
        assert!(matches!(err, Error::Fatal(_)));
    }

    #[test]
    fn test_factory_rejects_other_config() {
        let err = Route53Factory.create(&GatewayConfig::Memory).err().unwrap();
        assert!(matches!(err, Error::Fatal(_)));
    }

    #[test]
    fn test_default_endpoint() {
        let gateway = Route53Gateway::new(credentials(), "us-east-1", None, false).unwrap();
        assert_eq!(
            gateway.endpoint.as_str(),
            "https://route53domains.us-east-1.amazonaws.com/"
        );
        assert_eq!(gateway.host, "route53domains.us-east-1.amazonaws.com");
    }

    #[test]
    fn test_endpoint_override_keeps_port_in_host() {
        let gateway = Route53Gateway::new(
            credentials(),
            "us-east-1",
            Some("http://127.0.0.1:4566/"),
            false,
        )
        .unwrap();
        assert_eq!(gateway.host, "127.0.0.1:4566");
    }

    #[test]
    fn test_invalid_endpoint_is_fatal() {
        let err = Route53Gateway::new(credentials(), "us-east-1", Some("not a url"), false)
            .unwrap_err();
        assert!(matches!(err, Error::Fatal(_)));
    }

    #[test]
    fn test_dry_run_flag() {
        let dry = Route53Gateway::new(credentials(), "us-east-1", None, true).unwrap();
        let live = Route53Gateway::new(credentials(), "us-east-1", None, false).unwrap();
        assert!(dry.is_dry_run());
        assert!(!live.is_dry_run());
    }

    #[test]
    fn test_credentials_not_exposed_in_debug() {
        let gateway = Route53Gateway::new(credentials(), "us-east-1", None, false).unwrap();
        let debug = format!("{:?}", gateway);
        assert!(debug.contains("Route53Gateway"));
        assert!(!debug.contains("secret-key-12345"));
    }

    #[test]
    fn test_error_mapping() {
        let auth = map_error("ListDomains", 403, r#"{"__type":"AccessDeniedException"}"#);
        assert!(auth.to_string().contains("Authentication failed"));

        let throttled = map_error(
            "RegisterDomain",
            400,
            r#"{"__type":"OperationLimitExceeded","message":"too many"}"#,
        );
        assert!(throttled.to_string().contains("Rate limit exceeded"));

        let transient = map_error("ListDomains", 503, "Service Unavailable");
        assert!(transient.to_string().contains("transient"));

        let rejected = map_error(
            "RegisterDomain",
            400,
            r#"{"__type":"com.amazonaws.route53domains#InvalidInput","message":"bad zip"}"#,
        );
        let text = rejected.to_string();
        assert!(text.contains("InvalidInput"));
        assert!(text.contains("bad zip"));
        assert!(rejected.is_gateway());
    }
}

// # Registrar Gateway Trait
//
// Defines the capability set the reconciler needs from a domain registrar.
//
// ## Implementations
//
// - Route 53 Domains: `domreg-gateway-route53` crate
// - In-memory fake: [`crate::gateway::MemoryRegistrar`]
//
// ## Usage
//
// ```rust,ignore
// use domreg_core::RegistrarGateway;
//
// async fn is_free(gateway: &dyn RegistrarGateway) -> domreg_core::Result<bool> {
//     let availability = gateway.check_domain_availability("example.com").await?;
//     Ok(availability == domreg_core::model::Availability::Available)
// }
// ```

use async_trait::async_trait;

use crate::config::GatewayConfig;
use crate::model::{
    Availability, Contact, DomainDetail, DomainSummary, OperationDetail, OperationFilter,
    OperationSummary, RegisterDomainRequest, TransferDomainRequest, Transferability,
};

/// Trait for registrar gateway implementations
///
/// Every method is a single pass-through to the registrar's API. Listing
/// methods return the complete result set, following pagination internally.
///
/// # Responsibilities
///
/// Gateways are thin and stateless:
/// - They perform the remote call and translate the response
/// - They never decide whether a call is needed (owned by the reconciler)
/// - They never retry; any failure is returned as [`crate::Error::Gateway`]
/// - They never cache registrar state between calls
#[async_trait]
pub trait RegistrarGateway: Send + Sync {
    /// List every domain registered in the account
    async fn list_domains(&self) -> Result<Vec<DomainSummary>, crate::Error>;

    /// List operations, narrowed by `filter`
    ///
    /// Gateways may ignore parts of the filter the registrar cannot apply
    /// server side; callers re-check matches.
    async fn list_operations(
        &self,
        filter: &OperationFilter,
    ) -> Result<Vec<OperationSummary>, crate::Error>;

    /// Fetch the full detail of a registered domain
    async fn get_domain_detail(&self, domain_name: &str) -> Result<DomainDetail, crate::Error>;

    /// Fetch the full detail of an operation
    async fn get_operation_detail(
        &self,
        operation_id: &str,
    ) -> Result<OperationDetail, crate::Error>;

    /// Ask whether a domain can be registered
    async fn check_domain_availability(
        &self,
        domain_name: &str,
    ) -> Result<Availability, crate::Error>;

    /// Register a domain, returning the registrar's operation id
    async fn register_domain(
        &self,
        request: &RegisterDomainRequest,
    ) -> Result<String, crate::Error>;

    /// Ask whether a domain can be transferred in with `auth_code`
    async fn check_domain_transferability(
        &self,
        domain_name: &str,
        auth_code: &str,
    ) -> Result<Transferability, crate::Error>;

    /// Start an inbound transfer, returning the registrar's operation id
    async fn transfer_domain(
        &self,
        request: &TransferDomainRequest,
    ) -> Result<String, crate::Error>;

    /// Replace the domain's nameservers, returning the operation id
    async fn update_domain_nameservers(
        &self,
        domain_name: &str,
        name_servers: &[String],
    ) -> Result<String, crate::Error>;

    /// Set the admin, registrant and tech contacts to `contact`, returning the operation id
    async fn update_domain_contact(
        &self,
        domain_name: &str,
        contact: &Contact,
    ) -> Result<String, crate::Error>;

    /// Turn automatic renewal on
    async fn enable_domain_auto_renew(&self, domain_name: &str) -> Result<(), crate::Error>;

    /// Turn automatic renewal off
    async fn disable_domain_auto_renew(&self, domain_name: &str) -> Result<(), crate::Error>;

    /// Gateway name for logging (e.g., "route53", "memory")
    fn gateway_name(&self) -> &'static str;
}

/// Helper trait for constructing gateways from configuration
pub trait GatewayFactory: Send + Sync {
    /// Create a gateway from configuration
    ///
    /// Failures are [`crate::Error::Fatal`]: a gateway that cannot be built
    /// aborts every later invocation rather than being retried per call.
    fn create(&self, config: &GatewayConfig) -> Result<Box<dyn RegistrarGateway>, crate::Error>;
}

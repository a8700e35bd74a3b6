// # Memory Registrar
//
// In-memory implementation of RegistrarGateway.
//
// ## Purpose
//
// Behaves like a registrar account held in a HashMap: registrations create
// domain records, transfers create in-progress operations, updates mutate the
// stored detail. Every call is journaled so callers can assert exactly which
// requests were issued.
//
// ## When to Use
//
// - Tests of the reconciler and lifecycle handling
// - Local dry evaluation of lifecycle events (`DOMREG_GATEWAY_TYPE=memory`)
//
// Nothing survives a restart.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::Error;
use crate::config::GatewayConfig;
use crate::model::{
    Availability, Contact, ContactDetail, DomainDetail, DomainSummary, Nameserver,
    OperationDetail, OperationFilter, OperationStatus, OperationSummary, RegisterDomainRequest,
    TRANSFER_IN_DOMAIN, TransferDomainRequest, Transferability,
};
use crate::traits::{GatewayFactory, RegistrarGateway};

const GATEWAY_NAME: &str = "memory";

/// A call the memory registrar received
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    ListDomains,
    ListOperations,
    GetDomainDetail(String),
    GetOperationDetail(String),
    CheckDomainAvailability(String),
    RegisterDomain(RegisterDomainRequest),
    CheckDomainTransferability(String),
    TransferDomain(TransferDomainRequest),
    UpdateDomainNameservers {
        domain_name: String,
        name_servers: Vec<String>,
    },
    UpdateDomainContact {
        domain_name: String,
        contact: Contact,
    },
    EnableDomainAutoRenew(String),
    DisableDomainAutoRenew(String),
}

impl GatewayCall {
    /// Method name on [`RegistrarGateway`]
    pub fn method(&self) -> &'static str {
        match self {
            GatewayCall::ListDomains => "list_domains",
            GatewayCall::ListOperations => "list_operations",
            GatewayCall::GetDomainDetail(_) => "get_domain_detail",
            GatewayCall::GetOperationDetail(_) => "get_operation_detail",
            GatewayCall::CheckDomainAvailability(_) => "check_domain_availability",
            GatewayCall::RegisterDomain(_) => "register_domain",
            GatewayCall::CheckDomainTransferability(_) => "check_domain_transferability",
            GatewayCall::TransferDomain(_) => "transfer_domain",
            GatewayCall::UpdateDomainNameservers { .. } => "update_domain_nameservers",
            GatewayCall::UpdateDomainContact { .. } => "update_domain_contact",
            GatewayCall::EnableDomainAutoRenew(_) => "enable_domain_auto_renew",
            GatewayCall::DisableDomainAutoRenew(_) => "disable_domain_auto_renew",
        }
    }

    /// Whether the call changes registrar state
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            GatewayCall::RegisterDomain(_)
                | GatewayCall::TransferDomain(_)
                | GatewayCall::UpdateDomainNameservers { .. }
                | GatewayCall::UpdateDomainContact { .. }
                | GatewayCall::EnableDomainAutoRenew(_)
                | GatewayCall::DisableDomainAutoRenew(_)
        )
    }
}

#[derive(Debug, Default)]
struct RegistrarState {
    domains: BTreeMap<String, DomainDetail>,
    operations: Vec<OperationDetail>,
    availability: HashMap<String, Availability>,
    transferability: HashMap<String, Transferability>,
    failing_methods: HashSet<String>,
    calls: Vec<GatewayCall>,
    next_operation: u64,
}

impl RegistrarState {
    fn record(&mut self, call: GatewayCall) -> Result<(), Error> {
        let method = call.method();
        self.calls.push(call);
        if self.failing_methods.contains(method) {
            return Err(Error::gateway(
                GATEWAY_NAME,
                format!("{} failed (injected)", method),
            ));
        }
        Ok(())
    }

    fn push_operation(
        &mut self,
        domain_name: &str,
        operation_type: &str,
        status: OperationStatus,
    ) -> String {
        self.next_operation += 1;
        let operation_id = format!("op-{:04}", self.next_operation);
        self.operations.push(OperationDetail {
            operation_id: operation_id.clone(),
            status,
            operation_type: operation_type.to_string(),
            domain_name: Some(domain_name.to_string()),
            message: None,
            submitted_date: Some(chrono::Utc::now().timestamp() as f64),
            last_updated_date: None,
        });
        operation_id
    }

    fn domain_mut(&mut self, domain_name: &str) -> Result<&mut DomainDetail, Error> {
        self.domains.get_mut(domain_name).ok_or_else(|| {
            Error::gateway(
                GATEWAY_NAME,
                format!("Domain {} not found in account", domain_name),
            )
        })
    }
}

/// In-memory registrar implementation
///
/// Clones share the same account, so a test can hand one clone to the
/// reconciler and keep another for assertions.
///
/// # Example
///
/// ```rust,no_run
/// use domreg_core::gateway::MemoryRegistrar;
/// use domreg_core::model::{Availability, DomainDetail};
///
/// #[tokio::main]
/// async fn main() {
///     let registrar = MemoryRegistrar::new();
///     registrar.set_availability("taken.com", Availability::Unavailable).await;
///     registrar
///         .insert_domain(DomainDetail {
///             domain_name: "mine.com".to_string(),
///             ..Default::default()
///         })
///         .await;
///
///     assert!(registrar.mutation_calls().await.is_empty());
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryRegistrar {
    inner: Arc<RwLock<RegistrarState>>,
}

impl MemoryRegistrar {
    /// Create an empty registrar account
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a registered domain
    pub async fn insert_domain(&self, detail: DomainDetail) {
        let mut guard = self.inner.write().await;
        guard.domains.insert(detail.domain_name.clone(), detail);
    }

    /// Seed an operation
    pub async fn insert_operation(&self, operation: OperationDetail) {
        let mut guard = self.inner.write().await;
        guard.operations.push(operation);
    }

    /// Answer availability checks for `domain_name` with `availability`
    pub async fn set_availability(&self, domain_name: &str, availability: Availability) {
        let mut guard = self.inner.write().await;
        guard
            .availability
            .insert(domain_name.to_string(), availability);
    }

    /// Answer transferability checks for `domain_name` with `transferability`
    pub async fn set_transferability(&self, domain_name: &str, transferability: Transferability) {
        let mut guard = self.inner.write().await;
        guard
            .transferability
            .insert(domain_name.to_string(), transferability);
    }

    /// Make every later call to `method` fail with a gateway error
    pub async fn fail_method(&self, method: &str) {
        let mut guard = self.inner.write().await;
        guard.failing_methods.insert(method.to_string());
    }

    /// Current detail of a domain, if registered
    pub async fn domain(&self, domain_name: &str) -> Option<DomainDetail> {
        let guard = self.inner.read().await;
        guard.domains.get(domain_name).cloned()
    }

    /// All operations, oldest first
    pub async fn operations(&self) -> Vec<OperationDetail> {
        let guard = self.inner.read().await;
        guard.operations.clone()
    }

    /// Every call received, in order
    pub async fn calls(&self) -> Vec<GatewayCall> {
        let guard = self.inner.read().await;
        guard.calls.clone()
    }

    /// Only the calls that change registrar state
    pub async fn mutation_calls(&self) -> Vec<GatewayCall> {
        let guard = self.inner.read().await;
        guard
            .calls
            .iter()
            .filter(|call| call.is_mutation())
            .cloned()
            .collect()
    }
}

#[async_trait]
impl RegistrarGateway for MemoryRegistrar {
    async fn list_domains(&self) -> Result<Vec<DomainSummary>, Error> {
        let mut guard = self.inner.write().await;
        guard.record(GatewayCall::ListDomains)?;
        Ok(guard
            .domains
            .values()
            .map(|detail| DomainSummary {
                auto_renew: detail.auto_renew,
                ..DomainSummary::new(detail.domain_name.clone())
            })
            .collect())
    }

    async fn list_operations(
        &self,
        filter: &OperationFilter,
    ) -> Result<Vec<OperationSummary>, Error> {
        let mut guard = self.inner.write().await;
        guard.record(GatewayCall::ListOperations)?;
        Ok(guard
            .operations
            .iter()
            .map(OperationSummary::from)
            .filter(|op| filter.matches(op))
            .collect())
    }

    async fn get_domain_detail(&self, domain_name: &str) -> Result<DomainDetail, Error> {
        let mut guard = self.inner.write().await;
        guard.record(GatewayCall::GetDomainDetail(domain_name.to_string()))?;
        guard.domain_mut(domain_name).map(|detail| detail.clone())
    }

    async fn get_operation_detail(&self, operation_id: &str) -> Result<OperationDetail, Error> {
        let mut guard = self.inner.write().await;
        guard.record(GatewayCall::GetOperationDetail(operation_id.to_string()))?;
        guard
            .operations
            .iter()
            .find(|op| op.operation_id == operation_id)
            .cloned()
            .ok_or_else(|| {
                Error::gateway(
                    GATEWAY_NAME,
                    format!("Operation {} not found", operation_id),
                )
            })
    }

    async fn check_domain_availability(&self, domain_name: &str) -> Result<Availability, Error> {
        let mut guard = self.inner.write().await;
        guard.record(GatewayCall::CheckDomainAvailability(domain_name.to_string()))?;
        if guard.domains.contains_key(domain_name) {
            return Ok(Availability::Unavailable);
        }
        Ok(guard
            .availability
            .get(domain_name)
            .copied()
            .unwrap_or(Availability::Available))
    }

    async fn register_domain(&self, request: &RegisterDomainRequest) -> Result<String, Error> {
        let mut guard = self.inner.write().await;
        guard.record(GatewayCall::RegisterDomain(request.clone()))?;

        if guard.domains.contains_key(&request.domain_name) {
            return Err(Error::gateway(
                GATEWAY_NAME,
                format!("Domain {} is already registered", request.domain_name),
            ));
        }

        guard.domains.insert(
            request.domain_name.clone(),
            DomainDetail {
                domain_name: request.domain_name.clone(),
                nameservers: Vec::new(),
                auto_renew: Some(request.auto_renew),
                admin_contact: Some(request.admin_contact.clone()),
                registrant_contact: Some(request.registrant_contact.clone()),
                tech_contact: Some(request.tech_contact.clone()),
                status_list: Vec::new(),
            },
        );

        Ok(guard.push_operation(
            &request.domain_name,
            "REGISTER_DOMAIN",
            OperationStatus::Successful,
        ))
    }

    async fn check_domain_transferability(
        &self,
        domain_name: &str,
        _auth_code: &str,
    ) -> Result<Transferability, Error> {
        let mut guard = self.inner.write().await;
        guard.record(GatewayCall::CheckDomainTransferability(
            domain_name.to_string(),
        ))?;
        if guard.domains.contains_key(domain_name) {
            return Ok(Transferability::DomainInOwnAccount);
        }
        Ok(guard
            .transferability
            .get(domain_name)
            .copied()
            .unwrap_or(Transferability::DontKnow))
    }

    async fn transfer_domain(&self, request: &TransferDomainRequest) -> Result<String, Error> {
        let mut guard = self.inner.write().await;
        guard.record(GatewayCall::TransferDomain(request.clone()))?;
        // The domain appears in the account only once the transfer completes
        Ok(guard.push_operation(
            &request.domain_name,
            TRANSFER_IN_DOMAIN,
            OperationStatus::InProgress,
        ))
    }

    async fn update_domain_nameservers(
        &self,
        domain_name: &str,
        name_servers: &[String],
    ) -> Result<String, Error> {
        let mut guard = self.inner.write().await;
        guard.record(GatewayCall::UpdateDomainNameservers {
            domain_name: domain_name.to_string(),
            name_servers: name_servers.to_vec(),
        })?;
        guard.domain_mut(domain_name)?.nameservers =
            name_servers.iter().map(|ns| Nameserver::new(ns.clone())).collect();
        Ok(guard.push_operation(
            domain_name,
            "UPDATE_NAMESERVER",
            OperationStatus::Successful,
        ))
    }

    async fn update_domain_contact(
        &self,
        domain_name: &str,
        contact: &Contact,
    ) -> Result<String, Error> {
        let mut guard = self.inner.write().await;
        guard.record(GatewayCall::UpdateDomainContact {
            domain_name: domain_name.to_string(),
            contact: contact.clone(),
        })?;
        let observed = ContactDetail::from(contact);
        let detail = guard.domain_mut(domain_name)?;
        detail.admin_contact = Some(observed.clone());
        detail.registrant_contact = Some(observed.clone());
        detail.tech_contact = Some(observed);
        Ok(guard.push_operation(
            domain_name,
            "UPDATE_DOMAIN_CONTACT",
            OperationStatus::Successful,
        ))
    }

    async fn enable_domain_auto_renew(&self, domain_name: &str) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.record(GatewayCall::EnableDomainAutoRenew(domain_name.to_string()))?;
        guard.domain_mut(domain_name)?.auto_renew = Some(true);
        Ok(())
    }

    async fn disable_domain_auto_renew(&self, domain_name: &str) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.record(GatewayCall::DisableDomainAutoRenew(domain_name.to_string()))?;
        guard.domain_mut(domain_name)?.auto_renew = Some(false);
        Ok(())
    }

    fn gateway_name(&self) -> &'static str {
        GATEWAY_NAME
    }
}

/// Factory for creating memory registrars
pub struct MemoryRegistrarFactory;

impl GatewayFactory for MemoryRegistrarFactory {
    fn create(&self, config: &GatewayConfig) -> Result<Box<dyn RegistrarGateway>, Error> {
        match config {
            GatewayConfig::Memory => Ok(Box::new(MemoryRegistrar::new())),
            other => Err(Error::fatal(format!(
                "Invalid config for memory gateway: {}",
                other.type_name()
            ))),
        }
    }
}

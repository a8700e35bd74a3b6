//! State observation
//!
//! Derives [`ObservedDomainState`] from a fresh registrar query. Nothing is
//! cached between passes; the registrar is the only source of truth.

use tracing::debug;

use crate::error::Result;
use crate::model::{ObservedDomainState, OperationFilter};
use crate::traits::RegistrarGateway;

/// Observe a domain without resolving in-flight operations
///
/// Makes at most two read calls: the domain listing, then the operation
/// listing when the domain is not registered.
pub async fn observe(
    gateway: &dyn RegistrarGateway,
    domain_name: &str,
) -> Result<ObservedDomainState> {
    observe_with(gateway, domain_name, false).await
}

/// Observe a domain, optionally fetching the detail of an in-flight transfer
pub async fn observe_with(
    gateway: &dyn RegistrarGateway,
    domain_name: &str,
    resolve_transfer_detail: bool,
) -> Result<ObservedDomainState> {
    let domains = gateway.list_domains().await?;

    if domains.iter().any(|d| d.domain_name == domain_name) {
        let detail = gateway.get_domain_detail(domain_name).await?;
        debug!(
            "Domain {} is registered (status: {:?})",
            domain_name, detail.status_list
        );
        return Ok(ObservedDomainState::Registered(Box::new(detail)));
    }

    let operations = gateway
        .list_operations(&OperationFilter::transfers_in_progress())
        .await?;

    // The filter is advisory; match on every field regardless
    let Some(operation) = operations
        .into_iter()
        .find(|op| op.is_transfer_in_progress_for(domain_name))
    else {
        debug!("Domain {} is absent from the registrar", domain_name);
        return Ok(ObservedDomainState::Absent);
    };

    debug!(
        "Domain {} has transfer {} in progress",
        domain_name, operation.operation_id
    );

    let detail = if resolve_transfer_detail {
        Some(gateway.get_operation_detail(&operation.operation_id).await?)
    } else {
        None
    };

    Ok(ObservedDomainState::InProgressTransfer { operation, detail })
}

//! Shared fixtures for domreg-core contract tests

#![allow(dead_code)]

use domreg_core::config::ReconcilerConfig;
use domreg_core::gateway::MemoryRegistrar;
use domreg_core::model::{
    Contact, ContactDetail, ContactType, DesiredDomainState, DomainDetail, Nameserver,
    OperationDetail, OperationStatus, TRANSFER_IN_DOMAIN,
};
use domreg_core::{ReconcileEvent, Reconciler};
use tokio::sync::mpsc;

pub const DOMAIN: &str = "foo.com";

/// The contact used throughout the suite
pub fn contact() -> Contact {
    Contact {
        first_name: "Joe".to_string(),
        last_name: "Bob".to_string(),
        contact_type: Some(ContactType::Person),
        address_line_1: "PO Box 123".to_string(),
        city: "Nowhere".to_string(),
        state: "CA".to_string(),
        country_code: "US".to_string(),
        zip_code: "91222".to_string(),
        phone_number: "+1.3035551212".to_string(),
        email: "joe@bob.com".to_string(),
    }
}

/// Desired state for a fresh registration of [`DOMAIN`]
pub fn desired(auto_renew: bool) -> DesiredDomainState {
    DesiredDomainState::new(DOMAIN, contact(), auto_renew)
}

/// Desired state for a transfer of [`DOMAIN`]
pub fn desired_transfer(auto_renew: bool) -> DesiredDomainState {
    desired(auto_renew).with_transfer_auth_code("secret-auth-code")
}

/// Registered detail that already matches `desired`
pub fn converged_detail(desired: &DesiredDomainState) -> DomainDetail {
    let observed = ContactDetail::from(&desired.contact);
    DomainDetail {
        domain_name: desired.domain_name.clone(),
        nameservers: desired
            .name_servers
            .iter()
            .map(|ns| Nameserver::new(ns.clone()))
            .collect(),
        auto_renew: Some(desired.auto_renew),
        admin_contact: Some(observed.clone()),
        registrant_contact: Some(observed.clone()),
        tech_contact: Some(observed),
        status_list: vec!["clientTransferProhibited".to_string()],
    }
}

/// An operation record for `domain_name`
pub fn operation(
    operation_id: &str,
    domain_name: &str,
    operation_type: &str,
    status: OperationStatus,
) -> OperationDetail {
    OperationDetail {
        operation_id: operation_id.to_string(),
        status,
        operation_type: operation_type.to_string(),
        domain_name: Some(domain_name.to_string()),
        message: Some("Waiting for the losing registrar".to_string()),
        submitted_date: Some(1_700_000_000.0),
        last_updated_date: None,
    }
}

/// An in-progress inbound transfer of `domain_name`
pub fn transfer_in_progress(operation_id: &str, domain_name: &str) -> OperationDetail {
    operation(
        operation_id,
        domain_name,
        TRANSFER_IN_DOMAIN,
        OperationStatus::InProgress,
    )
}

/// Reconciler over a clone of `registrar` with default configuration
pub fn reconciler(registrar: &MemoryRegistrar) -> (Reconciler, mpsc::Receiver<ReconcileEvent>) {
    reconciler_with(registrar, ReconcilerConfig::default())
}

pub fn reconciler_with(
    registrar: &MemoryRegistrar,
    config: ReconcilerConfig,
) -> (Reconciler, mpsc::Receiver<ReconcileEvent>) {
    Reconciler::new(Box::new(registrar.clone()), config).expect("reconciler construction succeeds")
}

/// Everything currently queued on the event channel
pub fn drain(events: &mut mpsc::Receiver<ReconcileEvent>) -> Vec<ReconcileEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

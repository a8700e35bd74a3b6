//! Reconcile decision
//!
//! Turns desired and observed state into an ordered list of corrective
//! [`Action`]s. An empty [`Plan`] is a no-op.
//!
//! ```text
//! Absent ──────────────┬─ no auth code ─ availability ── Register (+ UpdateNameservers)
//!                      └─ auth code ──── transferability ─ TransferIn (nameservers inline)
//! InProgressTransfer ── (nothing)
//! Registered ──────────┬─ PENDING_TRANSFER ─ (nothing)
//!                      └─ UpdateContact? SetAutoRenew? UpdateNameservers?
//! ```

use std::collections::HashSet;
use std::fmt;

use crate::error::Result;
use crate::model::{
    Availability, Contact, ContactDetail, DesiredDomainState, DomainDetail, ObservedDomainState,
    RegisterDomainRequest, TransferDomainRequest, Transferability,
};
use crate::traits::RegistrarGateway;

/// Why a plan ends in failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailReason {
    /// Registrar answered the availability check with something other than `AVAILABLE`
    NotAvailable(Availability),
    /// Registrar answered the transferability check with something other than `TRANSFERABLE`
    NotTransferable(Transferability),
}

impl fmt::Display for FailReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailReason::NotAvailable(a) => write!(f, "domain not available ({:?})", a),
            FailReason::NotTransferable(t) => write!(f, "domain not transferable ({:?})", t),
        }
    }
}

/// A single corrective step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Register(RegisterDomainRequest),
    TransferIn(TransferDomainRequest),
    /// Applies to admin, registrant and tech roles together
    UpdateContact(Contact),
    SetAutoRenew(bool),
    UpdateNameservers(Vec<String>),
    /// Terminal; nothing after it runs
    Fail(FailReason),
}

impl Action {
    /// Payload-free label
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Register(_) => ActionKind::Register,
            Action::TransferIn(_) => ActionKind::TransferIn,
            Action::UpdateContact(_) => ActionKind::UpdateContact,
            Action::SetAutoRenew(_) => ActionKind::SetAutoRenew,
            Action::UpdateNameservers(_) => ActionKind::UpdateNameservers,
            Action::Fail(_) => ActionKind::Fail,
        }
    }
}

/// Label of an [`Action`] for logs and events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Register,
    TransferIn,
    UpdateContact,
    SetAutoRenew,
    UpdateNameservers,
    Fail,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionKind::Register => "register",
            ActionKind::TransferIn => "transfer-in",
            ActionKind::UpdateContact => "update-contact",
            ActionKind::SetAutoRenew => "set-auto-renew",
            ActionKind::UpdateNameservers => "update-nameservers",
            ActionKind::Fail => "fail",
        };
        f.write_str(name)
    }
}

/// Ordered corrective actions for one domain
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    pub actions: Vec<Action>,
}

impl Plan {
    /// The no-op plan
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// An empty plan means the domain is already converged
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn kinds(&self) -> Vec<ActionKind> {
        self.actions.iter().map(Action::kind).collect()
    }

    fn push(&mut self, action: Action) {
        self.actions.push(action);
    }
}

impl IntoIterator for Plan {
    type Item = Action;
    type IntoIter = std::vec::IntoIter<Action>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.into_iter()
    }
}

/// Registrar's answer about an absent domain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Availability(Availability),
    Transferability(Transferability),
}

/// Decide what to do with a domain
///
/// Only an `Absent` observation touches the gateway, for one availability or
/// transferability check. Nothing is mutated here.
pub async fn plan(
    gateway: &dyn RegistrarGateway,
    desired: &DesiredDomainState,
    observed: &ObservedDomainState,
) -> Result<Plan> {
    match observed {
        ObservedDomainState::Absent => {
            let eligibility = match &desired.transfer_auth_code {
                None => Eligibility::Availability(
                    gateway
                        .check_domain_availability(&desired.domain_name)
                        .await?,
                ),
                Some(auth_code) => Eligibility::Transferability(
                    gateway
                        .check_domain_transferability(&desired.domain_name, auth_code)
                        .await?,
                ),
            };
            Ok(plan_absent(desired, eligibility))
        }
        ObservedDomainState::InProgressTransfer { .. } => Ok(Plan::empty()),
        ObservedDomainState::Registered(detail) => Ok(plan_registered(desired, detail)),
    }
}

/// Plan for a domain the registrar has no record of
///
/// An eligibility answer that does not match the desired intent (an
/// availability answer for a transfer, or the reverse) is treated as refusal.
pub fn plan_absent(desired: &DesiredDomainState, eligibility: Eligibility) -> Plan {
    let mut plan = Plan::empty();

    match (&desired.transfer_auth_code, eligibility) {
        (None, Eligibility::Availability(Availability::Available)) => {
            plan.push(Action::Register(RegisterDomainRequest::for_desired(desired)));
            if !desired.name_servers.is_empty() {
                plan.push(Action::UpdateNameservers(desired.name_servers.clone()));
            }
        }
        (None, Eligibility::Availability(other)) => {
            plan.push(Action::Fail(FailReason::NotAvailable(other)));
        }
        (None, Eligibility::Transferability(_)) => {
            plan.push(Action::Fail(FailReason::NotAvailable(Availability::Unknown)));
        }
        (Some(code), Eligibility::Transferability(Transferability::Transferable)) => {
            plan.push(Action::TransferIn(TransferDomainRequest::for_desired(
                desired,
                code.clone(),
            )));
        }
        (Some(_), Eligibility::Transferability(other)) => {
            plan.push(Action::Fail(FailReason::NotTransferable(other)));
        }
        (Some(_), Eligibility::Availability(_)) => {
            plan.push(Action::Fail(FailReason::NotTransferable(
                Transferability::Unknown,
            )));
        }
    }

    plan
}

/// Plan for a registered domain
///
/// Contacts, auto-renew and nameservers are checked independently, so zero to
/// three actions come back. A domain mid-transfer is never touched.
pub fn plan_registered(desired: &DesiredDomainState, detail: &DomainDetail) -> Plan {
    let mut plan = Plan::empty();

    if detail.is_pending_transfer() {
        return plan;
    }

    let contacts_same = [
        &detail.admin_contact,
        &detail.registrant_contact,
        &detail.tech_contact,
    ]
    .into_iter()
    .all(|observed| contacts_equal(observed.as_ref(), &desired.contact));

    if !contacts_same {
        plan.push(Action::UpdateContact(desired.contact.clone()));
    }

    if desired.auto_renew != detail.auto_renew.unwrap_or(false) {
        plan.push(Action::SetAutoRenew(desired.auto_renew));
    }

    if !desired.name_servers.is_empty()
        && !nameservers_equal(&desired.name_servers, &detail.nameserver_names())
    {
        plan.push(Action::UpdateNameservers(desired.name_servers.clone()));
    }

    plan
}

/// Exact equality on all ten contact fields
///
/// A missing observed record, or a missing field within it, never equals the
/// desired value. Contact type compares as optional on both sides.
pub fn contacts_equal(observed: Option<&ContactDetail>, desired: &Contact) -> bool {
    let Some(observed) = observed else {
        return false;
    };

    observed.first_name.as_deref() == Some(desired.first_name.as_str())
        && observed.last_name.as_deref() == Some(desired.last_name.as_str())
        && observed.contact_type == desired.contact_type
        && observed.address_line_1.as_deref() == Some(desired.address_line_1.as_str())
        && observed.city.as_deref() == Some(desired.city.as_str())
        && observed.state.as_deref() == Some(desired.state.as_str())
        && observed.country_code.as_deref() == Some(desired.country_code.as_str())
        && observed.zip_code.as_deref() == Some(desired.zip_code.as_str())
        && observed.phone_number.as_deref() == Some(desired.phone_number.as_str())
        && observed.email.as_deref() == Some(desired.email.as_str())
}

/// Set equality over hostnames, case-sensitive
pub fn nameservers_equal<A, B>(desired: &[A], observed: &[B]) -> bool
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    let desired: HashSet<&str> = desired.iter().map(AsRef::as_ref).collect();
    let observed: HashSet<&str> = observed.iter().map(AsRef::as_ref).collect();
    desired == observed
}

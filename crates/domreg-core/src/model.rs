//! Data model for desired and observed domain state
//!
//! Two serde dialects meet here:
//! - [`Contact`] is the inbound, camelCase shape delivered with lifecycle events
//! - [`ContactDetail`], [`DomainDetail`] and the operation records are the
//!   registrar's PascalCase wire shapes, where every field may be missing

use serde::de::IntoDeserializer;
use serde::{Deserialize, Deserializer, Serialize};

/// Registration length requested for every register/transfer call
pub const REGISTRATION_YEARS: u32 = 1;

/// Operation type the registrar reports for an inbound transfer
pub const TRANSFER_IN_DOMAIN: &str = "TRANSFER_IN_DOMAIN";

/// Status list marker for a domain that is mid-transfer
pub const PENDING_TRANSFER: &str = "PENDING_TRANSFER";

/// Kind of entity a contact describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContactType {
    Person,
    Company,
    Association,
    PublicBody,
    Reseller,
}

/// Desired contact, applied identically to the admin, registrant and tech roles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub first_name: String,
    pub last_name: String,
    #[serde(
        rename = "type",
        default,
        deserialize_with = "deserialize_optional_contact_type",
        skip_serializing_if = "Option::is_none"
    )]
    pub contact_type: Option<ContactType>,
    pub address_line_1: String,
    pub city: String,
    pub state: String,
    pub country_code: String,
    pub zip_code: String,
    pub phone_number: String,
    pub email: String,
}

// Templates blank optional properties with "" rather than omitting them
fn deserialize_optional_contact_type<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<ContactType>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(value) if value.trim().is_empty() => Ok(None),
        Some(value) => {
            let de: serde::de::value::StrDeserializer<'_, D::Error> =
                value.trim().into_deserializer();
            ContactType::deserialize(de).map(Some)
        }
    }
}

/// A contact record as the registrar stores it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ContactDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_type: Option<ContactType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_line_1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_line_2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fax: Option<String>,
}

impl From<&Contact> for ContactDetail {
    fn from(contact: &Contact) -> Self {
        Self {
            first_name: Some(contact.first_name.clone()),
            last_name: Some(contact.last_name.clone()),
            contact_type: contact.contact_type,
            organization_name: None,
            address_line_1: Some(contact.address_line_1.clone()),
            address_line_2: None,
            city: Some(contact.city.clone()),
            state: Some(contact.state.clone()),
            country_code: Some(contact.country_code.clone()),
            zip_code: Some(contact.zip_code.clone()),
            phone_number: Some(contact.phone_number.clone()),
            email: Some(contact.email.clone()),
            fax: None,
        }
    }
}

/// A nameserver entry on a registered domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Nameserver {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub glue_ips: Vec<String>,
}

impl Nameserver {
    /// Nameserver without glue records
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            glue_ips: Vec::new(),
        }
    }
}

/// Full detail of a domain the registrar knows about
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DomainDetail {
    pub domain_name: String,
    pub nameservers: Vec<Nameserver>,
    pub auto_renew: Option<bool>,
    pub admin_contact: Option<ContactDetail>,
    pub registrant_contact: Option<ContactDetail>,
    pub tech_contact: Option<ContactDetail>,
    pub status_list: Vec<String>,
}

impl DomainDetail {
    /// Whether any status entry marks the domain as mid-transfer
    pub fn is_pending_transfer(&self) -> bool {
        self.status_list.iter().any(|s| s.contains(PENDING_TRANSFER))
    }

    /// Observed nameserver hostnames, in registrar order
    pub fn nameserver_names(&self) -> Vec<&str> {
        self.nameservers.iter().map(|ns| ns.name.as_str()).collect()
    }
}

/// One entry of the registrar's domain listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DomainSummary {
    pub domain_name: String,
    #[serde(default)]
    pub auto_renew: Option<bool>,
    #[serde(default)]
    pub transfer_lock: Option<bool>,
    /// Expiry as seconds since the epoch
    #[serde(default)]
    pub expiry: Option<f64>,
}

impl DomainSummary {
    pub fn new(domain_name: impl Into<String>) -> Self {
        Self {
            domain_name: domain_name.into(),
            auto_renew: None,
            transfer_lock: None,
            expiry: None,
        }
    }
}

/// Lifecycle status of a registrar operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationStatus {
    Submitted,
    InProgress,
    Error,
    Successful,
    Failed,
    #[serde(other)]
    Unknown,
}

/// One entry of the registrar's operation listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OperationSummary {
    pub operation_id: String,
    pub status: OperationStatus,
    #[serde(rename = "Type")]
    pub operation_type: String,
    #[serde(default)]
    pub domain_name: Option<String>,
    #[serde(default)]
    pub submitted_date: Option<f64>,
}

impl OperationSummary {
    /// Whether this is an in-progress inbound transfer of `domain_name`
    pub fn is_transfer_in_progress_for(&self, domain_name: &str) -> bool {
        self.status == OperationStatus::InProgress
            && self.operation_type == TRANSFER_IN_DOMAIN
            && self.domain_name.as_deref() == Some(domain_name)
    }
}

/// Full detail of a registrar operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OperationDetail {
    pub operation_id: String,
    pub status: OperationStatus,
    #[serde(rename = "Type")]
    pub operation_type: String,
    #[serde(default)]
    pub domain_name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub submitted_date: Option<f64>,
    #[serde(default)]
    pub last_updated_date: Option<f64>,
}

impl From<&OperationDetail> for OperationSummary {
    fn from(detail: &OperationDetail) -> Self {
        Self {
            operation_id: detail.operation_id.clone(),
            status: detail.status,
            operation_type: detail.operation_type.clone(),
            domain_name: detail.domain_name.clone(),
            submitted_date: detail.submitted_date,
        }
    }
}

/// Filter passed to the operation listing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationFilter {
    pub submitted_since: Option<chrono::DateTime<chrono::Utc>>,
    pub statuses: Vec<OperationStatus>,
    pub types: Vec<String>,
}

impl OperationFilter {
    /// Filter for in-flight inbound transfers
    pub fn transfers_in_progress() -> Self {
        Self {
            submitted_since: None,
            statuses: vec![OperationStatus::InProgress],
            types: vec![TRANSFER_IN_DOMAIN.to_string()],
        }
    }

    /// Whether a listed operation passes this filter
    pub fn matches(&self, operation: &OperationSummary) -> bool {
        (self.statuses.is_empty() || self.statuses.contains(&operation.status))
            && (self.types.is_empty() || self.types.contains(&operation.operation_type))
    }
}

/// Registrar answer to an availability check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Availability {
    Available,
    AvailableReserved,
    AvailablePreorder,
    Unavailable,
    UnavailablePremium,
    UnavailableRestricted,
    Reserved,
    DontKnow,
    InvalidNameForTld,
    Pending,
    #[serde(other)]
    Unknown,
}

/// Registrar answer to a transferability check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Transferability {
    Transferable,
    Untransferable,
    DontKnow,
    DomainInOwnAccount,
    DomainInAnotherAccount,
    PremiumDomain,
    #[serde(other)]
    Unknown,
}

/// Parameters of a fresh registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RegisterDomainRequest {
    pub domain_name: String,
    pub duration_in_years: u32,
    pub auto_renew: bool,
    pub admin_contact: ContactDetail,
    pub registrant_contact: ContactDetail,
    pub tech_contact: ContactDetail,
    pub privacy_protect_admin_contact: bool,
    pub privacy_protect_registrant_contact: bool,
    pub privacy_protect_tech_contact: bool,
}

impl RegisterDomainRequest {
    /// One-year registration with privacy protection on every role
    pub fn for_desired(desired: &DesiredDomainState) -> Self {
        let contact = ContactDetail::from(&desired.contact);
        Self {
            domain_name: desired.domain_name.clone(),
            duration_in_years: REGISTRATION_YEARS,
            auto_renew: desired.auto_renew,
            admin_contact: contact.clone(),
            registrant_contact: contact.clone(),
            tech_contact: contact,
            privacy_protect_admin_contact: true,
            privacy_protect_registrant_contact: true,
            privacy_protect_tech_contact: true,
        }
    }
}

/// Parameters of an inbound transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TransferDomainRequest {
    pub domain_name: String,
    pub auth_code: String,
    pub duration_in_years: u32,
    pub auto_renew: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nameservers: Vec<Nameserver>,
    pub admin_contact: ContactDetail,
    pub registrant_contact: ContactDetail,
    pub tech_contact: ContactDetail,
    pub privacy_protect_admin_contact: bool,
    pub privacy_protect_registrant_contact: bool,
    pub privacy_protect_tech_contact: bool,
}

impl TransferDomainRequest {
    /// Same fixed policy as registration; desired nameservers travel inline
    pub fn for_desired(desired: &DesiredDomainState, auth_code: impl Into<String>) -> Self {
        let contact = ContactDetail::from(&desired.contact);
        Self {
            domain_name: desired.domain_name.clone(),
            auth_code: auth_code.into(),
            duration_in_years: REGISTRATION_YEARS,
            auto_renew: desired.auto_renew,
            nameservers: desired
                .name_servers
                .iter()
                .map(|ns| Nameserver::new(ns.clone()))
                .collect(),
            admin_contact: contact.clone(),
            registrant_contact: contact.clone(),
            tech_contact: contact,
            privacy_protect_admin_contact: true,
            privacy_protect_registrant_contact: true,
            privacy_protect_tech_contact: true,
        }
    }
}

/// The domain as the caller wants it to be
#[derive(Clone, PartialEq, Eq)]
pub struct DesiredDomainState {
    pub domain_name: String,
    pub contact: Contact,
    pub auto_renew: bool,
    /// Empty means nameservers are not managed
    pub name_servers: Vec<String>,
    /// Presence signals transfer-in rather than fresh registration
    pub transfer_auth_code: Option<String>,
}

// The auth code is a credential for the losing registrar
impl std::fmt::Debug for DesiredDomainState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DesiredDomainState")
            .field("domain_name", &self.domain_name)
            .field("contact", &self.contact)
            .field("auto_renew", &self.auto_renew)
            .field("name_servers", &self.name_servers)
            .field(
                "transfer_auth_code",
                &self.transfer_auth_code.as_ref().map(|_| "<REDACTED>"),
            )
            .finish()
    }
}

impl DesiredDomainState {
    pub fn new(domain_name: impl Into<String>, contact: Contact, auto_renew: bool) -> Self {
        Self {
            domain_name: domain_name.into(),
            contact,
            auto_renew,
            name_servers: Vec::new(),
            transfer_auth_code: None,
        }
    }

    pub fn with_name_servers<I, S>(mut self, name_servers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.name_servers = name_servers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_transfer_auth_code(mut self, code: impl Into<String>) -> Self {
        self.transfer_auth_code = Some(code.into());
        self
    }

    /// Check the domain name and nameserver hostnames
    pub fn validate(&self) -> crate::Result<()> {
        validate_domain_name(&self.domain_name)?;
        for ns in &self.name_servers {
            validate_domain_name(ns)?;
        }
        Ok(())
    }
}

/// The registrar's view of a domain at observation time
#[derive(Debug, Clone, PartialEq)]
pub enum ObservedDomainState {
    /// Not registered and no transfer in flight
    Absent,

    /// An inbound transfer is in progress
    InProgressTransfer {
        operation: OperationSummary,
        /// Present when the reconciler is configured to resolve it
        detail: Option<OperationDetail>,
    },

    /// Registered with this registrar
    Registered(Box<DomainDetail>),
}

impl ObservedDomainState {
    /// Short label for logs and events
    pub fn kind(&self) -> &'static str {
        match self {
            ObservedDomainState::Absent => "absent",
            ObservedDomainState::InProgressTransfer { .. } => "transfer-in-progress",
            ObservedDomainState::Registered(_) => "registered",
        }
    }
}

/// Basic DNS name validation per RFC 1035
///
/// Catches common mistakes rather than enforcing every rule.
pub fn validate_domain_name(domain: &str) -> crate::Result<()> {
    use crate::Error;

    if domain.is_empty() {
        return Err(Error::invalid_input("Domain name cannot be empty"));
    }

    if domain.len() > 253 {
        return Err(Error::invalid_input(format!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        )));
    }

    for label in domain.trim_end_matches('.').split('.') {
        if label.is_empty() {
            return Err(Error::invalid_input(format!(
                "Domain name has empty label: '{}'",
                domain
            )));
        }

        if label.len() > 63 {
            return Err(Error::invalid_input(format!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            )));
        }

        if !label.chars().all(|c| c.is_alphanumeric() || c == '-') {
            return Err(Error::invalid_input(format!(
                "Domain label contains invalid characters. Label: '{}'",
                label
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(Error::invalid_input(format!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            )));
        }
    }

    Ok(())
}

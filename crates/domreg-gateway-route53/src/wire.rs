//! Request and response bodies of the Route 53 Domains JSON API
//!
//! Field names follow the API (PascalCase). Register and transfer requests
//! reuse the core model types, which already serialize in this shape.

use domreg_core::model::{
    Availability, ContactDetail, DomainSummary, Nameserver, OperationStatus, OperationSummary,
    Transferability,
};
use serde::{Deserialize, Serialize};

/// Page size requested from list calls
pub const PAGE_SIZE: u32 = 100;

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListDomainsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<String>,
    pub max_items: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ListDomainsResponse {
    pub domains: Vec<DomainSummary>,
    pub next_page_marker: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListOperationsRequest {
    /// Seconds since the epoch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_since: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<String>,
    pub max_items: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub status: Vec<OperationStatus>,
    #[serde(rename = "Type", skip_serializing_if = "Vec::is_empty")]
    pub operation_type: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ListOperationsResponse {
    pub operations: Vec<OperationSummary>,
    pub next_page_marker: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DomainNameRequest<'a> {
    pub domain_name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct OperationIdRequest<'a> {
    pub operation_id: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CheckDomainAvailabilityResponse {
    pub availability: Availability,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CheckDomainTransferabilityRequest<'a> {
    pub domain_name: &'a str,
    pub auth_code: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CheckDomainTransferabilityResponse {
    pub transferability: DomainTransferability,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DomainTransferability {
    pub transferable: Transferability,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateDomainNameserversRequest<'a> {
    pub domain_name: &'a str,
    pub nameservers: Vec<Nameserver>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateDomainContactRequest<'a> {
    pub domain_name: &'a str,
    pub admin_contact: &'a ContactDetail,
    pub registrant_contact: &'a ContactDetail,
    pub tech_contact: &'a ContactDetail,
}

/// Response of every call that starts an asynchronous operation
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OperationIdResponse {
    pub operation_id: String,
}

/// Response with no fields of interest
#[derive(Debug, Default, Deserialize)]
pub struct Empty {}

/// Error body: `{"__type": "...#Code", "message": "..."}`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ErrorBody {
    #[serde(rename = "__type")]
    pub error_type: Option<String>,
    #[serde(alias = "Message")]
    pub message: Option<String>,
}

impl ErrorBody {
    /// Parse an error body, tolerating anything that is not JSON
    pub fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }

    /// Error code with any namespace prefix removed
    pub fn code(&self) -> Option<&str> {
        self.error_type
            .as_deref()
            .and_then(|t| t.rsplit('#').next())
            .filter(|c| !c.is_empty())
    }
}

//! Custom-resource lifecycle events
//!
//! Parses the create/update/delete request delivered by the orchestrating
//! framework, dispatches it to the [`Reconciler`], and builds the response
//! document the framework expects back.
//!
//! ## Inbound shape
//!
//! ```json
//! {
//!   "RequestType": "Create",
//!   "RequestId": "...",
//!   "StackId": "...",
//!   "LogicalResourceId": "Domain",
//!   "ResourceProperties": {
//!     "DomainName": "example.com",
//!     "Contact": { "firstName": "...", "type": "PERSON", ... },
//!     "AutoRenew": "true",
//!     "NameServers": ["ns1.example.net"],
//!     "TransferAuthCode": "..."
//!   }
//! }
//! ```

use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{error, info};

use crate::engine::Reconciler;
use crate::error::{Error, Result};
use crate::model::{Contact, DesiredDomainState};

/// Kind of lifecycle request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestType {
    Create,
    Update,
    Delete,
}

/// A lifecycle request from the orchestrating framework
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LifecycleEvent {
    pub request_type: RequestType,
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub stack_id: String,
    #[serde(default)]
    pub logical_resource_id: String,
    #[serde(default)]
    pub physical_resource_id: Option<String>,
    #[serde(rename = "ResponseURL", default)]
    pub response_url: Option<String>,
    /// Parsed lazily: a delete only needs the domain name
    #[serde(default)]
    pub resource_properties: serde_json::Value,
}

/// Typed view of `ResourceProperties`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ResourceProperties {
    domain_name: String,
    contact: Contact,
    #[serde(deserialize_with = "deserialize_flexible_bool")]
    auto_renew: bool,
    #[serde(default)]
    name_servers: Option<Vec<String>>,
    #[serde(default)]
    transfer_auth_code: Option<String>,
}

/// Accept `true`, `"true"`, `"True"`, and the same for false
///
/// Templating layers frequently deliver booleans as strings.
fn deserialize_flexible_bool<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        String(String),
    }

    match BoolOrString::deserialize(deserializer)? {
        BoolOrString::Bool(b) => Ok(b),
        BoolOrString::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "expected a boolean, got \"{}\"",
                other
            ))),
        },
    }
}

impl LifecycleEvent {
    /// Parse an event from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse an event from any reader (e.g., stdin)
    pub fn from_reader(mut reader: impl Read) -> Result<Self> {
        let mut buf = String::new();
        reader.read_to_string(&mut buf)?;
        Self::from_json(&buf)
    }

    /// Read and parse an event from a file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Desired state carried by a create or update request
    pub fn desired_state(&self) -> Result<DesiredDomainState> {
        let props: ResourceProperties = serde_json::from_value(self.resource_properties.clone())
            .map_err(|e| Error::invalid_input(format!("ResourceProperties: {}", e)))?;

        Ok(DesiredDomainState {
            domain_name: props.domain_name,
            contact: props.contact,
            auto_renew: props.auto_renew,
            name_servers: props.name_servers.unwrap_or_default(),
            transfer_auth_code: props.transfer_auth_code.filter(|code| !code.is_empty()),
        })
    }

    /// Domain name of the resource, best effort
    ///
    /// Prefers `ResourceProperties.DomainName`, then the physical id from an
    /// earlier response.
    pub fn domain_name(&self) -> Option<String> {
        self.resource_properties
            .get("DomainName")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .or_else(|| self.physical_resource_id.clone())
    }
}

/// Outcome reported to the framework
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseStatus {
    Success,
    Failed,
}

/// Response document for a lifecycle request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LifecycleResponse {
    pub status: ResponseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub physical_resource_id: String,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
}

impl LifecycleResponse {
    fn for_event(event: &LifecycleEvent, physical_resource_id: String) -> Self {
        Self {
            status: ResponseStatus::Success,
            reason: None,
            physical_resource_id,
            stack_id: event.stack_id.clone(),
            request_id: event.request_id.clone(),
            logical_resource_id: event.logical_resource_id.clone(),
        }
    }

    /// Successful response with the domain as the resource identity
    pub fn success(event: &LifecycleEvent, domain_name: String) -> Self {
        Self::for_event(event, domain_name)
    }

    /// Failed response carrying the error as the reason
    pub fn failed(event: &LifecycleEvent, physical_resource_id: String, error: &Error) -> Self {
        Self {
            status: ResponseStatus::Failed,
            reason: Some(error.to_string()),
            ..Self::for_event(event, physical_resource_id)
        }
    }

    /// Failed response keyed by the event's domain name when it has one
    pub fn failed_for(event: &LifecycleEvent, error: &Error) -> Self {
        let physical_resource_id = event
            .domain_name()
            .unwrap_or_else(|| event.logical_resource_id.clone());
        Self::failed(event, physical_resource_id, error)
    }

    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }
}

/// Dispatch a lifecycle event and build its response
///
/// Errors never escape: they become a `FAILED` response whose physical id is
/// still the domain name when one can be found.
pub async fn handle_event(reconciler: &Reconciler, event: &LifecycleEvent) -> LifecycleResponse {
    info!(
        "Got {:?} for {} (request {})",
        event.request_type, event.logical_resource_id, event.request_id
    );

    let result = dispatch(reconciler, event).await;

    match result {
        Ok(domain_name) => LifecycleResponse::success(event, domain_name),
        Err(e) => {
            error!("{:?} request {} failed: {}", event.request_type, event.request_id, e);
            LifecycleResponse::failed_for(event, &e)
        }
    }
}

async fn dispatch(reconciler: &Reconciler, event: &LifecycleEvent) -> Result<String> {
    match event.request_type {
        RequestType::Create => reconciler.create(&event.desired_state()?).await,
        RequestType::Update => reconciler.update(&event.desired_state()?).await,
        RequestType::Delete => {
            let domain_name = event.domain_name().ok_or_else(|| {
                Error::invalid_input("Delete request carries no DomainName or PhysicalResourceId")
            })?;
            reconciler.delete(&domain_name).await
        }
    }
}

//! Configuration types for the domain reconciler
//!
//! Registration policy (one year, privacy protection on every contact role)
//! is fixed and has no setting here.

use serde::{Deserialize, Serialize};

/// Region that serves the Route 53 Domains API
pub const DEFAULT_ROUTE53_REGION: &str = "us-east-1";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomregConfig {
    /// Registrar gateway configuration
    pub gateway: GatewayConfig,

    /// Optional reconciler settings
    #[serde(default)]
    pub reconciler: ReconcilerConfig,
}

impl DomregConfig {
    /// Create a configuration with the given gateway and default reconciler settings
    pub fn new(gateway: GatewayConfig) -> Self {
        Self {
            gateway,
            reconciler: ReconcilerConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.gateway.validate()?;
        self.reconciler.validate()?;
        Ok(())
    }
}

/// Registrar gateway configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GatewayConfig {
    /// Amazon Route 53 Domains
    Route53 {
        /// AWS region (the API is only served from us-east-1)
        #[serde(default = "default_region")]
        region: String,
        /// AWS access key id
        access_key_id: String,
        /// AWS secret access key
        secret_access_key: String,
        /// Session token for temporary credentials
        #[serde(default)]
        session_token: Option<String>,
        /// Endpoint override (testing, VPC endpoints)
        #[serde(default)]
        endpoint: Option<String>,
        /// Perform reads but only log mutations
        #[serde(default)]
        dry_run: bool,
    },

    /// In-process fake registrar
    Memory,
}

// Hand-written so secrets never reach logs
impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GatewayConfig::Route53 {
                region,
                access_key_id,
                session_token,
                endpoint,
                dry_run,
                ..
            } => f
                .debug_struct("Route53")
                .field("region", region)
                .field("access_key_id", access_key_id)
                .field("secret_access_key", &"<REDACTED>")
                .field("session_token", &session_token.as_ref().map(|_| "<REDACTED>"))
                .field("endpoint", endpoint)
                .field("dry_run", dry_run)
                .finish(),
            GatewayConfig::Memory => f.write_str("Memory"),
        }
    }
}

impl GatewayConfig {
    /// Validate the gateway configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            GatewayConfig::Route53 {
                region,
                access_key_id,
                secret_access_key,
                endpoint,
                ..
            } => {
                if region.is_empty() {
                    return Err(crate::Error::config("Route 53 region cannot be empty"));
                }
                if access_key_id.is_empty() {
                    return Err(crate::Error::config("AWS access key id cannot be empty"));
                }
                if secret_access_key.is_empty() {
                    return Err(crate::Error::config("AWS secret access key cannot be empty"));
                }
                if let Some(endpoint) = endpoint
                    && !endpoint.starts_with("https://")
                    && !endpoint.starts_with("http://")
                {
                    return Err(crate::Error::config(format!(
                        "Route 53 endpoint must use HTTP or HTTPS scheme. Got: {}",
                        endpoint
                    )));
                }
                Ok(())
            }
            GatewayConfig::Memory => Ok(()),
        }
    }

    /// Get the gateway type name
    pub fn type_name(&self) -> &str {
        match self {
            GatewayConfig::Route53 { .. } => "route53",
            GatewayConfig::Memory => "memory",
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig::Route53 {
            region: default_region(),
            access_key_id: String::new(),
            secret_access_key: String::new(),
            session_token: None,
            endpoint: None,
            dry_run: false,
        }
    }
}

fn default_region() -> String {
    DEFAULT_ROUTE53_REGION.to_string()
}

/// Reconciler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    /// Fetch full operation detail when a transfer is found in flight
    ///
    /// Off by default, which keeps observation to at most two list calls.
    #[serde(default)]
    pub resolve_transfer_detail: bool,

    /// Capacity of the reconcile event channel
    ///
    /// When full, new events are dropped with a warning log.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl ReconcilerConfig {
    /// Validate the reconciler configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            resolve_transfer_detail: false,
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_event_channel_capacity() -> usize {
    100
}

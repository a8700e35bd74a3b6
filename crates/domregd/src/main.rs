// # domregd - Domain Lifecycle Handler
//
// Thin integration layer over domreg-core:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Registering registrar gateways
// 4. Handling one lifecycle event and printing the response
//
// All reconciliation logic lives in domreg-core.
//
// ## Configuration
//
// ### Gateway
// - `DOMREG_GATEWAY_TYPE`: Gateway type (route53, memory). Default: route53
// - `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`: Credentials (route53)
// - `AWS_SESSION_TOKEN`: Session token for temporary credentials (optional)
// - `DOMREG_REGION`: Signing region. Default: us-east-1
// - `DOMREG_ENDPOINT`: Endpoint override (optional)
// - `DOMREG_MODE`: `dry-run` to log mutations instead of sending them
//
// ### Reconciler
// - `DOMREG_RESOLVE_TRANSFER_DETAIL`: Fetch detail of in-flight transfers (true/false)
//
// ### Process
// - `DOMREG_EVENT_PATH`: Read the event from this file instead of stdin
// - `DOMREG_LOG_LEVEL`: trace, debug, info, warn, error. Default: info
//
// ## Example
//
// ```bash
// export AWS_ACCESS_KEY_ID=...
// export AWS_SECRET_ACCESS_KEY=...
// export DOMREG_MODE=dry-run
//
// domregd < create-event.json
// ```
//
// Logs go to stderr; stdout carries only the response document.

use anyhow::{Context, Result};
use domreg_core::config::{DEFAULT_ROUTE53_REGION, DomregConfig, GatewayConfig, ReconcilerConfig};
use domreg_core::{
    GatewayRegistry, LifecycleEvent, LifecycleResponse, ReconcileEvent, Reconciler, handle_event,
};
use std::env;
use std::process::ExitCode;
use tokio::sync::mpsc;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

/// Exit codes
///
/// - 0: Event handled, response is SUCCESS
/// - 1: Configuration, input, or gateway construction error
/// - 2: Event handled, response is FAILED
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DomregExitCode {
    Success = 0,
    ConfigError = 1,
    Failed = 2,
}

impl From<DomregExitCode> for ExitCode {
    fn from(code: DomregExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
#[derive(Clone)]
struct Config {
    gateway_type: String,
    access_key_id: String,
    secret_access_key: String,
    session_token: Option<String>,
    region: String,
    endpoint: Option<String>,
    dry_run: bool,
    resolve_transfer_detail: bool,
    event_path: Option<String>,
    log_level: String,
}

// Credentials stay out of Debug output
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("gateway_type", &self.gateway_type)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<REDACTED>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<REDACTED>"))
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("dry_run", &self.dry_run)
            .field("resolve_transfer_detail", &self.resolve_transfer_detail)
            .field("event_path", &self.event_path)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let resolve_transfer_detail = match non_empty("DOMREG_RESOLVE_TRANSFER_DETAIL") {
            None => false,
            Some(value) => parse_bool(&value).with_context(|| {
                format!(
                    "DOMREG_RESOLVE_TRANSFER_DETAIL must be true or false. Got: {}",
                    value
                )
            })?,
        };

        Ok(Self {
            gateway_type: non_empty("DOMREG_GATEWAY_TYPE")
                .unwrap_or_else(|| "route53".to_string())
                .to_lowercase(),
            access_key_id: lookup("AWS_ACCESS_KEY_ID").unwrap_or_default(),
            secret_access_key: lookup("AWS_SECRET_ACCESS_KEY").unwrap_or_default(),
            session_token: non_empty("AWS_SESSION_TOKEN"),
            region: non_empty("DOMREG_REGION")
                .unwrap_or_else(|| DEFAULT_ROUTE53_REGION.to_string()),
            endpoint: non_empty("DOMREG_ENDPOINT"),
            dry_run: non_empty("DOMREG_MODE")
                .is_some_and(|mode| mode.eq_ignore_ascii_case("dry-run")),
            resolve_transfer_detail,
            event_path: non_empty("DOMREG_EVENT_PATH"),
            log_level: non_empty("DOMREG_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        match self.gateway_type.as_str() {
            "route53" | "memory" => {}
            other => anyhow::bail!(
                "DOMREG_GATEWAY_TYPE '{}' is not supported. \
                Supported types: route53, memory",
                other
            ),
        }

        if let Some(ref path) = self.event_path
            && !std::path::Path::new(path).is_file()
        {
            anyhow::bail!("DOMREG_EVENT_PATH does not point to a file: {}", path);
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "DOMREG_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        self.domreg_config().validate().map_err(|e| {
            anyhow::anyhow!(
                "{}. Set AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY, \
                or DOMREG_GATEWAY_TYPE=memory for a local dry evaluation",
                e
            )
        })?;

        Ok(())
    }

    /// Core configuration derived from the environment
    fn domreg_config(&self) -> DomregConfig {
        let gateway = match self.gateway_type.as_str() {
            "memory" => GatewayConfig::Memory,
            _ => GatewayConfig::Route53 {
                region: self.region.clone(),
                access_key_id: self.access_key_id.clone(),
                secret_access_key: self.secret_access_key.clone(),
                session_token: self.session_token.clone(),
                endpoint: self.endpoint.clone(),
                dry_run: self.dry_run,
            },
        };

        DomregConfig {
            gateway,
            reconciler: ReconcilerConfig {
                resolve_transfer_detail: self.resolve_transfer_detail,
                ..Default::default()
            },
        }
    }

    fn log_level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => anyhow::bail!("not a boolean"),
    }
}

/// Registry with every gateway compiled into this binary
fn gateway_registry() -> GatewayRegistry {
    let registry = GatewayRegistry::with_builtin();

    #[cfg(feature = "route53")]
    domreg_gateway_route53::register(&registry);

    registry
}

fn read_event(config: &Config) -> Result<LifecycleEvent> {
    match config.event_path {
        Some(ref path) => LifecycleEvent::from_path(path)
            .with_context(|| format!("Failed to read lifecycle event from {}", path)),
        None => LifecycleEvent::from_reader(std::io::stdin().lock())
            .context("Failed to read lifecycle event from stdin"),
    }
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return DomregExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return DomregExitCode::ConfigError.into();
    }

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level())
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DomregExitCode::ConfigError.into();
    }

    let event = match read_event(&config) {
        Ok(event) => event,
        Err(e) => {
            error!("{:#}", e);
            return DomregExitCode::ConfigError.into();
        }
    };

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DomregExitCode::ConfigError.into();
        }
    };

    let (response, code) = rt.block_on(run(&config, &event));

    match serde_json::to_string(&response) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            error!("Failed to serialize response: {}", e);
            return DomregExitCode::Failed.into();
        }
    }

    code.into()
}

/// Handle one event, returning the response and the exit code to use
async fn run(config: &Config, event: &LifecycleEvent) -> (LifecycleResponse, DomregExitCode) {
    let domreg_config = config.domreg_config();

    info!(
        "Starting domregd (gateway: {}{})",
        domreg_config.gateway.type_name(),
        if config.dry_run { ", dry-run" } else { "" }
    );

    let gateway = match gateway_registry().create_gateway(&domreg_config.gateway) {
        Ok(gateway) => gateway,
        Err(e) => {
            error!("Failed to initialize gateway: {}", e);
            return (
                LifecycleResponse::failed_for(event, &e),
                DomregExitCode::ConfigError,
            );
        }
    };

    let (reconciler, events) = match Reconciler::new(gateway, domreg_config.reconciler) {
        Ok(pair) => pair,
        Err(e) => {
            error!("Failed to initialize reconciler: {}", e);
            return (
                LifecycleResponse::failed_for(event, &e),
                DomregExitCode::ConfigError,
            );
        }
    };

    let response = handle_event(&reconciler, event).await;
    log_events(events);

    let code = if response.is_success() {
        DomregExitCode::Success
    } else {
        DomregExitCode::Failed
    };

    (response, code)
}

fn log_events(mut events: mpsc::Receiver<ReconcileEvent>) {
    while let Ok(event) = events.try_recv() {
        debug!("Reconcile event: {:?}", event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn route53_env() -> Vec<(&'static str, &'static str)> {
        vec![
            ("AWS_ACCESS_KEY_ID", "AKIDEXAMPLE"),
            ("AWS_SECRET_ACCESS_KEY", "secret-key-12345"),
        ]
    }

    fn create_event() -> LifecycleEvent {
        LifecycleEvent::from_json(
            &serde_json::json!({
                "RequestType": "Create",
                "RequestId": "req-1",
                "LogicalResourceId": "Domain",
                "ResourceProperties": {
                    "DomainName": "foo.com",
                    "Contact": {
                        "firstName": "Joe",
                        "lastName": "Bob",
                        "addressLine1": "PO Box 123",
                        "city": "Nowhere",
                        "state": "CA",
                        "countryCode": "US",
                        "zipCode": "91222",
                        "phoneNumber": "+1.3035551212",
                        "email": "joe@bob.com"
                    },
                    "AutoRenew": "true"
                }
            })
            .to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&route53_env())).unwrap();

        assert_eq!(config.gateway_type, "route53");
        assert_eq!(config.region, "us-east-1");
        assert!(!config.dry_run);
        assert!(!config.resolve_transfer_detail);
        assert!(config.event_path.is_none());
        assert_eq!(config.log_level(), Level::INFO);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("AWS_ACCESS_KEY_ID"));
    }

    #[test]
    fn test_memory_gateway_needs_no_credentials() {
        let config = Config::from_lookup(lookup(&[("DOMREG_GATEWAY_TYPE", "memory")])).unwrap();
        assert!(config.validate().is_ok());
        assert!(matches!(
            config.domreg_config().gateway,
            GatewayConfig::Memory
        ));
    }

    #[test]
    fn test_unknown_gateway_type_rejected() {
        let config = Config::from_lookup(lookup(&[("DOMREG_GATEWAY_TYPE", "godaddy")])).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_dry_run_and_detail_flags() {
        let mut env = route53_env();
        env.push(("DOMREG_MODE", "DRY-RUN"));
        env.push(("DOMREG_RESOLVE_TRANSFER_DETAIL", "true"));
        let config = Config::from_lookup(lookup(&env)).unwrap();

        assert!(config.dry_run);
        let core = config.domreg_config();
        assert!(core.reconciler.resolve_transfer_detail);
        assert!(matches!(
            core.gateway,
            GatewayConfig::Route53 { dry_run: true, .. }
        ));
    }

    #[test]
    fn test_bad_boolean_rejected() {
        let result = Config::from_lookup(lookup(&[("DOMREG_RESOLVE_TRANSFER_DETAIL", "sometimes")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let mut env = route53_env();
        env.push(("DOMREG_LOG_LEVEL", "verbose"));
        let config = Config::from_lookup(lookup(&env)).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_event_path_must_exist() {
        let mut env = route53_env();
        env.push(("DOMREG_EVENT_PATH", "/nonexistent/event.json"));
        let config = Config::from_lookup(lookup(&env)).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_read_event_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"RequestType": "Delete", "PhysicalResourceId": "foo.com"}}"#).unwrap();
        let path = file.path().to_string_lossy().to_string();

        let mut env = route53_env();
        env.push(("DOMREG_EVENT_PATH", path.as_str()));
        let config = Config::from_lookup(lookup(&env)).unwrap();

        let event = read_event(&config).unwrap();
        assert_eq!(event.domain_name().as_deref(), Some("foo.com"));
    }

    #[test]
    fn test_secrets_not_in_debug() {
        let mut env = route53_env();
        env.push(("AWS_SESSION_TOKEN", "tok-999"));
        let config = Config::from_lookup(lookup(&env)).unwrap();

        let debug = format!("{:?}", config);
        assert!(!debug.contains("secret-key-12345"));
        assert!(!debug.contains("tok-999"));
    }

    #[cfg(feature = "route53")]
    #[test]
    fn test_registry_has_all_gateways() {
        assert_eq!(gateway_registry().list_gateways(), vec!["memory", "route53"]);
    }

    #[tokio::test]
    async fn test_run_against_memory_gateway() {
        let config = Config::from_lookup(lookup(&[("DOMREG_GATEWAY_TYPE", "memory")])).unwrap();

        let (response, code) = run(&config, &create_event()).await;

        assert_eq!(code, DomregExitCode::Success);
        assert!(response.is_success());
        assert_eq!(response.physical_resource_id, "foo.com");
    }

    #[cfg(feature = "route53")]
    #[tokio::test]
    async fn test_gateway_construction_failure_reported() {
        // Validation is bypassed here; the factory still refuses empty credentials
        let config = Config::from_lookup(lookup(&[])).unwrap();

        let (response, code) = run(&config, &create_event()).await;

        assert_eq!(code, DomregExitCode::ConfigError);
        assert!(!response.is_success());
        assert_eq!(response.physical_resource_id, "foo.com");
        assert!(response.reason.unwrap_or_default().contains("credentials"));
    }
}

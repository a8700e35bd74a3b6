//! Registrar gateway registry
//!
//! Maps gateway type names to factories so the daemon can build whichever
//! gateway the configuration names without matching on every variant.
//!
//! ```rust,ignore
//! use domreg_core::registry::GatewayRegistry;
//!
//! let registry = GatewayRegistry::new();
//! domreg_gateway_route53::register(&registry);
//!
//! let gateway = registry.create_gateway(&config.gateway)?;
//! ```

use std::collections::HashMap;
use std::sync::RwLock;

use crate::config::GatewayConfig;
use crate::error::{Error, Result};
use crate::gateway::MemoryRegistrarFactory;
use crate::traits::{GatewayFactory, RegistrarGateway};

/// Registry of gateway factories keyed by type name
#[derive(Default)]
pub struct GatewayRegistry {
    factories: RwLock<HashMap<String, Box<dyn GatewayFactory>>>,
}

impl GatewayRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the in-memory gateway already registered
    pub fn with_builtin() -> Self {
        let registry = Self::new();
        registry.register_gateway("memory", Box::new(MemoryRegistrarFactory));
        registry
    }

    /// Register a gateway factory under `name`
    ///
    /// A later registration under the same name replaces the earlier one.
    pub fn register_gateway(&self, name: impl Into<String>, factory: Box<dyn GatewayFactory>) {
        let mut factories = self
            .factories
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        factories.insert(name.into(), factory);
    }

    /// Build a gateway for the given configuration
    pub fn create_gateway(&self, config: &GatewayConfig) -> Result<Box<dyn RegistrarGateway>> {
        let gateway_type = config.type_name();
        let factories = self
            .factories
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let factory = factories
            .get(gateway_type)
            .ok_or_else(|| Error::config(format!("Unknown gateway type: {}", gateway_type)))?;

        factory.create(config)
    }

    /// Registered gateway type names, sorted
    pub fn list_gateways(&self) -> Vec<String> {
        let factories = self
            .factories
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut names: Vec<String> = factories.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn has_gateway(&self, name: &str) -> bool {
        self.factories
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains_key(name)
    }
}

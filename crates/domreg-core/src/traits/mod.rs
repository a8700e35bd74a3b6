//! Core traits for domain reconciliation
//!
//! - [`RegistrarGateway`]: capability set of a domain registrar
//! - [`GatewayFactory`]: builds a gateway from configuration

pub mod registrar_gateway;

pub use registrar_gateway::{GatewayFactory, RegistrarGateway};

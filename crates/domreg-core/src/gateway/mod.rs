// # Gateway Implementations
//
// Registrar gateways that live in the core crate. The Route 53 gateway has
// its own crate.

pub mod memory;

pub use memory::{GatewayCall, MemoryRegistrar, MemoryRegistrarFactory};

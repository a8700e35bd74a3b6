// # domreg-core
//
// Core library for reconciling registrar-managed domain names.
//
// ## Architecture Overview
//
// - **RegistrarGateway**: Trait over the registrar's domain and operation API
// - **observe**: Classifies a domain as absent, transferring, or registered
// - **plan**: Derives the corrective actions from desired vs. observed state
// - **Reconciler**: Applies plans for create/update/delete lifecycle requests
// - **GatewayRegistry**: Builds gateways from configuration by type name
//
// ## Design Principles
//
// 1. **Single-pass**: One lifecycle event yields one observe → plan → apply pass
// 2. **Convergent**: A pass against an already-converged domain makes no mutation
// 3. **Library-First**: The daemon is a thin shell over this crate

pub mod traits;
pub mod model;
pub mod observe;
pub mod plan;
pub mod engine;
pub mod lifecycle;
pub mod gateway;
pub mod registry;
pub mod config;
pub mod error;

// Re-export core types for convenience
pub use traits::{GatewayFactory, RegistrarGateway};
pub use model::{
    Availability, Contact, ContactDetail, ContactType, DesiredDomainState, DomainDetail,
    DomainSummary, ObservedDomainState, OperationDetail, OperationFilter, OperationStatus,
    OperationSummary, Transferability,
};
pub use observe::observe;
pub use plan::{Action, ActionKind, Plan, plan};
pub use engine::{ActionOutcome, ReconcileEvent, Reconciler};
pub use lifecycle::{LifecycleEvent, LifecycleResponse, RequestType, ResponseStatus, handle_event};
pub use gateway::{MemoryRegistrar, MemoryRegistrarFactory};
pub use registry::GatewayRegistry;
pub use config::{DomregConfig, GatewayConfig, ReconcilerConfig};
pub use error::{Error, Result};

//! Domain reconciler
//!
//! The Reconciler is responsible for:
//! - Observing the domain through the RegistrarGateway
//! - Planning corrective actions
//! - Applying the plan, one gateway call per action
//! - Reporting progress as events
//!
//! ## Flow
//!
//! ```text
//! DesiredDomainState
//!        │
//!        ▼
//! ┌──────────────┐   list_domains / list_operations   ┌──────────────────┐
//! │  observe()   │ ─────────────────────────────────▶ │ RegistrarGateway │
//! └──────────────┘                                    └──────────────────┘
//!        │ ObservedDomainState                                 ▲
//!        ▼                                                     │
//! ┌──────────────┐   availability / transferability            │
//! │   plan()     │ ────────────────────────────────────────────┤
//! └──────────────┘                                             │
//!        │ Plan                                                │
//!        ▼                                                     │
//! ┌──────────────┐   register / transfer / update_*            │
//! │   apply()    │ ────────────────────────────────────────────┘
//! └──────────────┘
//! ```
//!
//! ## Failure Semantics
//!
//! The first failing action aborts the pass. Actions already applied stay
//! applied; there is no compensation step.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::ReconcilerConfig;
use crate::error::{Error, Result};
use crate::model::{DesiredDomainState, ObservedDomainState};
use crate::observe::observe_with;
use crate::plan::{Action, ActionKind, FailReason, Plan, plan};
use crate::traits::RegistrarGateway;

/// Events emitted by the Reconciler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileEvent {
    /// Registrar state observed
    Observed {
        domain_name: String,
        state: &'static str,
    },

    /// Plan computed
    Planned {
        domain_name: String,
        actions: Vec<ActionKind>,
    },

    /// Action applied successfully
    ActionApplied {
        domain_name: String,
        action: ActionKind,
        operation_id: Option<String>,
    },

    /// Action failed; the pass stops here
    ActionFailed {
        domain_name: String,
        action: ActionKind,
        error: String,
    },

    /// Delete requested; nothing was done
    DeleteSkipped { domain_name: String },
}

/// Result of one applied action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    pub action: ActionKind,
    /// Registrar operation id, for calls that return one
    pub operation_id: Option<String>,
}

/// Domain reconciler
///
/// Holds the only dependency, the gateway, explicitly. One instance can serve
/// any number of sequential lifecycle events; no state carries over between
/// them.
pub struct Reconciler {
    /// Registrar gateway
    gateway: Box<dyn RegistrarGateway>,

    /// Resolve in-flight transfer operations to full detail
    resolve_transfer_detail: bool,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<ReconcileEvent>,
}

impl Reconciler {
    /// Create a new reconciler
    ///
    /// # Returns
    ///
    /// A tuple of (reconciler, event_receiver) where event_receiver yields reconcile events
    pub fn new(
        gateway: Box<dyn RegistrarGateway>,
        config: ReconcilerConfig,
    ) -> Result<(Self, mpsc::Receiver<ReconcileEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let reconciler = Self {
            gateway,
            resolve_transfer_detail: config.resolve_transfer_detail,
            event_tx: tx,
        };

        Ok((reconciler, rx))
    }

    /// The gateway this reconciler drives
    pub fn gateway(&self) -> &dyn RegistrarGateway {
        self.gateway.as_ref()
    }

    /// Observe a domain through the gateway
    pub async fn observe(&self, domain_name: &str) -> Result<ObservedDomainState> {
        let observed =
            observe_with(self.gateway.as_ref(), domain_name, self.resolve_transfer_detail).await?;

        debug!("Observed {} as {}", domain_name, observed.kind());
        self.emit_event(ReconcileEvent::Observed {
            domain_name: domain_name.to_string(),
            state: observed.kind(),
        });

        Ok(observed)
    }

    /// Handle a create request
    ///
    /// Registers or transfers an absent domain; reconciles one that already
    /// exists. Returns the domain name as the resource identifier.
    pub async fn create(&self, desired: &DesiredDomainState) -> Result<String> {
        info!("Create requested for {}", desired.domain_name);
        desired.validate()?;

        let observed = self.observe(&desired.domain_name).await?;
        self.reconcile(desired, &observed).await?;

        Ok(desired.domain_name.clone())
    }

    /// Handle an update request
    ///
    /// The domain must already be known to the registrar.
    pub async fn update(&self, desired: &DesiredDomainState) -> Result<String> {
        info!("Update requested for {}", desired.domain_name);
        desired.validate()?;

        let observed = self.observe(&desired.domain_name).await?;
        if matches!(observed, ObservedDomainState::Absent) {
            return Err(Error::not_found(&desired.domain_name));
        }
        self.reconcile(desired, &observed).await?;

        Ok(desired.domain_name.clone())
    }

    /// Handle a delete request
    ///
    /// Deleting a domain is irreversible, so no registrar call is made and the
    /// request always succeeds. Releasing the domain is left to an operator.
    pub async fn delete(&self, domain_name: &str) -> Result<String> {
        warn!(
            "Delete requested for {}; domain left registered, release it manually if intended",
            domain_name
        );
        self.emit_event(ReconcileEvent::DeleteSkipped {
            domain_name: domain_name.to_string(),
        });
        Ok(domain_name.to_string())
    }

    /// Plan against an observation and apply the result
    pub async fn reconcile(
        &self,
        desired: &DesiredDomainState,
        observed: &ObservedDomainState,
    ) -> Result<Vec<ActionOutcome>> {
        if let ObservedDomainState::InProgressTransfer { operation, detail } = observed {
            info!(
                "Transfer {} of {} still in progress{}; leaving domain untouched",
                operation.operation_id,
                desired.domain_name,
                detail
                    .as_ref()
                    .and_then(|d| d.message.as_deref())
                    .map(|m| format!(" ({})", m))
                    .unwrap_or_default()
            );
        }

        let plan = plan(self.gateway.as_ref(), desired, observed).await?;
        self.emit_event(ReconcileEvent::Planned {
            domain_name: desired.domain_name.clone(),
            actions: plan.kinds(),
        });

        if plan.is_empty() {
            info!("{} is up to date", desired.domain_name);
        } else {
            info!("{} needs: {:?}", desired.domain_name, plan.kinds());
        }

        self.apply(desired, plan).await
    }

    /// Apply a plan in order
    ///
    /// Stops at the first failure, which is returned as-is.
    pub async fn apply(
        &self,
        desired: &DesiredDomainState,
        plan: Plan,
    ) -> Result<Vec<ActionOutcome>> {
        let mut outcomes = Vec::with_capacity(plan.len());

        for action in plan {
            let kind = action.kind();
            match self.apply_action(desired, action).await {
                Ok(operation_id) => {
                    info!(
                        "Applied {} to {}{}",
                        kind,
                        desired.domain_name,
                        operation_id
                            .as_deref()
                            .map(|id| format!(" (operation {})", id))
                            .unwrap_or_default()
                    );
                    self.emit_event(ReconcileEvent::ActionApplied {
                        domain_name: desired.domain_name.clone(),
                        action: kind,
                        operation_id: operation_id.clone(),
                    });
                    outcomes.push(ActionOutcome {
                        action: kind,
                        operation_id,
                    });
                }
                Err(e) => {
                    warn!("{} failed for {}: {}", kind, desired.domain_name, e);
                    self.emit_event(ReconcileEvent::ActionFailed {
                        domain_name: desired.domain_name.clone(),
                        action: kind,
                        error: e.to_string(),
                    });
                    return Err(e);
                }
            }
        }

        Ok(outcomes)
    }

    /// Perform a single action
    async fn apply_action(
        &self,
        desired: &DesiredDomainState,
        action: Action,
    ) -> Result<Option<String>> {
        let domain_name = desired.domain_name.as_str();

        match action {
            Action::Register(request) => self.gateway.register_domain(&request).await.map(Some),
            Action::TransferIn(request) => self.gateway.transfer_domain(&request).await.map(Some),
            Action::UpdateContact(contact) => self
                .gateway
                .update_domain_contact(domain_name, &contact)
                .await
                .map(Some),
            Action::SetAutoRenew(true) => self
                .gateway
                .enable_domain_auto_renew(domain_name)
                .await
                .map(|_| None),
            Action::SetAutoRenew(false) => self
                .gateway
                .disable_domain_auto_renew(domain_name)
                .await
                .map(|_| None),
            Action::UpdateNameservers(name_servers) => self
                .gateway
                .update_domain_nameservers(domain_name, &name_servers)
                .await
                .map(Some),
            Action::Fail(FailReason::NotAvailable(_)) => Err(Error::not_available(domain_name)),
            Action::Fail(FailReason::NotTransferable(_)) => {
                Err(Error::not_transferable(domain_name))
            }
        }
    }

    /// Emit a reconcile event
    fn emit_event(&self, event: ReconcileEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
            // Nobody is listening
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MemoryRegistrar;

    #[test]
    fn test_zero_capacity_rejected() {
        let config = ReconcilerConfig {
            resolve_transfer_detail: false,
            event_channel_capacity: 0,
        };
        assert!(Reconciler::new(Box::new(MemoryRegistrar::new()), config).is_err());
    }

    #[tokio::test]
    async fn test_delete_makes_no_gateway_calls() {
        let registrar = MemoryRegistrar::new();
        let (reconciler, mut events) =
            Reconciler::new(Box::new(registrar.clone()), ReconcilerConfig::default()).unwrap();

        let id = reconciler.delete("foo.com").await.unwrap();

        assert_eq!(id, "foo.com");
        assert!(registrar.calls().await.is_empty());
        assert_eq!(
            events.try_recv().unwrap(),
            ReconcileEvent::DeleteSkipped {
                domain_name: "foo.com".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_full_channel_does_not_fail_reconcile() {
        let config = ReconcilerConfig {
            resolve_transfer_detail: false,
            event_channel_capacity: 1,
        };
        let (reconciler, _events) =
            Reconciler::new(Box::new(MemoryRegistrar::new()), config).unwrap();

        assert!(reconciler.delete("a.com").await.is_ok());
        assert!(reconciler.delete("b.com").await.is_ok());
    }
}

use crate::policy::{GateBlock, GateStatus, evaluate_gate};
use crate::{FleetState, FleetStore, FwError, Result, SerialNumber, artifact};

/// Caller-driven retry of a deferred DFU. Only the gate is re-evaluated; the
/// stored artifact was validated when it was requested.
#[derive(Clone)]
pub struct ApplyPendingDfuOperation {
    store: FleetStore,
}

#[derive(Debug, Clone)]
pub struct ApplyPendingDfuOperationRequest {
    pub serial: SerialNumber,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyPendingDfuOperationOutcome {
    Applied {
        artifact: String,
        previous_version: String,
        version: String,
    },
    StillBlocked {
        block: GateBlock,
        pending: Option<String>,
    },
    NothingPending,
}

impl ApplyPendingDfuOperationOutcome {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Applied { .. } => 200,
            Self::StillBlocked { .. } => 202,
            Self::NothingPending => 204,
        }
    }
}

impl ApplyPendingDfuOperation {
    pub fn new(store: FleetStore) -> Self {
        Self { store }
    }

    pub async fn run(
        &self,
        request: ApplyPendingDfuOperationRequest,
    ) -> Result<ApplyPendingDfuOperationOutcome> {
        let ApplyPendingDfuOperationRequest { serial } = request;

        let mut state = self.store.write().await;
        let FleetState {
            registry, pending, ..
        } = &mut *state;

        let endpoint = registry
            .get_endpoint_mut(&serial)
            .ok_or_else(|| FwError::EndpointNotFound(serial.to_string()))?;

        if let GateStatus::Blocked(block) = evaluate_gate(endpoint) {
            tracing::debug!("Endpoint {} still blocked: {:?}", serial, block);
            return Ok(ApplyPendingDfuOperationOutcome::StillBlocked {
                block,
                pending: pending.get(&serial).map(str::to_string),
            });
        }

        let Some(stored) = pending.get(&serial).map(str::to_string) else {
            tracing::debug!("No pending DFU for {}", serial);
            return Ok(ApplyPendingDfuOperationOutcome::NothingPending);
        };

        let version = artifact::validate(&stored, endpoint.hardware_type()).map_err(|reason| {
            tracing::error!("Pending DFU {} for {} no longer parses: {}", stored, serial, reason);
            FwError::invalid_artifact(stored.clone(), reason)
        })?;

        let previous_version = endpoint.version().to_string();
        endpoint.set_version(version.clone());
        pending.clear(&serial);

        tracing::info!(
            "Pending DFU applied endpoint={} artifact={} version {} -> {}",
            serial,
            stored,
            previous_version,
            version
        );

        Ok(ApplyPendingDfuOperationOutcome::Applied {
            artifact: stored,
            previous_version,
            version,
        })
    }
}

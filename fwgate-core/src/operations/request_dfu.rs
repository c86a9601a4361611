use crate::policy::{GateBlock, GateStatus, evaluate_gate};
use crate::{FleetState, FleetStore, FwError, Result, SerialNumber, artifact};

/// Endpoint DFU flow: validate eagerly, then apply now or park the artifact
/// in the endpoint's pending slot.
#[derive(Clone)]
pub struct RequestDfuOperation {
    store: FleetStore,
}

#[derive(Debug, Clone)]
pub struct RequestDfuOperationRequest {
    pub serial: SerialNumber,
    pub artifact: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestDfuOperationOutcome {
    Applied {
        previous_version: String,
        version: String,
    },
    AlreadyCurrent {
        version: String,
    },
    Deferred {
        block: GateBlock,
        /// Earlier pending artifact overwritten by this request.
        replaced: Option<String>,
    },
}

impl RequestDfuOperationOutcome {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Applied { .. } => 200,
            Self::Deferred { .. } => 202,
            Self::AlreadyCurrent { .. } => 204,
        }
    }
}

impl RequestDfuOperation {
    pub fn new(store: FleetStore) -> Self {
        Self { store }
    }

    pub async fn run(&self, request: RequestDfuOperationRequest) -> Result<RequestDfuOperationOutcome> {
        let RequestDfuOperationRequest { serial, artifact } = request;

        let mut state = self.store.write().await;
        let FleetState {
            registry, pending, ..
        } = &mut *state;

        let endpoint = registry
            .get_endpoint_mut(&serial)
            .ok_or_else(|| FwError::EndpointNotFound(serial.to_string()))?;

        let version = artifact::validate(&artifact, endpoint.hardware_type()).map_err(|reason| {
            tracing::warn!("Rejected DFU artifact {} for {}: {}", artifact, serial, reason);
            FwError::invalid_artifact(artifact.clone(), reason)
        })?;

        if let GateStatus::Blocked(block) = evaluate_gate(endpoint) {
            let replaced = pending.defer(serial.clone(), artifact.clone());
            tracing::info!(
                "DFU deferred endpoint={} artifact={} block={:?} replaced={:?}",
                serial,
                artifact,
                block,
                replaced
            );
            return Ok(RequestDfuOperationOutcome::Deferred { block, replaced });
        }

        if version == endpoint.version() {
            if let Some(superseded) = pending.clear(&serial) {
                tracing::info!("Dropped pending DFU {} for {}", superseded, serial);
            }
            tracing::debug!("Endpoint {} already at version {}", serial, version);
            return Ok(RequestDfuOperationOutcome::AlreadyCurrent { version });
        }

        let previous_version = endpoint.version().to_string();
        endpoint.set_version(version.clone());
        if let Some(superseded) = pending.clear(&serial) {
            tracing::info!("Dropped pending DFU {} for {}", superseded, serial);
        }

        tracing::info!(
            "DFU applied endpoint={} artifact={} version {} -> {}",
            serial,
            artifact,
            previous_version,
            version
        );

        Ok(RequestDfuOperationOutcome::Applied {
            previous_version,
            version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ArtifactError, TopologyBuilder};

    const EP1: &str = "AHN2_ABCDEF000001_EP1_SN";
    const MOXA_EP2: &str = "MOXA_TBCDB1045001_EP2_SN";

    fn sample_store() -> FleetStore {
        FleetStore::new(TopologyBuilder::new().sample(true).build().unwrap())
    }

    fn request(serial: &str, artifact: &str) -> RequestDfuOperationRequest {
        RequestDfuOperationRequest {
            serial: SerialNumber::from(serial),
            artifact: artifact.to_string(),
        }
    }

    #[tokio::test]
    async fn test_applies_when_gate_open() {
        let store = sample_store();
        let outcome = RequestDfuOperation::new(store.clone())
            .run(request(EP1, "ahn2_12.swu"))
            .await
            .unwrap();
        assert_eq!(outcome.status_code(), 200);

        let state = store.read().await;
        let endpoint = state.registry.get_endpoint(&SerialNumber::from(EP1)).unwrap();
        assert_eq!(endpoint.version(), "12");
    }

    #[tokio::test]
    async fn test_defers_on_low_battery_and_keeps_version() {
        let store = sample_store();
        store
            .write()
            .await
            .registry
            .get_endpoint_mut(&SerialNumber::from(EP1))
            .unwrap()
            .set_battery_ma(2000);

        let operation = RequestDfuOperation::new(store.clone());
        let outcome = operation.run(request(EP1, "ahn2_11.swu")).await.unwrap();
        assert_eq!(
            outcome,
            RequestDfuOperationOutcome::Deferred {
                block: GateBlock::LowBattery {
                    battery_ma: 2000,
                    threshold_ma: 2500,
                },
                replaced: None,
            }
        );
        assert_eq!(outcome.status_code(), 202);

        let outcome = operation.run(request(EP1, "ahn2_12.swu")).await.unwrap();
        assert!(matches!(
            outcome,
            RequestDfuOperationOutcome::Deferred { ref replaced, .. }
                if replaced.as_deref() == Some("ahn2_11.swu")
        ));

        let state = store.read().await;
        let serial = SerialNumber::from(EP1);
        assert_eq!(state.registry.get_endpoint(&serial).unwrap().version(), "10");
        assert_eq!(state.pending.get(&serial), Some("ahn2_12.swu"));
    }

    #[tokio::test]
    async fn test_defers_on_backlog() {
        let store = sample_store();
        store
            .write()
            .await
            .registry
            .get_endpoint_mut(&SerialNumber::from(EP1))
            .unwrap()
            .set_backlog(4);

        let outcome = RequestDfuOperation::new(store)
            .run(request(EP1, "ahn2_12.swu"))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            RequestDfuOperationOutcome::Deferred {
                block: GateBlock::Backlog { backlog: 4 },
                replaced: None,
            }
        );
    }

    #[tokio::test]
    async fn test_validation_runs_before_gate() {
        let store = sample_store();
        store
            .write()
            .await
            .registry
            .get_endpoint_mut(&SerialNumber::from(EP1))
            .unwrap()
            .set_backlog(1);

        let operation = RequestDfuOperation::new(store.clone());
        for (artifact, expected) in [
            ("ahn2-10.swu", ArtifactError::MissingSeparator),
            ("ahn2_10.bin", ArtifactError::BadSuffix),
        ] {
            let err = operation.run(request(EP1, artifact)).await.unwrap_err();
            match err {
                FwError::InvalidArtifact { reason, .. } => assert_eq!(reason, expected),
                other => panic!("unexpected error: {}", other),
            }
        }
        assert!(store.read().await.pending.is_empty());
    }

    #[tokio::test]
    async fn test_prefix_mismatch() {
        let err = RequestDfuOperation::new(sample_store())
            .run(request(MOXA_EP2, "cassia_10.swu"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FwError::InvalidArtifact {
                reason: ArtifactError::PrefixMismatch { .. },
                ..
            }
        ));
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_already_current_supersedes_pending() {
        let store = sample_store();
        let serial = SerialNumber::from(EP1);
        store.write().await.pending.defer(serial.clone(), "ahn2_12.swu");

        let outcome = RequestDfuOperation::new(store.clone())
            .run(request(EP1, "ahn2_10.swu"))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            RequestDfuOperationOutcome::AlreadyCurrent {
                version: "10".to_string()
            }
        );
        assert_eq!(outcome.status_code(), 204);
        assert_eq!(store.read().await.pending.get(&serial), None);
    }

    #[tokio::test]
    async fn test_blocked_request_for_current_version_is_deferred() {
        let store = sample_store();
        let serial = SerialNumber::from(EP1);
        store
            .write()
            .await
            .registry
            .get_endpoint_mut(&serial)
            .unwrap()
            .set_battery_ma(2000);

        let outcome = RequestDfuOperation::new(store.clone())
            .run(request(EP1, "ahn2_10.swu"))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            RequestDfuOperationOutcome::Deferred {
                block: GateBlock::LowBattery {
                    battery_ma: 2000,
                    threshold_ma: 2500,
                },
                replaced: None,
            }
        );
        assert_eq!(outcome.status_code(), 202);

        let state = store.read().await;
        assert_eq!(state.registry.get_endpoint(&serial).unwrap().version(), "10");
        assert_eq!(state.pending.get(&serial), Some("ahn2_10.swu"));
    }

    #[tokio::test]
    async fn test_unknown_endpoint() {
        let err = RequestDfuOperation::new(sample_store())
            .run(request("NOPE", "ahn2_12.swu"))
            .await
            .unwrap_err();
        assert!(matches!(err, FwError::EndpointNotFound(_)));
    }
}

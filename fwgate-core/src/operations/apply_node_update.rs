use crate::{FleetState, FleetStore, FwError, NodeUuid, Result, artifact};

/// Node OTA flow. Not gated by battery or backlog; only identity and version checks.
#[derive(Clone)]
pub struct ApplyNodeUpdateOperation {
    store: FleetStore,
}

#[derive(Debug, Clone)]
pub struct ApplyNodeUpdateOperationRequest {
    pub uuid: NodeUuid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyNodeUpdateOperationOutcome {
    Applied {
        artifact: String,
        previous_version: String,
        version: String,
    },
    /// Nothing in the channel targets this node's hardware.
    NoOp,
    AlreadyCurrent {
        version: String,
    },
}

impl ApplyNodeUpdateOperationOutcome {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Applied { .. } => 200,
            Self::NoOp | Self::AlreadyCurrent { .. } => 204,
        }
    }
}

impl ApplyNodeUpdateOperation {
    pub fn new(store: FleetStore) -> Self {
        Self { store }
    }

    pub async fn run(
        &self,
        request: ApplyNodeUpdateOperationRequest,
    ) -> Result<ApplyNodeUpdateOperationOutcome> {
        let ApplyNodeUpdateOperationRequest { uuid } = request;

        let mut state = self.store.write().await;
        let FleetState {
            registry, channels, ..
        } = &mut *state;

        let node = registry
            .get_node_mut(&uuid)
            .ok_or_else(|| FwError::NodeNotFound(uuid.to_string()))?;
        let channel = node.ota_channel();
        let hardware_type = node.hardware_type().to_string();

        let Some(selected) = channels.latest_matching(&channel, |candidate| {
            artifact::targets(candidate, &hardware_type)
        }) else {
            tracing::debug!("No eligible artifact in {} for node {}", channel, uuid);
            return Ok(ApplyNodeUpdateOperationOutcome::NoOp);
        };
        let selected = selected.to_string();

        let version = artifact::validate(&selected, &hardware_type).map_err(|reason| {
            tracing::warn!("Rejected artifact {} for node {}: {}", selected, uuid, reason);
            FwError::invalid_artifact(selected.clone(), reason)
        })?;

        if version == node.version() {
            tracing::debug!("Node {} already at version {}", uuid, version);
            return Ok(ApplyNodeUpdateOperationOutcome::AlreadyCurrent { version });
        }

        let previous_version = node.version().to_string();
        node.set_version(version.clone());

        tracing::info!(
            "OTA applied node={} artifact={} version {} -> {}",
            uuid,
            selected,
            previous_version,
            version
        );

        Ok(ApplyNodeUpdateOperationOutcome::Applied {
            artifact: selected,
            previous_version,
            version,
        })
    }
}

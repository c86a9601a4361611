use crate::{ChannelName, FleetState, FleetStore, FwError, Result, artifact};

/// Publishes artifacts to, and withdraws them from, node OTA channels.
#[derive(Clone)]
pub struct ChannelArtifactOperation {
    store: FleetStore,
}

#[derive(Debug, Clone)]
pub struct PublishArtifactOperationRequest {
    pub channel: ChannelName,
    pub artifact: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishArtifactOperationOutcome {
    Published,
    AlreadyPublished,
}

impl PublishArtifactOperationOutcome {
    pub fn status_code(&self) -> u16 {
        200
    }
}

#[derive(Debug, Clone)]
pub struct WithdrawArtifactOperationRequest {
    pub channel: ChannelName,
    pub artifact: String,
}

impl ChannelArtifactOperation {
    pub fn new(store: FleetStore) -> Self {
        Self { store }
    }

    /// The artifact must address the owning node's hardware and end in `.swu`.
    /// An empty version is only rejected when the node update is applied.
    pub async fn run_publish(
        &self,
        request: PublishArtifactOperationRequest,
    ) -> Result<PublishArtifactOperationOutcome> {
        let PublishArtifactOperationRequest { channel, artifact } = request;

        let mut state = self.store.write().await;
        let FleetState {
            registry, channels, ..
        } = &mut *state;

        let node = registry
            .find_node_by_channel(&channel)
            .ok_or_else(|| FwError::ChannelNotFound(channel.to_string()))?;

        if let Err(reason) = artifact::check_target(&artifact, node.hardware_type()) {
            tracing::warn!("Refused to publish {} to {}: {}", artifact, channel, reason);
            return Err(FwError::invalid_artifact(artifact, reason));
        }

        if !channels.publish(&channel, &artifact) {
            tracing::debug!("Artifact {} already published to {}", artifact, channel);
            return Ok(PublishArtifactOperationOutcome::AlreadyPublished);
        }

        tracing::info!("Published {} to {}", artifact, channel);
        Ok(PublishArtifactOperationOutcome::Published)
    }

    pub async fn run_withdraw(&self, request: WithdrawArtifactOperationRequest) -> Result<()> {
        let WithdrawArtifactOperationRequest { channel, artifact } = request;

        let mut state = self.store.write().await;
        state.channels.withdraw(&channel, &artifact)?;

        tracing::info!("Withdrew {} from {}", artifact, channel);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ArtifactError, TopologyBuilder};

    const CHANNEL: &str = "OTA_AHN2_ABCDEF000001";

    fn operation() -> (ChannelArtifactOperation, FleetStore) {
        let store = FleetStore::new(TopologyBuilder::new().sample(true).build().unwrap());
        (ChannelArtifactOperation::new(store.clone()), store)
    }

    fn publish(channel: &str, artifact: &str) -> PublishArtifactOperationRequest {
        PublishArtifactOperationRequest {
            channel: ChannelName::from(channel),
            artifact: artifact.to_string(),
        }
    }

    fn withdraw(channel: &str, artifact: &str) -> WithdrawArtifactOperationRequest {
        WithdrawArtifactOperationRequest {
            channel: ChannelName::from(channel),
            artifact: artifact.to_string(),
        }
    }

    #[tokio::test]
    async fn test_publish_and_republish() {
        let (operation, store) = operation();

        let outcome = operation.run_publish(publish(CHANNEL, "AHN2_40.swu")).await.unwrap();
        assert_eq!(outcome, PublishArtifactOperationOutcome::Published);

        let outcome = operation.run_publish(publish(CHANNEL, "AHN2_40.swu")).await.unwrap();
        assert_eq!(outcome, PublishArtifactOperationOutcome::AlreadyPublished);
        assert_eq!(outcome.status_code(), 200);

        let state = store.read().await;
        assert_eq!(
            state.channels.list(&ChannelName::from(CHANNEL)).unwrap(),
            &["AHN2_40.swu".to_string()]
        );
    }

    #[tokio::test]
    async fn test_publish_rejections() {
        let (operation, _) = operation();

        let err = operation
            .run_publish(publish("OTA_UNKNOWN", "ahn2_40.swu"))
            .await
            .unwrap_err();
        assert!(matches!(err, FwError::ChannelNotFound(_)));

        let err = operation
            .run_publish(publish(CHANNEL, "moxa_40.swu"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FwError::InvalidArtifact {
                reason: ArtifactError::PrefixMismatch { .. },
                ..
            }
        ));

        let err = operation
            .run_publish(publish(CHANNEL, "ahn2_40.bin"))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_withdraw() {
        let (operation, _) = operation();
        operation.run_publish(publish(CHANNEL, "ahn2_40.swu")).await.unwrap();

        let err = operation
            .run_withdraw(withdraw(CHANNEL, "ahn2_41.swu"))
            .await
            .unwrap_err();
        assert!(matches!(err, FwError::ArtifactNotInChannel { .. }));

        operation.run_withdraw(withdraw(CHANNEL, "ahn2_40.swu")).await.unwrap();

        let err = operation
            .run_withdraw(withdraw(CHANNEL, "ahn2_40.swu"))
            .await
            .unwrap_err();
        assert!(matches!(err, FwError::ChannelNotFound(_)));
    }
}

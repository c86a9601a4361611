use crate::operations::{
    ApplyNodeUpdateOperation, ApplyNodeUpdateOperationOutcome, ApplyNodeUpdateOperationRequest,
    ApplyPendingDfuOperation, ApplyPendingDfuOperationOutcome, ApplyPendingDfuOperationRequest,
    ChannelArtifactOperation, EndpointGaugeOperation, EndpointGaugeOperationRequest,
    EndpointGaugeOperationResult, PublishArtifactOperationOutcome, PublishArtifactOperationRequest,
    RequestDfuOperation, RequestDfuOperationOutcome, RequestDfuOperationRequest,
    WithdrawArtifactOperationRequest,
};
use crate::query::{EndpointView, FleetQuery, NodeView};
use crate::{ChannelName, FleetState, FleetStore, NodeUuid, Result, SerialNumber};

/// Entry point for a request layer: the fleet tables plus every operation on them.
///
/// Each instance owns its own tables; clones share them.
#[derive(Clone)]
pub struct Fleet {
    store: FleetStore,
    query: FleetQuery,
    channel_artifact: ChannelArtifactOperation,
    apply_node_update: ApplyNodeUpdateOperation,
    request_dfu: RequestDfuOperation,
    apply_pending_dfu: ApplyPendingDfuOperation,
    endpoint_gauge: EndpointGaugeOperation,
}

impl Fleet {
    pub fn new(state: FleetState) -> Self {
        let store = FleetStore::new(state);
        Self {
            query: FleetQuery::new(store.clone()),
            channel_artifact: ChannelArtifactOperation::new(store.clone()),
            apply_node_update: ApplyNodeUpdateOperation::new(store.clone()),
            request_dfu: RequestDfuOperation::new(store.clone()),
            apply_pending_dfu: ApplyPendingDfuOperation::new(store.clone()),
            endpoint_gauge: EndpointGaugeOperation::new(store.clone()),
            store,
        }
    }

    pub fn store(&self) -> &FleetStore {
        &self.store
    }

    pub fn query(&self) -> &FleetQuery {
        &self.query
    }

    pub async fn publish_artifact(
        &self,
        channel: impl Into<ChannelName>,
        artifact: impl Into<String>,
    ) -> Result<PublishArtifactOperationOutcome> {
        self.channel_artifact
            .run_publish(PublishArtifactOperationRequest {
                channel: channel.into(),
                artifact: artifact.into(),
            })
            .await
    }

    pub async fn withdraw_artifact(
        &self,
        channel: impl Into<ChannelName>,
        artifact: impl Into<String>,
    ) -> Result<()> {
        self.channel_artifact
            .run_withdraw(WithdrawArtifactOperationRequest {
                channel: channel.into(),
                artifact: artifact.into(),
            })
            .await
    }

    pub async fn apply_node_update(
        &self,
        uuid: impl Into<NodeUuid>,
    ) -> Result<ApplyNodeUpdateOperationOutcome> {
        self.apply_node_update
            .run(ApplyNodeUpdateOperationRequest { uuid: uuid.into() })
            .await
    }

    pub async fn request_dfu(
        &self,
        serial: impl Into<SerialNumber>,
        artifact: impl Into<String>,
    ) -> Result<RequestDfuOperationOutcome> {
        self.request_dfu
            .run(RequestDfuOperationRequest {
                serial: serial.into(),
                artifact: artifact.into(),
            })
            .await
    }

    pub async fn try_apply_pending(
        &self,
        serial: impl Into<SerialNumber>,
    ) -> Result<ApplyPendingDfuOperationOutcome> {
        self.apply_pending_dfu
            .run(ApplyPendingDfuOperationRequest {
                serial: serial.into(),
            })
            .await
    }

    pub async fn set_endpoint_battery(
        &self,
        serial: impl Into<SerialNumber>,
        battery_ma: u32,
    ) -> Result<EndpointGaugeOperationResult> {
        self.endpoint_gauge
            .run(EndpointGaugeOperationRequest {
                serial: serial.into(),
                battery_ma: Some(battery_ma),
                backlog: None,
            })
            .await
    }

    pub async fn set_endpoint_backlog(
        &self,
        serial: impl Into<SerialNumber>,
        backlog: u32,
    ) -> Result<EndpointGaugeOperationResult> {
        self.endpoint_gauge
            .run(EndpointGaugeOperationRequest {
                serial: serial.into(),
                battery_ma: None,
                backlog: Some(backlog),
            })
            .await
    }

    pub async fn get_node(&self, uuid: impl Into<NodeUuid>) -> Option<NodeView> {
        self.query.node(&uuid.into()).await
    }

    pub async fn get_endpoint(&self, serial: impl Into<SerialNumber>) -> Option<EndpointView> {
        self.query.endpoint(&serial.into()).await
    }
}

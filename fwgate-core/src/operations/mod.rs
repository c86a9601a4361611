pub mod apply_node_update;
pub mod apply_pending_dfu;
pub mod channel_artifact;
pub mod endpoint_gauge;
pub mod request_dfu;

pub use apply_node_update::{
    ApplyNodeUpdateOperation, ApplyNodeUpdateOperationOutcome, ApplyNodeUpdateOperationRequest,
};
pub use apply_pending_dfu::{
    ApplyPendingDfuOperation, ApplyPendingDfuOperationOutcome, ApplyPendingDfuOperationRequest,
};
pub use channel_artifact::{
    ChannelArtifactOperation, PublishArtifactOperationOutcome, PublishArtifactOperationRequest,
    WithdrawArtifactOperationRequest,
};
pub use endpoint_gauge::{
    EndpointGaugeOperation, EndpointGaugeOperationRequest, EndpointGaugeOperationResult,
};
pub use request_dfu::{RequestDfuOperation, RequestDfuOperationOutcome, RequestDfuOperationRequest};

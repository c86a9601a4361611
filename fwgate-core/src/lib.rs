//! Fwgate Core - firmware update gating for gateway fleets
//!
//! Tracks gateway nodes and their battery powered endpoints, the per-node OTA
//! channels that artifacts are published to, and the policy that decides
//! whether an update is applied now, deferred, or rejected:
//! - node OTA updates take the last published artifact for the node's hardware
//! - endpoint DFU updates are gated on backlog and battery level
//! - at most one deferred DFU per endpoint, retried only on request

pub mod artifact;
pub mod error;
pub mod fleet;
pub mod operations;
pub mod policy;
pub mod query;
pub mod registry;
pub mod state;
pub mod storage;
pub mod types;

pub use artifact::{ArtifactError, ArtifactName};
pub use error::{FwError, Result};
pub use fleet::Fleet;
pub use operations::{
    ApplyNodeUpdateOperation, ApplyNodeUpdateOperationOutcome, ApplyNodeUpdateOperationRequest,
    ApplyPendingDfuOperation, ApplyPendingDfuOperationOutcome, ApplyPendingDfuOperationRequest,
    ChannelArtifactOperation, EndpointGaugeOperation, EndpointGaugeOperationRequest,
    EndpointGaugeOperationResult, PublishArtifactOperationOutcome, PublishArtifactOperationRequest,
    RequestDfuOperation, RequestDfuOperationOutcome, RequestDfuOperationRequest,
    WithdrawArtifactOperationRequest,
};
pub use policy::{GateBlock, GateStatus, evaluate_gate};
pub use query::{EndpointView, FleetQuery, NodeView};
pub use registry::{
    DeviceRegistry, Endpoint, EndpointSpec, Node, NodeSpec, TopologyBuilder, sample_topology,
};
pub use state::{FleetState, FleetStore};
pub use storage::{ChannelStore, PendingDfuStore};
pub use types::{ChannelName, EpType, NodeUuid, SerialNumber};

//! Read-only projections of fleet state.
//!
//! Lookups of a single entity return `None` for an unknown key. Collection
//! lookups return `Err(..NotFound)` for an unknown key so an empty result is
//! never mistaken for a missing one.

use crate::{
    ChannelName, EpType, FleetState, FleetStore, FwError, NodeUuid, Result, SerialNumber,
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeView {
    pub uuid: NodeUuid,
    pub name: String,
    pub hardware_type: String,
    pub ota_channel: ChannelName,
    pub version: String,
    pub api_address: Option<String>,
    pub endpoints: Vec<SerialNumber>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointView {
    pub serial_number: SerialNumber,
    pub ep_type: EpType,
    pub battery_ma: u32,
    pub backlog: u32,
    pub hardware_type: String,
    /// Owning node, resolved by scanning node endpoint lists.
    pub uuid: Option<NodeUuid>,
    pub version: String,
    pub pending_artifact: Option<String>,
}

#[derive(Clone)]
pub struct FleetQuery {
    store: FleetStore,
}

impl FleetQuery {
    pub fn new(store: FleetStore) -> Self {
        Self { store }
    }

    pub async fn node(&self, uuid: &NodeUuid) -> Option<NodeView> {
        let state = self.store.read().await;
        node_view(&state, uuid)
    }

    pub async fn endpoint(&self, serial: &SerialNumber) -> Option<EndpointView> {
        let state = self.store.read().await;
        endpoint_view(&state, serial)
    }

    pub async fn node_version(&self, uuid: &NodeUuid) -> Option<String> {
        let state = self.store.read().await;
        state
            .registry
            .get_node(uuid)
            .map(|node| node.version().to_string())
    }

    pub async fn endpoint_version(&self, serial: &SerialNumber) -> Option<String> {
        let state = self.store.read().await;
        state
            .registry
            .get_endpoint(serial)
            .map(|endpoint| endpoint.version().to_string())
    }

    pub async fn channel(&self, channel: &ChannelName) -> Result<Vec<String>> {
        let state = self.store.read().await;
        state
            .channels
            .list(channel)
            .map(<[String]>::to_vec)
            .ok_or_else(|| FwError::ChannelNotFound(channel.to_string()))
    }

    pub async fn pending_dfu(&self, serial: &SerialNumber) -> Result<Option<String>> {
        let state = self.store.read().await;
        if state.registry.get_endpoint(serial).is_none() {
            return Err(FwError::EndpointNotFound(serial.to_string()));
        }
        Ok(state.pending.get(serial).map(str::to_string))
    }
}

fn node_view(state: &FleetState, uuid: &NodeUuid) -> Option<NodeView> {
    let node = state.registry.get_node(uuid)?;
    Some(NodeView {
        uuid: node.uuid().clone(),
        name: node.name().to_string(),
        hardware_type: node.hardware_type().to_string(),
        ota_channel: node.ota_channel(),
        version: node.version().to_string(),
        api_address: node.api_address().map(str::to_string),
        endpoints: node.endpoints().to_vec(),
    })
}

fn endpoint_view(state: &FleetState, serial: &SerialNumber) -> Option<EndpointView> {
    let endpoint = state.registry.get_endpoint(serial)?;
    Some(EndpointView {
        serial_number: endpoint.serial_number().clone(),
        ep_type: endpoint.ep_type(),
        battery_ma: endpoint.battery_ma(),
        backlog: endpoint.backlog(),
        hardware_type: endpoint.hardware_type().to_string(),
        uuid: state.registry.find_owner(serial).cloned(),
        version: endpoint.version().to_string(),
        pending_artifact: state.pending.get(serial).map(str::to_string),
    })
}

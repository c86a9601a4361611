//! Device registry: nodes, their endpoints, and lookups by key.
//!
//! Pure storage. Uniqueness of uuid and serial number is the only rule enforced
//! here; update policy lives in `operations`.

mod factory;
mod model;

pub use factory::{TopologyBuilder, sample_topology};
pub use model::{Endpoint, EndpointSpec, Node, NodeSpec};

use crate::{ChannelName, FwError, NodeUuid, Result, SerialNumber};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct DeviceRegistry {
    nodes: HashMap<NodeUuid, Node>,
    node_order: Vec<NodeUuid>,
    endpoints: HashMap<SerialNumber, Endpoint>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_node(&mut self, node: Node) -> Result<()> {
        if self.nodes.contains_key(node.uuid()) {
            return Err(FwError::DuplicateNode(node.uuid().to_string()));
        }

        let uuid = node.uuid().clone();
        self.node_order.push(uuid.clone());
        self.nodes.insert(uuid, node);
        Ok(())
    }

    /// Attaches a new endpoint to `uuid`. The endpoint inherits the node's hardware type.
    pub fn attach_endpoint(&mut self, uuid: &NodeUuid, spec: EndpointSpec) -> Result<()> {
        if self.endpoints.contains_key(&spec.serial_number) {
            return Err(FwError::DuplicateEndpoint(spec.serial_number.to_string()));
        }

        let node = self
            .nodes
            .get_mut(uuid)
            .ok_or_else(|| FwError::NodeNotFound(uuid.to_string()))?;

        let endpoint = spec.into_endpoint(node.hardware_type());
        let serial = endpoint.serial_number().clone();
        node.push_endpoint(serial.clone());
        self.endpoints.insert(serial, endpoint);
        Ok(())
    }

    pub fn get_node(&self, uuid: &NodeUuid) -> Option<&Node> {
        self.nodes.get(uuid)
    }

    pub fn get_endpoint(&self, serial: &SerialNumber) -> Option<&Endpoint> {
        self.endpoints.get(serial)
    }

    pub(crate) fn get_node_mut(&mut self, uuid: &NodeUuid) -> Option<&mut Node> {
        self.nodes.get_mut(uuid)
    }

    pub(crate) fn get_endpoint_mut(&mut self, serial: &SerialNumber) -> Option<&mut Endpoint> {
        self.endpoints.get_mut(serial)
    }

    /// Linear scan over every node's endpoint list.
    pub fn find_owner(&self, serial: &SerialNumber) -> Option<&NodeUuid> {
        self.nodes()
            .find(|node| node.owns(serial))
            .map(|node| node.uuid())
    }

    pub fn find_node_by_channel(&self, channel: &ChannelName) -> Option<&Node> {
        self.nodes().find(|node| &node.ota_channel() == channel)
    }

    /// Nodes in registration order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.node_order.iter().filter_map(|uuid| self.nodes.get(uuid))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn endpoint_count(&self) -> usize {
        self.endpoints.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EpType;

    fn registry_with_moxa() -> DeviceRegistry {
        let mut registry = DeviceRegistry::new();
        registry
            .register_node(Node::new("Moxa", "MOXA_1", "moxa", "33"))
            .unwrap();
        registry
            .attach_endpoint(
                &NodeUuid::from("MOXA_1"),
                EndpointSpec::new(EpType::Ep1, "MOXA_1_EP1_SN", "10", 3000),
            )
            .unwrap();
        registry
            .attach_endpoint(
                &NodeUuid::from("MOXA_1"),
                EndpointSpec::new(EpType::Ep2, "MOXA_1_EP2_SN", "10", 2600),
            )
            .unwrap();
        registry
    }

    #[test]
    fn test_attach_preserves_order_and_owner() {
        let registry = registry_with_moxa();
        let node = registry.get_node(&NodeUuid::from("MOXA_1")).unwrap();
        let serials: Vec<&str> = node.endpoints().iter().map(|s| s.as_str()).collect();
        assert_eq!(serials, vec!["MOXA_1_EP1_SN", "MOXA_1_EP2_SN"]);

        let serial = SerialNumber::from("MOXA_1_EP2_SN");
        assert_eq!(registry.find_owner(&serial), Some(&NodeUuid::from("MOXA_1")));
        assert_eq!(registry.get_endpoint(&serial).unwrap().hardware_type(), "moxa");
        assert_eq!(registry.find_owner(&SerialNumber::from("nope")), None);
    }

    #[test]
    fn test_duplicates_are_rejected() {
        let mut registry = registry_with_moxa();
        let err = registry
            .register_node(Node::new("Moxa", "MOXA_1", "moxa", "1"))
            .unwrap_err();
        assert!(matches!(err, FwError::DuplicateNode(_)));

        let err = registry
            .attach_endpoint(
                &NodeUuid::from("MOXA_1"),
                EndpointSpec::new(EpType::Ep1, "MOXA_1_EP1_SN", "10", 3000),
            )
            .unwrap_err();
        assert!(matches!(err, FwError::DuplicateEndpoint(_)));
        assert_eq!(registry.endpoint_count(), 2);
    }

    #[test]
    fn test_attach_to_unknown_node() {
        let mut registry = DeviceRegistry::new();
        let err = registry
            .attach_endpoint(
                &NodeUuid::from("missing"),
                EndpointSpec::new(EpType::Ep1, "SN", "10", 3000),
            )
            .unwrap_err();
        assert!(matches!(err, FwError::NodeNotFound(_)));
    }

    #[test]
    fn test_find_node_by_channel() {
        let registry = registry_with_moxa();
        let node = registry
            .find_node_by_channel(&ChannelName::from("OTA_MOXA_1"))
            .unwrap();
        assert_eq!(node.name(), "Moxa");
        assert!(registry
            .find_node_by_channel(&ChannelName::from("OTA_OTHER"))
            .is_none());
    }
}

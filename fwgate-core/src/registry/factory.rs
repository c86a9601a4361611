use super::{DeviceRegistry, EndpointSpec, Node, NodeSpec};
use crate::{ChannelStore, EpType, FleetState, FwError, PendingDfuStore, Result};

#[derive(Debug, Clone, Default)]
pub struct TopologyBuilder {
    include_sample: bool,
    nodes: Vec<NodeSpec>,
}

impl TopologyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the registry with the built-in demo fleet before any explicit nodes.
    pub fn sample(mut self, include_sample: bool) -> Self {
        self.include_sample = include_sample;
        self
    }

    pub fn node(mut self, node: NodeSpec) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn nodes(mut self, nodes: impl IntoIterator<Item = NodeSpec>) -> Self {
        self.nodes.extend(nodes);
        self
    }

    fn resolve_nodes(&self) -> Result<Vec<NodeSpec>> {
        let mut resolved = if self.include_sample {
            sample_topology()
        } else {
            Vec::new()
        };

        for node in &self.nodes {
            let mut node = node.clone();
            node.name = require("node name", &node.name)?;
            node.uuid = require("node uuid", node.uuid.as_str())?.into();
            node.hardware_type = require("node hardware_type", &node.hardware_type)?;
            node.version = require("node version", &node.version)?;

            for endpoint in &mut node.endpoints {
                endpoint.serial_number =
                    require("endpoint serial_number", endpoint.serial_number.as_str())?.into();
                endpoint.version = require("endpoint version", &endpoint.version)?;
            }

            resolved.push(node);
        }

        Ok(resolved)
    }

    /// Builds fresh fleet tables: one empty channel per node, no pending updates.
    pub fn build(&self) -> Result<FleetState> {
        let nodes = self.resolve_nodes()?;

        let mut registry = DeviceRegistry::new();
        let mut channels = ChannelStore::new();

        for spec in nodes {
            let NodeSpec {
                name,
                uuid,
                hardware_type,
                version,
                endpoints,
            } = spec;

            let node = Node::new(name, uuid.clone(), hardware_type, version);
            channels.create(node.ota_channel());
            registry.register_node(node)?;

            for endpoint in endpoints {
                registry.attach_endpoint(&uuid, endpoint)?;
            }
        }

        tracing::info!(
            "Registered {} nodes with {} endpoints",
            registry.node_count(),
            registry.endpoint_count()
        );

        Ok(FleetState {
            registry,
            channels,
            pending: PendingDfuStore::new(),
        })
    }
}

fn require(field: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(FwError::Config(format!("{} cannot be empty", field)));
    }
    Ok(value.to_string())
}

/// The demo fleet: three gateways, each with an EP1, an EP2 and a canary endpoint.
pub fn sample_topology() -> Vec<NodeSpec> {
    [
        ("AHN2", "ahn2", "AHN2_ABCDEF000001"),
        ("Cassia", "cassia", "CASSIA_ABCDEF000002"),
        ("Moxa", "moxa", "MOXA_TBCDB1045001"),
    ]
    .into_iter()
    .map(|(name, hardware_type, uuid)| {
        NodeSpec::new(name, uuid, hardware_type, "33")
            .endpoint(EndpointSpec::new(EpType::Ep1, format!("{}_EP1_SN", uuid), "10", 3000))
            .endpoint(EndpointSpec::new(EpType::Ep2, format!("{}_EP2_SN", uuid), "10", 2600))
            .endpoint(EndpointSpec::new(
                EpType::CanaryA,
                format!("{}_CANARY_SN", uuid),
                "10",
                3800,
            ))
    })
    .collect()
}

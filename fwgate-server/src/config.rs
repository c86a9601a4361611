use fwgate_core::{EndpointSpec, EpType, FleetState, FwError, NodeSpec, Result, TopologyBuilder};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default)]
    pub topology: TopologyConfig,
}

fn default_bind_addr() -> String {
    "127.0.0.1:8080".to_string()
}

/// Fleet loaded at startup; nothing is persisted across restarts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopologyConfig {
    /// Load the built-in demo fleet before `nodes`.
    #[serde(default)]
    pub sample: bool,
    #[serde(default)]
    pub nodes: Vec<NodeConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub name: String,
    pub uuid: String,
    pub hardware_type: String,
    pub version: String,
    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub ep_type: String,
    pub serial_number: String,
    pub version: String,
    pub battery_ma: u32,
    #[serde(default)]
    pub backlog: u32,
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::with_name(path))
            .add_source(::config::Environment::with_prefix("FWGATE"))
            .build()
            .map_err(|e| FwError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| FwError::Config(e.to_string()))?;

        Ok(config)
    }

    pub fn node_specs(&self) -> Result<Vec<NodeSpec>> {
        self.topology
            .nodes
            .iter()
            .map(|node| {
                let endpoints = node
                    .endpoints
                    .iter()
                    .map(|endpoint| {
                        let ep_type = endpoint
                            .ep_type
                            .trim()
                            .parse::<EpType>()
                            .map_err(FwError::Config)?;
                        Ok(EndpointSpec::new(
                            ep_type,
                            endpoint.serial_number.as_str(),
                            endpoint.version.as_str(),
                            endpoint.battery_ma,
                        )
                        .with_backlog(endpoint.backlog))
                    })
                    .collect::<Result<Vec<_>>>()?;

                let mut spec = NodeSpec::new(
                    node.name.as_str(),
                    node.uuid.as_str(),
                    node.hardware_type.as_str(),
                    node.version.as_str(),
                );
                spec.endpoints = endpoints;
                Ok(spec)
            })
            .collect()
    }

    pub fn fleet_state(&self) -> Result<FleetState> {
        if !self.topology.sample && self.topology.nodes.is_empty() {
            tracing::warn!("Topology is empty: no sample fleet and no configured nodes");
        }

        TopologyBuilder::new()
            .sample(self.topology.sample)
            .nodes(self.node_specs()?)
            .build()
    }
}

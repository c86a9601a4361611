use crate::{ChannelName, EpType, NodeUuid, SerialNumber};
use serde::{Deserialize, Serialize};

/// Node name to API address mapping for the known gateway families.
const API_ADDRESS_BY_NODE: &[(&str, &str)] = &[
    ("AHN2", "buildroot_api.azure"),
    ("Cassia", "buildroot_api.azure"),
    ("Moxa", "moxa_api.azure"),
];

/// A gateway device owning an ordered list of endpoints.
#[derive(Debug, Clone)]
pub struct Node {
    uuid: NodeUuid,
    name: String,
    hardware_type: String,
    version: String,
    endpoints: Vec<SerialNumber>,
}

impl Node {
    pub fn new(
        name: impl Into<String>,
        uuid: impl Into<NodeUuid>,
        hardware_type: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            uuid: uuid.into(),
            name: name.into(),
            hardware_type: hardware_type.into(),
            version: version.into(),
            endpoints: Vec::new(),
        }
    }

    pub fn uuid(&self) -> &NodeUuid {
        &self.uuid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hardware_type(&self) -> &str {
        &self.hardware_type
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Serial numbers in attachment order.
    pub fn endpoints(&self) -> &[SerialNumber] {
        &self.endpoints
    }

    pub fn ota_channel(&self) -> ChannelName {
        ChannelName::ota_for(&self.uuid)
    }

    pub fn api_address(&self) -> Option<&'static str> {
        API_ADDRESS_BY_NODE
            .iter()
            .find(|(name, _)| *name == self.name)
            .map(|(_, address)| *address)
    }

    pub fn owns(&self, serial: &SerialNumber) -> bool {
        self.endpoints.iter().any(|owned| owned == serial)
    }

    pub(crate) fn set_version(&mut self, version: impl Into<String>) {
        self.version = version.into();
    }

    pub(crate) fn push_endpoint(&mut self, serial: SerialNumber) {
        self.endpoints.push(serial);
    }
}

/// A battery powered sensor attached to exactly one node.
#[derive(Debug, Clone)]
pub struct Endpoint {
    serial_number: SerialNumber,
    ep_type: EpType,
    hardware_type: String,
    version: String,
    battery_ma: u32,
    backlog: u32,
}

impl Endpoint {
    pub fn serial_number(&self) -> &SerialNumber {
        &self.serial_number
    }

    pub fn ep_type(&self) -> EpType {
        self.ep_type
    }

    pub fn hardware_type(&self) -> &str {
        &self.hardware_type
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn battery_ma(&self) -> u32 {
        self.battery_ma
    }

    pub fn backlog(&self) -> u32 {
        self.backlog
    }

    pub fn battery_threshold(&self) -> u32 {
        self.ep_type.battery_threshold()
    }

    pub fn is_battery_low(&self) -> bool {
        self.battery_ma < self.battery_threshold()
    }

    pub(crate) fn set_version(&mut self, version: impl Into<String>) {
        self.version = version.into();
    }

    pub(crate) fn set_battery_ma(&mut self, battery_ma: u32) {
        self.battery_ma = battery_ma;
    }

    pub(crate) fn set_backlog(&mut self, backlog: u32) {
        self.backlog = backlog;
    }
}

/// Description of an endpoint to attach; the hardware type comes from the owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointSpec {
    pub ep_type: EpType,
    pub serial_number: SerialNumber,
    pub version: String,
    pub battery_ma: u32,
    #[serde(default)]
    pub backlog: u32,
}

impl EndpointSpec {
    pub fn new(
        ep_type: EpType,
        serial_number: impl Into<SerialNumber>,
        version: impl Into<String>,
        battery_ma: u32,
    ) -> Self {
        Self {
            ep_type,
            serial_number: serial_number.into(),
            version: version.into(),
            battery_ma,
            backlog: 0,
        }
    }

    pub fn with_backlog(mut self, backlog: u32) -> Self {
        self.backlog = backlog;
        self
    }

    pub(crate) fn into_endpoint(self, hardware_type: &str) -> Endpoint {
        Endpoint {
            serial_number: self.serial_number,
            ep_type: self.ep_type,
            hardware_type: hardware_type.to_string(),
            version: self.version,
            battery_ma: self.battery_ma,
            backlog: self.backlog,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSpec {
    pub name: String,
    pub uuid: NodeUuid,
    pub hardware_type: String,
    pub version: String,
    #[serde(default)]
    pub endpoints: Vec<EndpointSpec>,
}

impl NodeSpec {
    pub fn new(
        name: impl Into<String>,
        uuid: impl Into<NodeUuid>,
        hardware_type: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            uuid: uuid.into(),
            hardware_type: hardware_type.into(),
            version: version.into(),
            endpoints: Vec::new(),
        }
    }

    pub fn endpoint(mut self, endpoint: EndpointSpec) -> Self {
        self.endpoints.push(endpoint);
        self
    }
}

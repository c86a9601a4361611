use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt;
use std::str::FromStr;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(SmolStr);

        impl $name {
            pub fn new(value: impl AsRef<str>) -> Self {
                Self(SmolStr::new(value.as_ref()))
            }

            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }
    };
}

string_id!(
    /// Immutable identity of a gateway node.
    NodeUuid
);
string_id!(
    /// Fleet-wide unique serial number of an endpoint.
    SerialNumber
);
string_id!(
    /// Name of a node's update feed.
    ChannelName
);

impl ChannelName {
    pub const OTA_PREFIX: &'static str = "OTA_";

    pub fn ota_for(uuid: &NodeUuid) -> Self {
        Self::new(format!("{}{}", Self::OTA_PREFIX, uuid))
    }
}

/// Endpoint model; fixes the battery threshold used by the DFU gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EpType {
    #[serde(rename = "EP1")]
    Ep1,
    #[serde(rename = "EP2")]
    Ep2,
    #[serde(rename = "Canary_A")]
    CanaryA,
}

impl EpType {
    /// Minimum battery level in mA; anything strictly below blocks a DFU.
    pub fn battery_threshold(self) -> u32 {
        match self {
            Self::Ep1 => 2500,
            Self::Ep2 => 2500,
            Self::CanaryA => 3600,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ep1 => "EP1",
            Self::Ep2 => "EP2",
            Self::CanaryA => "Canary_A",
        }
    }
}

impl fmt::Display for EpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EpType {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value {
            "EP1" => Ok(Self::Ep1),
            "EP2" => Ok(Self::Ep2),
            "Canary_A" => Ok(Self::CanaryA),
            other => Err(format!(
                "unsupported endpoint type '{}': expected EP1 | EP2 | Canary_A",
                other
            )),
        }
    }
}

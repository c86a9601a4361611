//! DFU gate: an endpoint only takes an update with no pending work and enough battery.

use crate::Endpoint;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum GateBlock {
    Backlog { backlog: u32 },
    LowBattery { battery_ma: u32, threshold_ma: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateStatus {
    Open,
    Blocked(GateBlock),
}

impl GateStatus {
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked(_))
    }
}

pub fn evaluate_gate(endpoint: &Endpoint) -> GateStatus {
    if endpoint.backlog() > 0 {
        return GateStatus::Blocked(GateBlock::Backlog {
            backlog: endpoint.backlog(),
        });
    }

    if endpoint.is_battery_low() {
        return GateStatus::Blocked(GateBlock::LowBattery {
            battery_ma: endpoint.battery_ma(),
            threshold_ma: endpoint.battery_threshold(),
        });
    }

    GateStatus::Open
}

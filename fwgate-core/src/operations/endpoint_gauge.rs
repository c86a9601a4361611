use crate::policy::{GateStatus, evaluate_gate};
use crate::{FleetStore, FwError, Result, SerialNumber};

/// Records battery and backlog readings. Never applies a pending DFU on its own.
#[derive(Clone)]
pub struct EndpointGaugeOperation {
    store: FleetStore,
}

#[derive(Debug, Clone, Default)]
pub struct EndpointGaugeOperationRequest {
    pub serial: SerialNumber,
    pub battery_ma: Option<u32>,
    pub backlog: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointGaugeOperationResult {
    pub battery_ma: u32,
    pub backlog: u32,
    pub gate: GateStatus,
}

impl EndpointGaugeOperation {
    pub fn new(store: FleetStore) -> Self {
        Self { store }
    }

    pub async fn run(&self, request: EndpointGaugeOperationRequest) -> Result<EndpointGaugeOperationResult> {
        let EndpointGaugeOperationRequest {
            serial,
            battery_ma,
            backlog,
        } = request;

        let mut state = self.store.write().await;
        let endpoint = state
            .registry
            .get_endpoint_mut(&serial)
            .ok_or_else(|| FwError::EndpointNotFound(serial.to_string()))?;

        if let Some(battery_ma) = battery_ma {
            endpoint.set_battery_ma(battery_ma);
        }
        if let Some(backlog) = backlog {
            endpoint.set_backlog(backlog);
        }

        let gate = evaluate_gate(endpoint);
        tracing::info!(
            "Gauge update endpoint={} battery_ma={} backlog={} gate={:?}",
            serial,
            endpoint.battery_ma(),
            endpoint.backlog(),
            gate
        );

        Ok(EndpointGaugeOperationResult {
            battery_ma: endpoint.battery_ma(),
            backlog: endpoint.backlog(),
            gate,
        })
    }
}

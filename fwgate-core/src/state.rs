use crate::{ChannelStore, DeviceRegistry, PendingDfuStore};
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Every table the update flows read or mutate.
#[derive(Debug, Default)]
pub struct FleetState {
    pub registry: DeviceRegistry,
    pub channels: ChannelStore,
    pub pending: PendingDfuStore,
}

/// Shared handle to the fleet tables behind a single readers-writer lock.
///
/// Mutating operations hold the write guard for their whole
/// read-evaluate-mutate sequence.
#[derive(Debug, Clone, Default)]
pub struct FleetStore {
    inner: Arc<RwLock<FleetState>>,
}

impl FleetStore {
    pub fn new(state: FleetState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(state)),
        }
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, FleetState> {
        self.inner.read().await
    }

    pub async fn write(&self) -> RwLockWriteGuard<'_, FleetState> {
        self.inner.write().await
    }
}

use crate::SerialNumber;
use std::collections::HashMap;

/// At most one deferred DFU artifact per endpoint. Newer requests replace older ones.
#[derive(Debug, Default)]
pub struct PendingDfuStore {
    slots: HashMap<SerialNumber, String>,
}

impl PendingDfuStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `artifact` for `serial`, returning the artifact it replaced.
    pub fn defer(&mut self, serial: SerialNumber, artifact: impl Into<String>) -> Option<String> {
        self.slots.insert(serial, artifact.into())
    }

    pub fn get(&self, serial: &SerialNumber) -> Option<&str> {
        self.slots.get(serial).map(String::as_str)
    }

    pub fn clear(&mut self, serial: &SerialNumber) -> Option<String> {
        self.slots.remove(serial)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

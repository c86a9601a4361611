use crate::{ChannelName, FwError, Result};
use std::collections::HashMap;

/// Per-node update feeds: ordered, de-duplicated artifact names.
#[derive(Debug, Default)]
pub struct ChannelStore {
    channels: HashMap<ChannelName, Vec<String>>,
}

impl ChannelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensures `channel` exists, leaving existing contents alone.
    pub fn create(&mut self, channel: ChannelName) {
        self.channels.entry(channel).or_default();
    }

    /// Appends `artifact` unless already present.
    /// Returns false when the artifact was already published.
    pub fn publish(&mut self, channel: &ChannelName, artifact: &str) -> bool {
        let artifacts = self.channels.entry(channel.clone()).or_default();
        if artifacts.iter().any(|existing| existing == artifact) {
            return false;
        }

        artifacts.push(artifact.to_string());
        true
    }

    pub fn withdraw(&mut self, channel: &ChannelName, artifact: &str) -> Result<()> {
        let artifacts = self
            .channels
            .get_mut(channel)
            .filter(|artifacts| !artifacts.is_empty())
            .ok_or_else(|| FwError::ChannelNotFound(channel.to_string()))?;

        let index = artifacts
            .iter()
            .position(|existing| existing == artifact)
            .ok_or_else(|| FwError::ArtifactNotInChannel {
                channel: channel.to_string(),
                artifact: artifact.to_string(),
            })?;

        artifacts.remove(index);
        Ok(())
    }

    /// Artifacts in publish order.
    pub fn list(&self, channel: &ChannelName) -> Option<&[String]> {
        self.channels.get(channel).map(Vec::as_slice)
    }

    /// Last published artifact accepted by `predicate`.
    pub fn latest_matching<F>(&self, channel: &ChannelName, predicate: F) -> Option<&str>
    where
        F: Fn(&str) -> bool,
    {
        self.channels
            .get(channel)?
            .iter()
            .rev()
            .find(|artifact| predicate(artifact.as_str()))
            .map(String::as_str)
    }
}

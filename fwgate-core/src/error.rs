use crate::artifact::ArtifactError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FwError {
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Endpoint not found: {0}")]
    EndpointNotFound(String),

    #[error("Channel not found: {0}")]
    ChannelNotFound(String),

    #[error("Artifact {artifact} not published in channel {channel}")]
    ArtifactNotInChannel { channel: String, artifact: String },

    #[error("Invalid artifact {artifact}: {reason}")]
    InvalidArtifact {
        artifact: String,
        reason: ArtifactError,
    },

    #[error("Duplicate node uuid: {0}")]
    DuplicateNode(String),

    #[error("Duplicate endpoint serial: {0}")]
    DuplicateEndpoint(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl FwError {
    pub fn invalid_artifact(artifact: impl Into<String>, reason: ArtifactError) -> Self {
        Self::InvalidArtifact {
            artifact: artifact.into(),
            reason,
        }
    }

    /// Status code reported to the request layer.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NodeNotFound(_)
            | Self::EndpointNotFound(_)
            | Self::ChannelNotFound(_)
            | Self::ArtifactNotInChannel { .. }
            | Self::InvalidArtifact { .. }
            | Self::DuplicateNode(_)
            | Self::DuplicateEndpoint(_) => 400,
            Self::Config(_) | Self::Io(_) | Self::Json(_) | Self::Internal(_) => 500,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NodeNotFound(_) | Self::EndpointNotFound(_) | Self::ChannelNotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, FwError>;

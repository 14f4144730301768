//! Error types for antgrid

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    #[error("failed to spawn agent {id}: {source}")]
    Spawn {
        id: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("agent {id} panicked: {message}")]
    AgentPanicked { id: usize, message: String },

    #[error("invalid grid layout: {0}")]
    InvalidLayout(String),

    #[error("config error: {0}")]
    ConfigError(String),

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid_params(reason: impl Into<String>) -> Self {
        Self::InvalidParams(reason.into())
    }

    pub fn agent_panicked(id: usize, message: impl Into<String>) -> Self {
        Self::AgentPanicked {
            id,
            message: message.into(),
        }
    }
}

use thiserror::Error;

use crate::core::types::{AgentId, BuildingId};
use crate::goods::GoodId;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Agent not found: {0}")]
    AgentNotFound(AgentId),

    #[error("Building not found: {0}")]
    BuildingNotFound(BuildingId),

    #[error("Unknown good: {0}")]
    UnknownGood(GoodId),

    #[error("Invalid good id: {0}")]
    InvalidGoodId(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;

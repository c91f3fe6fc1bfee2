//! Engine error types.

use std::path::PathBuf;
use thiserror::Error;

use raid_rules::{InstanceId, RulesError};

/// Errors returned by the battle engine's public API.
///
/// Gameplay failures (dead targets, cooldowns, missing mana) are not errors;
/// they come back as a failed [`crate::AbilityOutcome`].
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no character with instance id {0} in this battle")]
    UnknownCharacter(InstanceId),

    #[error("unknown ability '{0}'")]
    UnknownAbility(String),

    #[error("character {character} does not have ability '{ability}'")]
    AbilityNotOwned {
        character: InstanceId,
        ability: String,
    },

    #[error("unknown character template '{0}'")]
    UnknownTemplate(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid engine configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to serialize battle data: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Rules(#[from] RulesError),
}

/// Result alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

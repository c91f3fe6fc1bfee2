//! Error types for rules data.

use thiserror::Error;

/// Errors raised while loading or validating rules data.
#[derive(Debug, Error)]
pub enum RulesError {
    #[error("failed to parse TOML content: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("failed to parse JSON content: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown stat '{0}'")]
    UnknownStat(String),

    #[error("unknown ability '{0}'")]
    UnknownAbility(String),

    #[error("duplicate {kind} id '{id}'")]
    DuplicateId { kind: &'static str, id: String },

    #[error("character template '{template}' references unknown ability '{ability}'")]
    MissingTemplateAbility { template: String, ability: String },
}

/// Result alias for rules operations.
pub type RulesResult<T> = Result<T, RulesError>;

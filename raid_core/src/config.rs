//! Engine configuration loaded from TOML.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use raid_rules::StatBounds;

use crate::error::{EngineError, EngineResult};

/// Tunables for one battle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// RNG seed. `None` seeds from entropy.
    pub seed: Option<u64>,

    /// Maximum number of redirects within one pipeline pass.
    pub max_redirect_depth: u32,

    /// Upper bound on the fraction of damage armor or shield can absorb.
    pub max_mitigation: f64,

    /// Number of entries the battle log keeps.
    pub log_capacity: usize,

    /// Number of events the event bus journal keeps.
    pub journal_capacity: usize,

    /// Whether `hp_per_turn` and `mana_per_turn` apply at end of turn.
    pub regeneration: bool,

    pub stat_bounds: StatBounds,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: None,
            max_redirect_depth: 4,
            max_mitigation: 0.8,
            log_capacity: 200,
            journal_capacity: 1000,
            regeneration: true,
            stat_bounds: StatBounds::default(),
        }
    }
}

impl EngineConfig {
    /// Deterministic configuration with the given seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Default::default()
        }
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(source: &str) -> EngineResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> EngineResult<()> {
        let bounds = &self.stat_bounds;
        if !bounds.is_valid() {
            return Err(EngineError::InvalidConfig(format!(
                "stat_bounds.chance_min ({}) must be finite and not above chance_max ({})",
                bounds.chance_min, bounds.chance_max
            )));
        }
        if !(0.0..=1.0).contains(&self.max_mitigation) {
            return Err(EngineError::InvalidConfig(format!(
                "max_mitigation ({}) must be within 0..=1",
                self.max_mitigation
            )));
        }
        Ok(())
    }

    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&source)?;
        debug!(
            target: "raid_core::config",
            path = %path.display(),
            seed = ?config.seed,
            "engine config loaded"
        );
        Ok(config)
    }
}

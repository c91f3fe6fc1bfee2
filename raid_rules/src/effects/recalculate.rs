//! Effective stat recalculation.
//!
//! Effective stats are a pure function of the base stats and the ordered
//! `buffs ++ debuffs` list. Nothing else may write them.

use serde::{Deserialize, Serialize};

use super::Effect;
use crate::entities::{Stat, StatBlock};

/// Bounds applied after all modifiers are folded in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatBounds {
    pub chance_min: f64,
    pub chance_max: f64,
    /// Floor every non-chance stat at zero.
    pub clamp_non_negative: bool,
}

impl Default for StatBounds {
    fn default() -> Self {
        Self {
            chance_min: 0.0,
            chance_max: 1.0,
            clamp_non_negative: true,
        }
    }
}

impl StatBounds {
    /// Whether the chance range is finite and not inverted.
    pub fn is_valid(&self) -> bool {
        self.chance_min.is_finite()
            && self.chance_max.is_finite()
            && self.chance_min <= self.chance_max
    }

    /// Clamp a single stat value.
    ///
    /// Never panics. With an inverted range the upper bound wins, and a NaN
    /// chance collapses to the lower bound.
    pub fn clamp(&self, stat: Stat, value: f64) -> f64 {
        if stat.is_chance() {
            value.max(self.chance_min).min(self.chance_max)
        } else if self.clamp_non_negative {
            value.max(0.0)
        } else {
            value
        }
    }
}

/// Fold every effect's modifiers over a copy of `base`.
///
/// Buffs are applied before debuffs, each in insertion order. Percentage
/// modifiers read `base`, never the running total, so stacking two +100%
/// effects yields +200% rather than x4.
pub fn recalculate(
    base: &StatBlock,
    buffs: &[Effect],
    debuffs: &[Effect],
    bounds: &StatBounds,
) -> StatBlock {
    let mut stats = base.clone();

    for effect in buffs.iter().chain(debuffs) {
        for modifier in &effect.stat_modifiers {
            stats.add(modifier.stat, modifier.delta(base));
        }
    }

    for stat in Stat::ALL {
        stats.set(stat, bounds.clamp(stat, stats.get(stat)));
    }

    stats
}

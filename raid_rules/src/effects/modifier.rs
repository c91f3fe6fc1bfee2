//! Stat modifiers carried by effects.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::entities::{Stat, StatBlock};
use crate::error::RulesResult;

/// How a modifier folds into a stat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierOperation {
    /// Add `value` to the stat.
    Add,
    /// Add `base[stat] * value`; always computed from the base stat.
    AddBasePercentage,
}

/// One `{stat, value, operation}` record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatModifier {
    pub stat: Stat,
    pub value: f64,
    #[serde(default = "default_operation")]
    pub operation: ModifierOperation,
}

fn default_operation() -> ModifierOperation {
    ModifierOperation::Add
}

impl StatModifier {
    /// Flat addition.
    pub fn add(stat: Stat, value: f64) -> Self {
        Self {
            stat,
            value,
            operation: ModifierOperation::Add,
        }
    }

    /// Percentage of the base stat (`1.0` = +100%).
    pub fn base_percentage(stat: Stat, value: f64) -> Self {
        Self {
            stat,
            value,
            operation: ModifierOperation::AddBasePercentage,
        }
    }

    /// The delta this modifier contributes given the unmodified base stats.
    pub fn delta(&self, base: &StatBlock) -> f64 {
        match self.operation {
            ModifierOperation::Add => self.value,
            ModifierOperation::AddBasePercentage => base.get(self.stat) * self.value,
        }
    }
}

/// Modifiers as they appear in content files.
///
/// Either a flat `stat -> delta` table or a list of full records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatModifierSpec {
    Records(Vec<StatModifier>),
    Flat(BTreeMap<String, f64>),
}

impl Default for StatModifierSpec {
    fn default() -> Self {
        StatModifierSpec::Records(Vec::new())
    }
}

impl StatModifierSpec {
    /// Resolve into ordered modifier records. Flat tables become `add` records.
    pub fn resolve(&self) -> RulesResult<Vec<StatModifier>> {
        match self {
            StatModifierSpec::Records(records) => Ok(records.clone()),
            StatModifierSpec::Flat(table) => table
                .iter()
                .map(|(name, value)| Ok(StatModifier::add(name.parse()?, *value)))
                .collect(),
        }
    }
}

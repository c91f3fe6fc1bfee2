//! Ability definitions as supplied by content data.

use serde::{Deserialize, Serialize};

use crate::effects::StatModifierSpec;
use crate::entities::Stat;
use crate::mechanics::{DamageType, TargetType};

/// Static description of an ability. The engine trusts this data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilityDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub mana_cost: f64,
    #[serde(default)]
    pub cooldown: u32,
    pub target_type: TargetType,
    #[serde(default)]
    pub description: String,
    pub effect: AbilityEffectSpec,
}

/// What an ability does. Each kind maps to one handler in the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AbilityEffectSpec {
    /// Damage = `base + ratio * caster[scaling]`, per hit.
    Strike {
        base: f64,
        scaling: Stat,
        ratio: f64,
        damage_type: DamageType,
        #[serde(default = "default_hits")]
        hits: u32,
    },
    /// Healing = `(base + ratio * caster[scaling]) * (1 + healing_power)`.
    Heal { base: f64, scaling: Stat, ratio: f64 },
    /// Stacking damage over time; each stack deals `per_stack * stack_count`.
    Poison { per_stack: f64, duration: u32 },
    /// Attach an effect carrying stat modifiers. `duration` absent = permanent.
    StatBuff {
        effect_id: String,
        effect_name: String,
        #[serde(default)]
        duration: Option<u32>,
        #[serde(default)]
        modifiers: StatModifierSpec,
        #[serde(default)]
        debuff: bool,
    },
    /// Disable one of the target's abilities.
    Disable { duration: u32 },
    /// Prevent the target from using any ability.
    Stun { duration: u32 },
    /// Pull damage aimed at the caster's allies onto the caster.
    Taunt {
        duration: u32,
        #[serde(default)]
        armor_bonus: f64,
    },
}

fn default_hits() -> u32 {
    1
}

impl AbilityEffectSpec {
    /// Short kind name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AbilityEffectSpec::Strike { .. } => "strike",
            AbilityEffectSpec::Heal { .. } => "heal",
            AbilityEffectSpec::Poison { .. } => "poison",
            AbilityEffectSpec::StatBuff { .. } => "stat_buff",
            AbilityEffectSpec::Disable { .. } => "disable",
            AbilityEffectSpec::Stun { .. } => "stun",
            AbilityEffectSpec::Taunt { .. } => "taunt",
        }
    }
}

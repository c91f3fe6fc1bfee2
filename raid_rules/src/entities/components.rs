//! Component definitions for characters: stat blocks and ability slots.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::RulesError;

/// A full block of combat stats.
///
/// Chance-type stats (`dodge_chance`, `crit_chance`, `lifesteal`) are fractions
/// where `1.0` means 100%. `crit_damage` is a multiplier, `armor` and
/// `magical_shield` are mitigation percentages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatBlock {
    pub hp: f64,
    pub mana: f64,
    pub physical_damage: f64,
    pub magical_damage: f64,
    pub armor: f64,
    pub magical_shield: f64,
    pub lifesteal: f64,
    pub dodge_chance: f64,
    pub crit_chance: f64,
    pub crit_damage: f64,
    pub healing_power: f64,
    pub hp_per_turn: f64,
    pub mana_per_turn: f64,
}

impl Default for StatBlock {
    fn default() -> Self {
        Self {
            hp: 100.0,
            mana: 100.0,
            physical_damage: 0.0,
            magical_damage: 0.0,
            armor: 0.0,
            magical_shield: 0.0,
            lifesteal: 0.0,
            dodge_chance: 0.0,
            crit_chance: 0.0,
            crit_damage: 1.5,
            healing_power: 0.0,
            hp_per_turn: 0.0,
            mana_per_turn: 0.0,
        }
    }
}

/// Stat names for modifier calculations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stat {
    Hp,
    Mana,
    #[serde(alias = "physicalDamage")]
    PhysicalDamage,
    #[serde(alias = "magicalDamage")]
    MagicalDamage,
    Armor,
    #[serde(alias = "magicalShield")]
    MagicalShield,
    Lifesteal,
    #[serde(alias = "dodgeChance")]
    DodgeChance,
    #[serde(alias = "critChance")]
    CritChance,
    #[serde(alias = "critDamage")]
    CritDamage,
    #[serde(alias = "healingPower")]
    HealingPower,
    #[serde(alias = "hpPerTurn")]
    HpPerTurn,
    #[serde(alias = "manaPerTurn")]
    ManaPerTurn,
}

impl Stat {
    pub const ALL: [Stat; 13] = [
        Stat::Hp,
        Stat::Mana,
        Stat::PhysicalDamage,
        Stat::MagicalDamage,
        Stat::Armor,
        Stat::MagicalShield,
        Stat::Lifesteal,
        Stat::DodgeChance,
        Stat::CritChance,
        Stat::CritDamage,
        Stat::HealingPower,
        Stat::HpPerTurn,
        Stat::ManaPerTurn,
    ];

    /// Whether this stat is a probability that must stay within `[0, 1]`.
    pub fn is_chance(&self) -> bool {
        matches!(self, Stat::DodgeChance | Stat::CritChance | Stat::Lifesteal)
    }

    /// Canonical snake_case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stat::Hp => "hp",
            Stat::Mana => "mana",
            Stat::PhysicalDamage => "physical_damage",
            Stat::MagicalDamage => "magical_damage",
            Stat::Armor => "armor",
            Stat::MagicalShield => "magical_shield",
            Stat::Lifesteal => "lifesteal",
            Stat::DodgeChance => "dodge_chance",
            Stat::CritChance => "crit_chance",
            Stat::CritDamage => "crit_damage",
            Stat::HealingPower => "healing_power",
            Stat::HpPerTurn => "hp_per_turn",
            Stat::ManaPerTurn => "mana_per_turn",
        }
    }
}

impl FromStr for Stat {
    type Err = RulesError;

    /// Accepts both `physical_damage` and `physicalDamage` spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Stat::ALL
            .iter()
            .copied()
            .find(|stat| stat.as_str().replace('_', "") == normalized)
            .ok_or_else(|| RulesError::UnknownStat(s.to_string()))
    }
}

impl std::fmt::Display for Stat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StatBlock {
    /// Read a stat by name.
    pub fn get(&self, stat: Stat) -> f64 {
        match stat {
            Stat::Hp => self.hp,
            Stat::Mana => self.mana,
            Stat::PhysicalDamage => self.physical_damage,
            Stat::MagicalDamage => self.magical_damage,
            Stat::Armor => self.armor,
            Stat::MagicalShield => self.magical_shield,
            Stat::Lifesteal => self.lifesteal,
            Stat::DodgeChance => self.dodge_chance,
            Stat::CritChance => self.crit_chance,
            Stat::CritDamage => self.crit_damage,
            Stat::HealingPower => self.healing_power,
            Stat::HpPerTurn => self.hp_per_turn,
            Stat::ManaPerTurn => self.mana_per_turn,
        }
    }

    fn slot_mut(&mut self, stat: Stat) -> &mut f64 {
        match stat {
            Stat::Hp => &mut self.hp,
            Stat::Mana => &mut self.mana,
            Stat::PhysicalDamage => &mut self.physical_damage,
            Stat::MagicalDamage => &mut self.magical_damage,
            Stat::Armor => &mut self.armor,
            Stat::MagicalShield => &mut self.magical_shield,
            Stat::Lifesteal => &mut self.lifesteal,
            Stat::DodgeChance => &mut self.dodge_chance,
            Stat::CritChance => &mut self.crit_chance,
            Stat::CritDamage => &mut self.crit_damage,
            Stat::HealingPower => &mut self.healing_power,
            Stat::HpPerTurn => &mut self.hp_per_turn,
            Stat::ManaPerTurn => &mut self.mana_per_turn,
        }
    }

    /// Overwrite a stat.
    pub fn set(&mut self, stat: Stat, value: f64) {
        *self.slot_mut(stat) = value;
    }

    /// Add a delta to a stat.
    pub fn add(&mut self, stat: Stat, delta: f64) {
        *self.slot_mut(stat) += delta;
    }
}

/// Per-character runtime state of one ability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilitySlot {
    pub ability_id: String,
    pub cooldown_remaining: u32,
    /// Number of active effects currently disabling this ability.
    pub disabled_by: u32,
}

impl AbilitySlot {
    pub fn new(ability_id: impl Into<String>) -> Self {
        Self {
            ability_id: ability_id.into(),
            cooldown_remaining: 0,
            disabled_by: 0,
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled_by > 0
    }

    pub fn is_ready(&self) -> bool {
        !self.is_disabled() && self.cooldown_remaining == 0
    }

    /// Register one more disabling effect.
    pub fn disable(&mut self) {
        self.disabled_by += 1;
    }

    /// Release one disabling effect. Returns true if the ability became usable again.
    ///
    /// Releasing an already-enabled slot is a no-op.
    pub fn release(&mut self) -> bool {
        if self.disabled_by == 0 {
            return false;
        }
        self.disabled_by -= 1;
        self.disabled_by == 0
    }

    /// Count the cooldown down by one turn.
    pub fn tick_cooldown(&mut self) {
        self.cooldown_remaining = self.cooldown_remaining.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stat_get_set_roundtrip_each_field() {
        let mut stats = StatBlock::default();
        for (i, stat) in Stat::ALL.iter().enumerate() {
            stats.set(*stat, i as f64);
        }
        for (i, stat) in Stat::ALL.iter().enumerate() {
            assert_eq!(stats.get(*stat), i as f64, "stat {}", stat);
        }
    }

    #[test]
    fn test_stat_from_str_accepts_both_spellings() {
        assert_eq!("physical_damage".parse::<Stat>().unwrap(), Stat::PhysicalDamage);
        assert_eq!("physicalDamage".parse::<Stat>().unwrap(), Stat::PhysicalDamage);
        assert_eq!("dodgeChance".parse::<Stat>().unwrap(), Stat::DodgeChance);
        assert!(matches!(
            "charisma".parse::<Stat>(),
            Err(RulesError::UnknownStat(name)) if name == "charisma"
        ));
    }

    #[test]
    fn test_chance_stats() {
        assert!(Stat::DodgeChance.is_chance());
        assert!(Stat::CritChance.is_chance());
        assert!(!Stat::Armor.is_chance());
    }

    #[test]
    fn test_ability_slot_disable_counting() {
        let mut slot = AbilitySlot::new("fireball");
        slot.disable();
        slot.disable();
        assert!(slot.is_disabled());

        assert!(!slot.release());
        assert!(slot.is_disabled());

        assert!(slot.release());
        assert!(!slot.is_disabled());

        // Releasing again does nothing
        assert!(!slot.release());
        assert_eq!(slot.disabled_by, 0);
    }

    #[test]
    fn test_cooldown_tick_saturates() {
        let mut slot = AbilitySlot::new("strike");
        slot.cooldown_remaining = 1;
        slot.tick_cooldown();
        slot.tick_cooldown();
        assert_eq!(slot.cooldown_remaining, 0);
        assert!(slot.is_ready());
    }
}

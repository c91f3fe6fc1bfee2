//! Character definitions.

use serde::{Deserialize, Serialize};

use super::{AbilitySlot, InstanceId, StatBlock};
use crate::content::{CharacterTemplate, PassiveSpec};
use crate::effects::{recalculate, Effect, EffectInstanceId, StatBounds};
use crate::mechanics::Team;

/// A combatant with its base stats, effective stats and active effects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    pub instance_id: InstanceId,
    /// Template id, shared by every copy of this character type.
    pub id: String,
    pub name: String,
    pub team: Team,

    pub base_stats: StatBlock,
    /// Effective stats. Only [`Character::recalculate_stats`] writes this.
    pub stats: StatBlock,
    pub current_hp: f64,
    pub current_mana: f64,
    pub is_dead: bool,

    pub buffs: Vec<Effect>,
    pub debuffs: Vec<Effect>,
    pub abilities: Vec<AbilitySlot>,

    /// Number of active stun hooks.
    pub stun_count: u32,
    pub passive: Option<PassiveSpec>,
}

impl Character {
    /// Create a character at full HP and mana.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        team: Team,
        base_stats: StatBlock,
    ) -> Self {
        Self {
            instance_id: InstanceId::new(),
            id: id.into(),
            name: name.into(),
            team,
            stats: base_stats.clone(),
            current_hp: base_stats.hp,
            current_mana: base_stats.mana,
            base_stats,
            is_dead: false,
            buffs: Vec::new(),
            debuffs: Vec::new(),
            abilities: Vec::new(),
            stun_count: 0,
            passive: None,
        }
    }

    /// Create a fresh instance from a content template.
    pub fn from_template(template: &CharacterTemplate, team: Team) -> Self {
        let mut character = Self::new(
            template.id.clone(),
            template.name.clone(),
            team,
            template.base_stats.clone(),
        );
        character.abilities = template.abilities.iter().map(AbilitySlot::new).collect();
        character.passive = template.passive.clone();
        character
    }

    /// Add an ability slot.
    pub fn with_ability(mut self, ability_id: impl Into<String>) -> Self {
        self.abilities.push(AbilitySlot::new(ability_id));
        self
    }

    /// Set the passive.
    pub fn with_passive(mut self, passive: PassiveSpec) -> Self {
        self.passive = Some(passive);
        self
    }

    /// Alive while not flagged dead and HP is above zero.
    pub fn is_alive(&self) -> bool {
        !self.is_dead && self.current_hp > 0.0
    }

    pub fn is_stunned(&self) -> bool {
        self.stun_count > 0
    }

    pub fn hp_fraction(&self) -> f64 {
        if self.stats.hp > 0.0 {
            self.current_hp / self.stats.hp
        } else {
            0.0
        }
    }

    /// Rebuild effective stats from base stats and active effects.
    ///
    /// Current HP and mana are clamped to the new maxima.
    pub fn recalculate_stats(&mut self, bounds: &StatBounds) {
        self.stats = recalculate(&self.base_stats, &self.buffs, &self.debuffs, bounds);
        self.current_hp = self.current_hp.min(self.stats.hp);
        self.current_mana = self.current_mana.min(self.stats.mana);
    }

    /// Every active effect, buffs first.
    pub fn effects(&self) -> impl Iterator<Item = &Effect> {
        self.buffs.iter().chain(self.debuffs.iter())
    }

    /// Look up an attached effect instance.
    pub fn find_effect(&self, instance: EffectInstanceId) -> Option<&Effect> {
        self.effects().find(|e| e.instance == instance)
    }

    pub fn has_effect(&self, id: &str) -> bool {
        self.effects().any(|e| e.id == id)
    }

    /// Number of active effects with the given logical id.
    pub fn count_effects(&self, id: &str) -> usize {
        self.effects().filter(|e| e.id == id).count()
    }

    /// Number of active effects with the given display name.
    pub fn count_effects_named(&self, name: &str) -> usize {
        self.effects().filter(|e| e.name == name).count()
    }

    pub fn is_taunting(&self) -> bool {
        self.is_alive() && self.buffs.iter().any(Effect::is_taunt)
    }

    /// The slot for an ability this character owns.
    pub fn ability(&self, ability_id: &str) -> Option<&AbilitySlot> {
        self.abilities.iter().find(|a| a.ability_id == ability_id)
    }

    pub fn ability_mut(&mut self, ability_id: &str) -> Option<&mut AbilitySlot> {
        self.abilities.iter_mut().find(|a| a.ability_id == ability_id)
    }

    /// Turns until the ability is re-enabled, derived from the disabling debuffs.
    ///
    /// `Some(0)` means enabled; `None` means a permanent effect disables it.
    pub fn disabled_turns_remaining(&self, ability_id: &str) -> Option<u32> {
        let mut longest = 0;
        for effect in self.effects().filter(|e| e.disables(ability_id)) {
            longest = longest.max(effect.duration.remaining()?);
        }
        Some(longest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{EffectDuration, EffectHook, StatModifier};
    use crate::entities::Stat;

    fn hero() -> Character {
        Character::new(
            "hero",
            "Test Hero",
            Team::Player,
            StatBlock {
                hp: 200.0,
                physical_damage: 100.0,
                ..Default::default()
            },
        )
        .with_ability("fireball")
    }

    #[test]
    fn test_new_character() {
        let character = hero();
        assert_eq!(character.name, "Test Hero");
        assert!(character.is_alive());
        assert_eq!(character.current_hp, 200.0);
        assert_eq!(character.stats, character.base_stats);
    }

    #[test]
    fn test_character_death() {
        let mut character = hero();
        character.current_hp = 0.0;
        assert!(!character.is_alive());
    }

    #[test]
    fn test_recalculate_clamps_current_hp() {
        let mut character = hero();
        character.buffs.push(
            Effect::new("vigor", "Vigor", "", EffectDuration::Turns(2), None, false)
                .with_modifier(StatModifier::add(Stat::Hp, 50.0)),
        );
        character.recalculate_stats(&StatBounds::default());
        assert_eq!(character.stats.hp, 250.0);

        character.current_hp = 250.0;
        character.buffs.clear();
        character.recalculate_stats(&StatBounds::default());
        assert_eq!(character.current_hp, 200.0);
    }

    #[test]
    fn test_effect_counting() {
        let mut character = hero();
        let poison = Effect::new("poison", "Poison", "", EffectDuration::Turns(3), None, true);
        character.debuffs.push(poison.instantiate());
        character.debuffs.push(poison.instantiate());

        assert_eq!(character.count_effects("poison"), 2);
        assert_eq!(character.count_effects_named("Poison"), 2);
        assert!(character.has_effect("poison"));
        assert!(!character.has_effect("bleed"));
    }

    #[test]
    fn test_disabled_turns_remaining() {
        let mut character = hero();
        assert_eq!(character.disabled_turns_remaining("fireball"), Some(0));

        let hook = EffectHook::DisableAbility {
            ability_id: "fireball".into(),
        };
        character.debuffs.push(
            Effect::new("silence", "Silence", "", EffectDuration::Turns(1), None, true)
                .with_hook(hook.clone()),
        );
        character.debuffs.push(
            Effect::new("silence", "Silence", "", EffectDuration::Turns(2), None, true)
                .with_hook(hook.clone()),
        );
        assert_eq!(character.disabled_turns_remaining("fireball"), Some(2));

        character.debuffs.push(
            Effect::new("curse", "Curse", "", EffectDuration::Permanent, None, true)
                .with_hook(hook),
        );
        assert_eq!(character.disabled_turns_remaining("fireball"), None);
    }
}

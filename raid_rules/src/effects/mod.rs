//! Effects - buffs and debuffs attached to characters.
//!
//! An [`Effect`] is a value object. Ability code builds one, optionally clones
//! it per target with [`Effect::instantiate`], and hands it to the engine which
//! owns it from then on until it expires or is removed.

mod modifier;
mod recalculate;

pub use modifier::*;
pub use recalculate::*;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::entities::{InstanceId, Stat};
use crate::error::RulesResult;
use crate::mechanics::DamageType;

/// Identity of one attached effect instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EffectInstanceId(pub Uuid);

impl EffectInstanceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EffectInstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EffectInstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How long an effect lasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectDuration {
    /// Turns remaining; the effect expires when this reaches zero.
    Turns(u32),
    /// Never counted down.
    Permanent,
}

impl EffectDuration {
    pub fn is_permanent(&self) -> bool {
        matches!(self, EffectDuration::Permanent)
    }

    /// Remaining turns, `None` when permanent.
    pub fn remaining(&self) -> Option<u32> {
        match self {
            EffectDuration::Turns(turns) => Some(*turns),
            EffectDuration::Permanent => None,
        }
    }

    /// Count down one turn. Returns true when the effect has expired.
    pub fn tick(&mut self) -> bool {
        match self {
            EffectDuration::Turns(turns) => {
                *turns = turns.saturating_sub(1);
                *turns == 0
            }
            EffectDuration::Permanent => false,
        }
    }
}

impl From<Option<u32>> for EffectDuration {
    fn from(turns: Option<u32>) -> Self {
        turns.map_or(EffectDuration::Permanent, EffectDuration::Turns)
    }
}

/// Something an effect does every time its holder's turn ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PerTurnEffect {
    Damage { amount: f64, damage_type: DamageType },
    Heal { amount: f64 },
    RestoreMana { amount: f64 },
}

/// Side effects tied to an effect's lifetime.
///
/// Each hook has an apply half (runs once on attach) and a remove half
/// (runs once on expiry or explicit removal).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EffectHook {
    /// Disable one of the holder's abilities.
    DisableAbility { ability_id: String },
    /// The holder cannot use abilities.
    Stun,
    /// Damage aimed at the holder's allies is redirected to the holder.
    Taunt,
}

/// A buff or debuff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    /// Logical id, shared by every stack of the same effect.
    pub id: String,
    pub instance: EffectInstanceId,
    pub name: String,
    pub icon: String,
    pub description: String,
    pub duration: EffectDuration,
    pub per_turn: Option<PerTurnEffect>,
    pub is_debuff: bool,
    pub stat_modifiers: Vec<StatModifier>,
    pub hooks: Vec<EffectHook>,
    pub source: Option<InstanceId>,
    /// Stack count captured when this instance was created.
    pub stack: u32,
    /// Per-stack amount for effects whose per-turn amount grows with the
    /// number of stacks the holder already carries.
    #[serde(default)]
    pub stack_scaling: Option<f64>,
}

impl Effect {
    /// Create an effect with no stat modifiers and no hooks.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        icon: impl Into<String>,
        duration: EffectDuration,
        per_turn: Option<PerTurnEffect>,
        is_debuff: bool,
    ) -> Self {
        Self {
            id: id.into(),
            instance: EffectInstanceId::new(),
            name: name.into(),
            icon: icon.into(),
            description: String::new(),
            duration,
            per_turn,
            is_debuff,
            stat_modifiers: Vec::new(),
            hooks: Vec::new(),
            source: None,
            stack: 1,
            stack_scaling: None,
        }
    }

    /// Independent copy with a fresh instance id.
    pub fn instantiate(&self) -> Self {
        Self {
            instance: EffectInstanceId::new(),
            ..self.clone()
        }
    }

    pub fn with_modifier(mut self, modifier: StatModifier) -> Self {
        self.stat_modifiers.push(modifier);
        self
    }

    pub fn with_modifiers(mut self, modifiers: impl IntoIterator<Item = StatModifier>) -> Self {
        self.stat_modifiers.extend(modifiers);
        self
    }

    /// Attach a flat `stat name -> delta` table.
    pub fn with_flat_modifiers(self, table: &BTreeMap<String, f64>) -> RulesResult<Self> {
        let modifiers = StatModifierSpec::Flat(table.clone()).resolve()?;
        Ok(self.with_modifiers(modifiers))
    }

    pub fn with_hook(mut self, hook: EffectHook) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_source(mut self, source: InstanceId) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_stack(mut self, stack: u32) -> Self {
        self.stack = stack;
        self
    }

    /// Scale the per-turn amount with the holder's stack count.
    pub fn with_stack_scaling(mut self, per_stack: f64) -> Self {
        self.stack_scaling = Some(per_stack);
        self
    }

    /// Size a stack-scaled effect for a holder already carrying `existing`
    /// stacks of it. Effects without stack scaling are left alone.
    pub fn restack(&mut self, existing: usize) {
        let Some(per_stack) = self.stack_scaling else {
            return;
        };
        let stack = u32::try_from(existing).unwrap_or(u32::MAX).saturating_add(1);
        let total = per_stack * f64::from(stack);
        match &mut self.per_turn {
            Some(PerTurnEffect::Damage { amount, .. })
            | Some(PerTurnEffect::Heal { amount })
            | Some(PerTurnEffect::RestoreMana { amount }) => *amount = total,
            None => {}
        }
        self.stack = stack;
        self.description = format!("Stack {stack}: {total} per turn");
    }

    pub fn is_permanent(&self) -> bool {
        self.duration.is_permanent()
    }

    pub fn has_hook(&self, hook: &EffectHook) -> bool {
        self.hooks.contains(hook)
    }

    pub fn is_taunt(&self) -> bool {
        self.has_hook(&EffectHook::Taunt)
    }

    /// Whether this effect disables the given ability.
    pub fn disables(&self, ability_id: &str) -> bool {
        self.hooks.iter().any(|hook| {
            matches!(hook, EffectHook::DisableAbility { ability_id: id } if id == ability_id)
        })
    }

    /// Total flat contribution to one stat, ignoring percentage records.
    pub fn flat_modifier(&self, stat: Stat) -> f64 {
        self.stat_modifiers
            .iter()
            .filter(|m| m.stat == stat && m.operation == ModifierOperation::Add)
            .map(|m| m.value)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poison() -> Effect {
        Effect::new(
            "poison",
            "Poison",
            "poison.png",
            EffectDuration::Turns(3),
            Some(PerTurnEffect::Damage {
                amount: 5.0,
                damage_type: DamageType::True,
            }),
            true,
        )
    }

    #[test]
    fn test_new_effect_has_no_modifiers_or_hooks() {
        let effect = poison();
        assert!(effect.stat_modifiers.is_empty());
        assert!(effect.hooks.is_empty());
        assert!(effect.is_debuff);
        assert_eq!(effect.stack, 1);
    }

    #[test]
    fn test_instantiate_gives_independent_copy() {
        let prototype = poison().with_hook(EffectHook::DisableAbility {
            ability_id: "fireball".into(),
        });
        let mut a = prototype.instantiate();
        let b = prototype.instantiate();

        assert_ne!(a.instance, b.instance);
        assert_ne!(a.instance, prototype.instance);
        assert_eq!(a.id, b.id);

        a.hooks.clear();
        assert_eq!(b.hooks.len(), 1);
        assert!(b.disables("fireball"));
    }

    #[test]
    fn test_duration_tick() {
        let mut duration = EffectDuration::Turns(2);
        assert!(!duration.tick());
        assert!(duration.tick());
        assert_eq!(duration.remaining(), Some(0));

        let mut permanent = EffectDuration::Permanent;
        for _ in 0..10 {
            assert!(!permanent.tick());
        }
        assert_eq!(permanent.remaining(), None);
    }

    #[test]
    fn test_duration_from_option() {
        assert_eq!(EffectDuration::from(Some(2)), EffectDuration::Turns(2));
        assert_eq!(EffectDuration::from(None), EffectDuration::Permanent);
    }

    #[test]
    fn test_restack_scales_per_turn_amount() {
        let mut third = poison().with_stack_scaling(5.0);
        third.restack(2);
        assert_eq!(third.stack, 3);
        assert_eq!(
            third.per_turn,
            Some(PerTurnEffect::Damage {
                amount: 15.0,
                damage_type: DamageType::True
            })
        );

        let mut plain = poison();
        plain.restack(4);
        assert_eq!(plain.stack, 1);
        assert!(plain.description.is_empty());
    }

    #[test]
    fn test_flat_modifier_table() {
        let mut table = BTreeMap::new();
        table.insert("armor".to_string(), 10.0);
        table.insert("magicalShield".to_string(), 4.0);

        let effect = Effect::new("ward", "Ward", "ward.png", EffectDuration::Turns(2), None, false)
            .with_flat_modifiers(&table)
            .unwrap();

        assert_eq!(effect.flat_modifier(Stat::Armor), 10.0);
        assert_eq!(effect.flat_modifier(Stat::MagicalShield), 4.0);
        assert_eq!(effect.flat_modifier(Stat::PhysicalDamage), 0.0);
    }
}

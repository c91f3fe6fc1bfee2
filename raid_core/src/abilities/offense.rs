//! Damage-dealing abilities.

use raid_rules::{DamageType, Effect, EffectDuration, PerTurnEffect, Stat};

use super::{AbilityHandler, AbilityInvocation, AbilityOutcome};
use crate::battle::Battle;
use crate::error::EngineResult;
use crate::intercept::{DamageCall, DebuffCall};

/// Logical id shared by every poison stack.
pub const POISON_EFFECT: &str = "poison";

/// `base + ratio * caster[scaling]` per hit, with a crit roll per hit.
#[derive(Debug, Clone)]
pub struct StrikeHandler {
    pub base: f64,
    pub scaling: Stat,
    pub ratio: f64,
    pub damage_type: DamageType,
    pub hits: u32,
}

impl AbilityHandler for StrikeHandler {
    fn execute(
        &self,
        battle: &mut Battle,
        invocation: &AbilityInvocation,
    ) -> EngineResult<AbilityOutcome> {
        let mut outcome = AbilityOutcome::succeeded();

        for &target in &invocation.targets {
            for _ in 0..self.hits.max(1) {
                // Reflected damage can kill the caster mid-combo
                let Some(caster) = battle.character(invocation.caster).filter(|c| c.is_alive())
                else {
                    return Ok(outcome);
                };
                let raw = self.base + self.ratio * caster.stats.get(self.scaling);
                let crit_chance = caster.stats.crit_chance;
                let crit_damage = caster.stats.crit_damage;
                if !battle.roster().is_alive(target) {
                    break;
                }

                let is_critical = battle.rng_mut().chance(crit_chance);
                let amount = if is_critical { raw * crit_damage } else { raw };
                let result = battle.apply_damage(
                    DamageCall::new(Some(invocation.caster), target, amount, self.damage_type)
                        .with_ability(invocation.ability_id())
                        .critical(is_critical),
                )?;
                if result.is_applied() {
                    outcome.damage += result.amount;
                }
            }
        }

        Ok(outcome)
    }
}

/// Stacking poison. Each new stack's per-turn damage is fixed when it is attached,
/// from the stacks its recipient already carries.
#[derive(Debug, Clone)]
pub struct PoisonHandler {
    pub per_stack: f64,
    pub duration: u32,
}

impl PoisonHandler {
    /// A single unsized stack; the attach path sizes it for whoever receives it.
    pub fn stack_effect(&self) -> Effect {
        Effect::new(
            POISON_EFFECT,
            "Poison",
            "poison.png",
            EffectDuration::Turns(self.duration),
            Some(PerTurnEffect::Damage {
                amount: self.per_stack,
                damage_type: DamageType::True,
            }),
            true,
        )
        .with_stack_scaling(self.per_stack)
    }
}

impl AbilityHandler for PoisonHandler {
    fn execute(
        &self,
        battle: &mut Battle,
        invocation: &AbilityInvocation,
    ) -> EngineResult<AbilityOutcome> {
        for &target in &invocation.targets {
            let effect = self.stack_effect().with_source(invocation.caster);
            battle.apply_debuff(
                DebuffCall::new(Some(invocation.caster), target, effect)
                    .with_ability(invocation.ability_id()),
            )?;
        }
        Ok(AbilityOutcome::succeeded())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poison_stack_effects() {
        let handler = PoisonHandler {
            per_stack: 5.0,
            duration: 3,
        };

        let mut third = handler.stack_effect();
        assert_eq!(third.stack, 1);
        third.restack(2);
        assert_eq!(third.stack, 3);
        assert_eq!(third.id, POISON_EFFECT);
        assert!(third.is_debuff);
        assert_eq!(
            third.per_turn,
            Some(PerTurnEffect::Damage {
                amount: 15.0,
                damage_type: DamageType::True
            })
        );
        assert_eq!(third.duration, EffectDuration::Turns(3));
    }
}

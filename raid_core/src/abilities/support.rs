//! Healing, buffs and taunts.

use raid_rules::{
    AbilityDefinition, AbilityEffectSpec, Effect, EffectDuration, EffectHook, RulesError, Stat,
    StatModifier,
};

use super::{AbilityHandler, AbilityInvocation, AbilityOutcome};
use crate::battle::Battle;
use crate::error::EngineResult;
use crate::intercept::{DebuffCall, HealCall};

/// `(base + ratio * caster[scaling]) * (1 + healing_power)`.
#[derive(Debug, Clone)]
pub struct HealHandler {
    pub base: f64,
    pub scaling: Stat,
    pub ratio: f64,
}

impl AbilityHandler for HealHandler {
    fn execute(
        &self,
        battle: &mut Battle,
        invocation: &AbilityInvocation,
    ) -> EngineResult<AbilityOutcome> {
        let Some(caster) = battle.character(invocation.caster) else {
            return Ok(AbilityOutcome::failed("caster left the battle"));
        };
        let raw = self.base + self.ratio * caster.stats.get(self.scaling);
        let amount = raw * (1.0 + caster.stats.healing_power);

        let mut outcome = AbilityOutcome::succeeded();
        for &target in &invocation.targets {
            let result = battle.heal(
                HealCall::new(Some(invocation.caster), target, amount)
                    .with_ability(invocation.ability_id()),
            )?;
            if result.is_applied() {
                outcome.healing += result.amount;
            }
        }
        Ok(outcome)
    }
}

/// Attaches a fresh copy of one prototype effect to every target.
#[derive(Debug, Clone)]
pub struct StatBuffHandler {
    pub prototype: Effect,
}

impl StatBuffHandler {
    pub fn from_definition(definition: &AbilityDefinition) -> EngineResult<Self> {
        let AbilityEffectSpec::StatBuff {
            effect_id,
            effect_name,
            duration,
            modifiers,
            debuff,
        } = &definition.effect
        else {
            return Err(RulesError::UnknownAbility(definition.id.clone()).into());
        };

        let prototype = Effect::new(
            effect_id.clone(),
            effect_name.clone(),
            definition.icon.clone(),
            EffectDuration::from(*duration),
            None,
            *debuff,
        )
        .with_modifiers(modifiers.resolve()?)
        .with_description(definition.description.clone());

        Ok(Self { prototype })
    }
}

impl AbilityHandler for StatBuffHandler {
    fn execute(
        &self,
        battle: &mut Battle,
        invocation: &AbilityInvocation,
    ) -> EngineResult<AbilityOutcome> {
        for &target in &invocation.targets {
            let effect = self.prototype.instantiate().with_source(invocation.caster);
            if effect.is_debuff {
                battle.apply_debuff(
                    DebuffCall::new(Some(invocation.caster), target, effect)
                        .with_ability(invocation.ability_id()),
                )?;
            } else {
                battle.add_buff(target, effect)?;
            }
        }
        Ok(AbilityOutcome::succeeded())
    }
}

/// Self-buff that pulls damage aimed at allies onto the caster.
#[derive(Debug, Clone)]
pub struct TauntHandler {
    pub duration: u32,
    pub armor_bonus: f64,
}

impl AbilityHandler for TauntHandler {
    fn execute(
        &self,
        battle: &mut Battle,
        invocation: &AbilityInvocation,
    ) -> EngineResult<AbilityOutcome> {
        for &target in &invocation.targets {
            let mut effect = Effect::new(
                "taunt",
                "Taunt",
                "taunt.png",
                EffectDuration::Turns(self.duration),
                None,
                false,
            )
            .with_hook(EffectHook::Taunt)
            .with_source(invocation.caster);
            if self.armor_bonus != 0.0 {
                effect = effect.with_modifier(StatModifier::add(Stat::Armor, self.armor_bonus));
            }
            battle.add_buff(target, effect)?;
        }
        Ok(AbilityOutcome::succeeded())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raid_rules::ContentPack;

    #[test]
    fn test_stat_buff_prototype_from_content() {
        let pack = ContentPack::builtin().unwrap();

        let war_cry = StatBuffHandler::from_definition(pack.ability("war_cry").unwrap()).unwrap();
        assert_eq!(war_cry.prototype.id, "war_cry");
        assert_eq!(war_cry.prototype.duration, EffectDuration::Turns(3));
        assert!(!war_cry.prototype.is_debuff);
        assert_eq!(
            war_cry.prototype.stat_modifiers,
            vec![StatModifier::base_percentage(Stat::PhysicalDamage, 1.0)]
        );

        let sunder = StatBuffHandler::from_definition(pack.ability("sunder").unwrap()).unwrap();
        assert!(sunder.prototype.is_debuff);
        assert_eq!(sunder.prototype.flat_modifier(Stat::Armor), -15.0);
    }

    #[test]
    fn test_non_buff_definition_is_rejected() {
        let pack = ContentPack::builtin().unwrap();
        assert!(StatBuffHandler::from_definition(pack.ability("fireball").unwrap()).is_err());
    }
}

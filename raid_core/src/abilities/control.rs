//! Crowd control: disables and stuns.

use tracing::debug;

use raid_rules::{Effect, EffectDuration, EffectHook};

use super::{AbilityHandler, AbilityInvocation, AbilityOutcome};
use crate::battle::Battle;
use crate::error::EngineResult;
use crate::intercept::DebuffCall;

/// Disables one random enabled ability of each target.
#[derive(Debug, Clone)]
pub struct DisableHandler {
    pub duration: u32,
}

impl DisableHandler {
    pub fn effect(&self, ability_id: &str) -> Effect {
        Effect::new(
            "disable",
            format!("Disabled: {ability_id}"),
            "disable.png",
            EffectDuration::Turns(self.duration),
            None,
            true,
        )
        .with_hook(EffectHook::DisableAbility {
            ability_id: ability_id.to_string(),
        })
    }
}

impl AbilityHandler for DisableHandler {
    fn execute(
        &self,
        battle: &mut Battle,
        invocation: &AbilityInvocation,
    ) -> EngineResult<AbilityOutcome> {
        for &target in &invocation.targets {
            let enabled: Vec<String> = battle
                .character(target)
                .map(|c| {
                    c.abilities
                        .iter()
                        .filter(|slot| !slot.is_disabled())
                        .map(|slot| slot.ability_id.clone())
                        .collect()
                })
                .unwrap_or_default();
            let Some(ability_id) = battle.rng_mut().pick(&enabled).cloned() else {
                debug!(target: "raid_core::abilities", %target, "nothing left to disable");
                continue;
            };

            let effect = self.effect(&ability_id).with_source(invocation.caster);
            battle.apply_debuff(
                DebuffCall::new(Some(invocation.caster), target, effect)
                    .with_ability(invocation.ability_id()),
            )?;
        }
        Ok(AbilityOutcome::succeeded())
    }
}

#[derive(Debug, Clone)]
pub struct StunHandler {
    pub duration: u32,
}

impl AbilityHandler for StunHandler {
    fn execute(
        &self,
        battle: &mut Battle,
        invocation: &AbilityInvocation,
    ) -> EngineResult<AbilityOutcome> {
        for &target in &invocation.targets {
            let effect = Effect::new(
                "stun",
                "Stunned",
                "stun.png",
                EffectDuration::Turns(self.duration),
                None,
                true,
            )
            .with_hook(EffectHook::Stun)
            .with_source(invocation.caster);
            battle.apply_debuff(
                DebuffCall::new(Some(invocation.caster), target, effect)
                    .with_ability(invocation.ability_id()),
            )?;
        }
        Ok(AbilityOutcome::succeeded())
    }
}

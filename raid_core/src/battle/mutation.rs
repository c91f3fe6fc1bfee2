//! Damage and healing: the interceptor pipeline and the innermost apply step.

use tracing::{debug, warn};

use raid_rules::{DamageType, InstanceId};

use super::Battle;
use crate::error::EngineResult;
use crate::events::BattleEvent;
use crate::intercept::{
    DamageCall, DebuffCall, HealCall, InterceptView, Interception, InterceptorKey, Mutation,
    MutationOutcome, MutationStatus, PipelinePass,
};
use crate::statistics::{StatKind, StatRecord};

/// Terminal decisions that end a dispatch loop early.
enum Decision {
    Redirect(InterceptorKey, InstanceId),
    Block(InterceptorKey, String),
    ConvertToHeal(InterceptorKey),
}

impl Battle {
    /// Deal damage through the interceptor chain.
    pub fn apply_damage(&mut self, call: DamageCall) -> EngineResult<MutationOutcome> {
        self.require(call.target)?;
        Ok(self.dispatch(Mutation::Damage(call), PipelinePass::new()))
    }

    /// Heal through the interceptor chain. Healing never exceeds max HP.
    pub fn heal(&mut self, call: HealCall) -> EngineResult<MutationOutcome> {
        self.require(call.target)?;
        Ok(self.dispatch(Mutation::Heal(call), PipelinePass::new()))
    }

    /// Restore mana up to the maximum. Returns the amount actually restored.
    pub fn restore_mana(&mut self, target: InstanceId, amount: f64) -> EngineResult<f64> {
        self.require(target)?;
        Ok(self.restore_mana_directly(target, amount))
    }

    /// Run a mutation through every interceptor not yet visited in this pass.
    pub(super) fn dispatch(
        &mut self,
        mutation: Mutation,
        mut pass: PipelinePass,
    ) -> MutationOutcome {
        if pass.depth > self.ctx.config.max_redirect_depth {
            warn!(
                target: "raid_core::pipeline",
                depth = pass.depth,
                kind = mutation.kind(),
                "redirect depth exceeded, applying directly"
            );
            self.ctx.warning("Redirect chain too long; applying to the current target");
            return self.apply_mutation(mutation);
        }

        let mut follow_ups = Vec::new();
        let mut decision = None;
        {
            let view = InterceptView {
                roster: &self.roster,
                config: &self.ctx.config,
            };
            for interceptor in self.interceptors.iter() {
                let key = interceptor.key();
                if pass.is_visited(&key) {
                    continue;
                }
                match interceptor.intercept(&mutation, &view, &mut self.ctx.rng) {
                    Interception::Pass => {}
                    Interception::FollowUp(extra) => {
                        pass.visit(key);
                        follow_ups.extend(extra);
                    }
                    Interception::Redirect { to } => {
                        decision = Some(Decision::Redirect(key, to));
                        break;
                    }
                    Interception::Block { reason } => {
                        decision = Some(Decision::Block(key, reason));
                        break;
                    }
                    Interception::ConvertToHeal => {
                        decision = Some(Decision::ConvertToHeal(key));
                        break;
                    }
                }
            }
        }

        let target = mutation.target();
        match decision {
            None => {
                let outcome = self.apply_mutation(mutation);
                if outcome.is_applied() {
                    for follow_up in follow_ups {
                        self.dispatch(follow_up, pass.nested());
                    }
                }
                outcome
            }
            Some(Decision::Redirect(key, to)) => {
                pass.visit(key);
                if to == target || !self.roster.is_alive(to) {
                    return self.dispatch(mutation, pass);
                }
                self.log_redirect(key, &mutation, to);
                self.dispatch(mutation.retarget(to), pass.nested())
            }
            Some(Decision::Block(key, reason)) => {
                debug!(
                    target: "raid_core::pipeline",
                    passive = key.passive,
                    %target,
                    reason = %reason,
                    "mutation blocked"
                );
                let name = self.display_name(target);
                self.ctx.combat(format!("{name} is unaffected ({reason})"));
                self.ctx.publish(BattleEvent::Blocked {
                    passive: key.passive.to_string(),
                    target,
                    reason,
                });
                MutationOutcome::with_status(target, MutationStatus::Blocked)
            }
            Some(Decision::ConvertToHeal(key)) => {
                debug!(
                    target: "raid_core::pipeline",
                    passive = key.passive,
                    %target,
                    "damage converted to healing"
                );
                pass.visit(key);
                let outcome = self.dispatch(mutation.into_heal(), pass);
                if outcome.is_applied() {
                    MutationOutcome {
                        status: MutationStatus::Converted,
                        ..outcome
                    }
                } else {
                    outcome
                }
            }
        }
    }

    fn log_redirect(&mut self, key: InterceptorKey, mutation: &Mutation, to: InstanceId) {
        let from = mutation.target();
        debug!(
            target: "raid_core::pipeline",
            passive = key.passive,
            kind = mutation.kind(),
            %from,
            %to,
            "mutation redirected"
        );
        let (from_name, to_name) = (self.display_name(from), self.display_name(to));
        self.ctx
            .combat(format!("{} aimed at {from_name} is redirected to {to_name}", mutation.kind()));
        self.ctx.publish(BattleEvent::Redirected {
            passive: key.passive.to_string(),
            from,
            to,
        });
    }

    fn display_name(&self, id: InstanceId) -> String {
        self.roster
            .get(id)
            .map_or_else(|| id.to_string(), |c| c.name.clone())
    }

    fn apply_mutation(&mut self, mutation: Mutation) -> MutationOutcome {
        match mutation {
            Mutation::Damage(call) => self.apply_damage_directly(call),
            Mutation::Heal(call) => self.apply_heal_directly(call),
            Mutation::Debuff(call) => self.attach_debuff_directly(call),
        }
    }

    fn apply_damage_directly(&mut self, call: DamageCall) -> MutationOutcome {
        let max_mitigation = self.ctx.config.max_mitigation;
        let Some(target) = self.roster.get(call.target).filter(|c| c.is_alive()) else {
            return MutationOutcome::with_status(call.target, MutationStatus::TargetDead);
        };
        let name = target.name.clone();
        let dodge_chance = target.stats.dodge_chance;
        let mitigation = match call.damage_type {
            DamageType::Physical => target.stats.armor / 100.0,
            DamageType::Magical => target.stats.magical_shield / 100.0,
            DamageType::True => 0.0,
        }
        .clamp(0.0, max_mitigation.max(0.0));

        if call.damage_type.is_mitigated() && self.ctx.rng.chance(dodge_chance) {
            self.ctx.combat(format!("{name} dodges the attack"));
            self.ctx.publish(BattleEvent::Dodged {
                source: call.source,
                target: call.target,
            });
            return MutationOutcome::with_status(call.target, MutationStatus::Dodged);
        }

        let dealt = (call.amount * (1.0 - mitigation)).max(0.0);
        let mut died = false;
        if let Some(target) = self.roster.get_mut(call.target) {
            target.current_hp = (target.current_hp - dealt).max(0.0);
            if target.current_hp <= 0.0 {
                target.is_dead = true;
                died = true;
            }
        }

        self.ctx.statistics.record(StatRecord {
            caster: call.source,
            target: call.target,
            amount: dealt,
            kind: StatKind::Damage,
            is_critical: call.is_critical,
            ability_id: call.ability_id.clone(),
        });
        let crit = if call.is_critical { " (critical)" } else { "" };
        self.ctx.combat(format!("{name} takes {dealt:.0} damage{crit}"));
        self.ctx.publish(BattleEvent::DamageDealt {
            source: call.source,
            target: call.target,
            amount: dealt,
            is_critical: call.is_critical,
        });

        if died {
            self.handle_death(call.target, call.source);
        }
        self.touch(call.target);

        if let Some(source) = call.source {
            let lifesteal = self
                .roster
                .get(source)
                .filter(|c| c.is_alive())
                .map_or(0.0, |c| c.stats.lifesteal);
            if lifesteal > 0.0 && dealt > 0.0 {
                let heal = HealCall::new(Some(source), source, dealt * lifesteal)
                    .with_ability("lifesteal");
                self.dispatch(Mutation::Heal(heal), PipelinePass::new());
            }
        }

        MutationOutcome::applied(call.target, dealt)
    }

    fn apply_heal_directly(&mut self, call: HealCall) -> MutationOutcome {
        let Some(target) = self.roster.get_mut(call.target).filter(|c| c.is_alive()) else {
            return MutationOutcome::with_status(call.target, MutationStatus::TargetDead);
        };
        let missing = (target.stats.hp - target.current_hp).max(0.0);
        let healed = call.amount.max(0.0).min(missing);
        target.current_hp += healed;
        let name = target.name.clone();

        if healed > 0.0 {
            self.ctx.statistics.record(StatRecord {
                caster: call.source,
                target: call.target,
                amount: healed,
                kind: StatKind::Healing,
                is_critical: false,
                ability_id: call.ability_id.clone(),
            });
        }
        self.ctx.combat(format!("{name} recovers {healed:.0} HP"));
        self.ctx.publish(BattleEvent::Healed {
            source: call.source,
            target: call.target,
            amount: healed,
        });
        self.touch(call.target);
        MutationOutcome::applied(call.target, healed)
    }

    fn attach_debuff_directly(&mut self, call: DebuffCall) -> MutationOutcome {
        if !self.roster.is_alive(call.target) {
            return MutationOutcome::with_status(call.target, MutationStatus::TargetDead);
        }
        match self.attach_effect(call.target, call.effect) {
            Ok(instance) => MutationOutcome {
                attached: Some(instance),
                ..MutationOutcome::applied(call.target, 0.0)
            },
            Err(_) => MutationOutcome::with_status(call.target, MutationStatus::TargetDead),
        }
    }

    pub(super) fn restore_mana_directly(&mut self, target: InstanceId, amount: f64) -> f64 {
        let Some(character) = self.roster.get_mut(target).filter(|c| c.is_alive()) else {
            return 0.0;
        };
        let missing = (character.stats.mana - character.current_mana).max(0.0);
        let restored = amount.max(0.0).min(missing);
        character.current_mana += restored;
        if restored > 0.0 {
            self.touch(target);
        }
        restored
    }

    fn handle_death(&mut self, id: InstanceId, killer: Option<InstanceId>) {
        let name = self.display_name(id);
        debug!(target: "raid_core::battle", character = %id, killer = ?killer, "character died");
        self.ctx.combat(format!("{name} has fallen"));
        self.ctx.publish(BattleEvent::CharacterDied { character: id, killer });
        self.clear_finite_effects(id);
        self.notify_buffs_changed(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abilities::AbilityRegistry;
    use crate::config::EngineConfig;
    use raid_rules::{Character, StatBlock, Team};

    fn setup(target_stats: StatBlock) -> (Battle, InstanceId, InstanceId) {
        let mut battle = Battle::new(EngineConfig::seeded(5), AbilityRegistry::new());
        let attacker = battle.add_character(Character::new(
            "attacker",
            "Attacker",
            Team::Player,
            StatBlock {
                lifesteal: 0.5,
                ..Default::default()
            },
        ));
        let target =
            battle.add_character(Character::new("target", "Target", Team::Enemy, target_stats));
        (battle, attacker, target)
    }

    #[test]
    fn test_armor_mitigation_is_capped() {
        let (mut battle, attacker, target) = setup(StatBlock {
            hp: 1000.0,
            armor: 95.0,
            magical_shield: 25.0,
            ..Default::default()
        });

        let physical = battle
            .apply_damage(DamageCall::new(Some(attacker), target, 100.0, DamageType::Physical))
            .unwrap();
        assert!((physical.amount - 20.0).abs() < 1e-9);

        let magical = battle
            .apply_damage(DamageCall::new(Some(attacker), target, 100.0, DamageType::Magical))
            .unwrap();
        assert_eq!(magical.amount, 75.0);

        let true_damage = battle
            .apply_damage(DamageCall::new(None, target, 100.0, DamageType::True))
            .unwrap();
        assert_eq!(true_damage.amount, 100.0);
    }

    #[test]
    fn test_guaranteed_dodge() {
        let (mut battle, attacker, target) = setup(StatBlock {
            dodge_chance: 1.0,
            ..Default::default()
        });

        let outcome = battle
            .apply_damage(DamageCall::new(Some(attacker), target, 50.0, DamageType::Physical))
            .unwrap();
        assert_eq!(outcome.status, MutationStatus::Dodged);
        assert_eq!(battle.character(target).unwrap().current_hp, 100.0);

        // True damage cannot be dodged
        let outcome = battle
            .apply_damage(DamageCall::new(Some(attacker), target, 50.0, DamageType::True))
            .unwrap();
        assert!(outcome.is_applied());
    }

    #[test]
    fn test_lethal_damage_kills_once() {
        let (mut battle, attacker, target) = setup(StatBlock::default());

        battle
            .apply_damage(DamageCall::new(Some(attacker), target, 250.0, DamageType::True))
            .unwrap();
        let again = battle
            .apply_damage(DamageCall::new(Some(attacker), target, 10.0, DamageType::True))
            .unwrap();

        let victim = battle.character(target).unwrap();
        assert!(victim.is_dead);
        assert_eq!(victim.current_hp, 0.0);
        assert_eq!(again.status, MutationStatus::TargetDead);
        assert_eq!(
            battle
                .events()
                .count(|e| matches!(e, BattleEvent::CharacterDied { .. })),
            1
        );
        assert_eq!(battle.winner(), Some(Team::Player));
    }

    #[test]
    fn test_lifesteal_heals_source() {
        let (mut battle, attacker, target) = setup(StatBlock::default());
        battle
            .apply_damage(DamageCall::new(None, attacker, 40.0, DamageType::True))
            .unwrap();

        battle
            .apply_damage(DamageCall::new(Some(attacker), target, 30.0, DamageType::True))
            .unwrap();
        assert_eq!(battle.character(attacker).unwrap().current_hp, 75.0);
    }

    #[test]
    fn test_heal_is_capped_at_max_hp() {
        let (mut battle, _, target) = setup(StatBlock::default());
        battle
            .apply_damage(DamageCall::new(None, target, 10.0, DamageType::True))
            .unwrap();

        let outcome = battle.heal(HealCall::new(None, target, 50.0)).unwrap();
        assert_eq!(outcome.amount, 10.0);
        assert_eq!(battle.character(target).unwrap().current_hp, 100.0);
    }

    #[test]
    fn test_mana_restore_is_capped() {
        let (mut battle, attacker, _) = setup(StatBlock::default());
        assert_eq!(battle.restore_mana(attacker, 30.0).unwrap(), 0.0);
    }
}

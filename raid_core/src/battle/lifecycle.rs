//! Effect lifecycle: attach, detach, expiry and aura upkeep.
//!
//! Hooks have an apply half and a remove half. The apply half runs when an
//! effect is attached, the remove half when that same instance leaves its
//! list, so each half runs exactly once per instance. Recalculation never
//! runs hooks.

use tracing::debug;

use raid_rules::{Character, Effect, EffectHook, EffectInstanceId, InstanceId, PerTurnEffect};

use super::Battle;
use crate::error::{EngineError, EngineResult};
use crate::events::BattleEvent;
use crate::intercept::{
    AuraUpdate, DamageCall, DebuffCall, HealCall, InterceptView, Mutation, MutationOutcome,
    MutationStatus, PipelinePass,
};

/// What end-of-turn processing did to one character.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnReport {
    pub character: InstanceId,
    pub damage_taken: f64,
    pub healed: f64,
    pub mana_restored: f64,
    /// Logical ids of effects that expired this turn.
    pub expired: Vec<String>,
}

impl TurnReport {
    pub fn new(character: InstanceId) -> Self {
        Self {
            character,
            damage_taken: 0.0,
            healed: 0.0,
            mana_restored: 0.0,
            expired: Vec::new(),
        }
    }
}

fn apply_hook(character: &mut Character, hook: &EffectHook) -> Option<BattleEvent> {
    match hook {
        EffectHook::DisableAbility { ability_id } => {
            let slot = character.ability_mut(ability_id)?;
            let was_disabled = slot.is_disabled();
            slot.disable();
            (!was_disabled).then(|| BattleEvent::AbilityDisabled {
                character: character.instance_id,
                ability_id: ability_id.clone(),
            })
        }
        EffectHook::Stun => {
            character.stun_count += 1;
            None
        }
        EffectHook::Taunt => None,
    }
}

fn release_hook(character: &mut Character, hook: &EffectHook) -> Option<BattleEvent> {
    match hook {
        EffectHook::DisableAbility { ability_id } => {
            let enabled = character.ability_mut(ability_id)?.release();
            enabled.then(|| BattleEvent::AbilityEnabled {
                character: character.instance_id,
                ability_id: ability_id.clone(),
            })
        }
        EffectHook::Stun => {
            character.stun_count = character.stun_count.saturating_sub(1);
            None
        }
        EffectHook::Taunt => None,
    }
}

impl Battle {
    /// Attach a buff. Buffs do not pass through the interceptor chain.
    ///
    /// A dead target keeps no buffs; the outcome is `TargetDead` and nothing
    /// is attached, the same as for debuffs.
    pub fn add_buff(
        &mut self,
        target: InstanceId,
        mut effect: Effect,
    ) -> EngineResult<MutationOutcome> {
        if !self.require(target)?.is_alive() {
            return Ok(MutationOutcome::with_status(target, MutationStatus::TargetDead));
        }
        effect.is_debuff = false;
        let instance = self.attach_effect(target, effect)?;
        Ok(MutationOutcome {
            attached: Some(instance),
            ..MutationOutcome::applied(target, 0.0)
        })
    }

    /// Inflict a debuff through the interceptor chain.
    pub fn add_debuff(
        &mut self,
        source: Option<InstanceId>,
        target: InstanceId,
        effect: Effect,
    ) -> EngineResult<MutationOutcome> {
        self.apply_debuff(DebuffCall::new(source, target, effect))
    }

    /// Inflict a debuff described by a full call, including the ability that caused it.
    pub fn apply_debuff(&mut self, mut call: DebuffCall) -> EngineResult<MutationOutcome> {
        self.require(call.target)?;
        call.effect.is_debuff = true;
        Ok(self.dispatch(Mutation::Debuff(call), PipelinePass::new()))
    }

    /// Remove one effect instance. Returns false if it is already gone.
    pub fn remove_effect(
        &mut self,
        target: InstanceId,
        instance: EffectInstanceId,
    ) -> EngineResult<bool> {
        self.require(target)?;
        let Some(effect) = self.detach_effect(target, instance) else {
            return Ok(false);
        };
        self.refresh_after_removal(target, !effect.is_debuff);
        Ok(true)
    }

    /// Remove every stack with the given logical id. Returns how many were removed.
    pub fn remove_effects_by_id(
        &mut self,
        target: InstanceId,
        effect_id: &str,
    ) -> EngineResult<usize> {
        let instances: Vec<EffectInstanceId> = self
            .require(target)?
            .effects()
            .filter(|e| e.id == effect_id)
            .map(|e| e.instance)
            .collect();

        let mut buffs_changed = false;
        let mut removed = 0;
        for instance in instances {
            if let Some(effect) = self.detach_effect(target, instance) {
                buffs_changed |= !effect.is_debuff;
                removed += 1;
            }
        }
        if removed > 0 {
            self.refresh_after_removal(target, buffs_changed);
        }
        Ok(removed)
    }

    /// Run per-turn callbacks, count durations down and expire finished effects.
    ///
    /// Effects are visited in snapshot order (buffs, then debuffs). Effects
    /// attached while the turn is being processed are neither run nor counted
    /// down. Stats are recalculated once at the end.
    pub fn process_end_of_turn(&mut self, target: InstanceId) -> EngineResult<TurnReport> {
        let character = self.require(target)?;
        let mut report = TurnReport::new(target);
        if !character.is_alive() {
            return Ok(report);
        }
        let snapshot: Vec<EffectInstanceId> = character.effects().map(|e| e.instance).collect();

        for instance in &snapshot {
            if !self.roster.is_alive(target) {
                break;
            }
            let Some(effect) = self.roster.get(target).and_then(|c| c.find_effect(*instance)) else {
                continue;
            };
            let per_turn = effect.per_turn.clone();
            let (source, effect_id) = (effect.source, effect.id.clone());

            match per_turn {
                Some(PerTurnEffect::Damage { amount, damage_type }) => {
                    let call = DamageCall::new(source, target, amount, damage_type)
                        .with_ability(effect_id);
                    let outcome = self.dispatch(Mutation::Damage(call), PipelinePass::new());
                    if outcome.recipient == target {
                        match outcome.status {
                            MutationStatus::Applied => report.damage_taken += outcome.amount,
                            MutationStatus::Converted => report.healed += outcome.amount,
                            _ => {}
                        }
                    }
                }
                Some(PerTurnEffect::Heal { amount }) => {
                    let call = HealCall::new(source, target, amount).with_ability(effect_id);
                    let outcome = self.dispatch(Mutation::Heal(call), PipelinePass::new());
                    if outcome.is_applied() && outcome.recipient == target {
                        report.healed += outcome.amount;
                    }
                }
                Some(PerTurnEffect::RestoreMana { amount }) => {
                    report.mana_restored += self.restore_mana_directly(target, amount);
                }
                None => {}
            }
        }

        let mut expired = Vec::new();
        if let Some(character) = self.roster.get_mut(target) {
            for effect in character.buffs.iter_mut().chain(character.debuffs.iter_mut()) {
                if snapshot.contains(&effect.instance) && effect.duration.tick() {
                    expired.push(effect.instance);
                }
            }
        }

        let mut buffs_changed = false;
        for instance in expired {
            if let Some(effect) = self.detach_effect(target, instance) {
                buffs_changed |= !effect.is_debuff;
                report.expired.push(effect.id);
            }
        }

        self.refresh_after_removal(target, buffs_changed);
        Ok(report)
    }

    /// Append an effect to its list, run its apply hooks and recalculate.
    ///
    /// Stack-scaled effects are sized here from the stacks the recipient
    /// already carries.
    pub(super) fn attach_effect(
        &mut self,
        target: InstanceId,
        mut effect: Effect,
    ) -> EngineResult<EffectInstanceId> {
        let bounds = self.ctx.config.stat_bounds.clone();
        let character = self
            .roster
            .get_mut(target)
            .ok_or(EngineError::UnknownCharacter(target))?;

        if effect.stack_scaling.is_some() {
            effect.restack(character.count_effects(&effect.id));
        }
        let instance = effect.instance;
        let is_debuff = effect.is_debuff;
        let effect_id = effect.id.clone();
        let effect_name = effect.name.clone();
        let hooks = effect.hooks.clone();
        if is_debuff {
            character.debuffs.push(effect);
        } else {
            character.buffs.push(effect);
        }

        let toggles: Vec<BattleEvent> = hooks
            .iter()
            .filter_map(|h| apply_hook(character, h))
            .collect();
        character.recalculate_stats(&bounds);
        let name = character.name.clone();

        debug!(
            target: "raid_core::effects",
            character = %target,
            effect = %effect_id,
            %instance,
            is_debuff,
            "effect attached"
        );
        if is_debuff {
            self.ctx.info(format!("{name} is afflicted by {effect_name}"));
            self.ctx.publish(BattleEvent::DebuffApplied {
                target,
                effect_id,
                instance,
            });
        } else {
            self.ctx.info(format!("{name} gains {effect_name}"));
            self.ctx.publish(BattleEvent::BuffApplied {
                target,
                effect_id,
                instance,
            });
        }
        for event in toggles {
            self.ctx.publish(event);
        }

        if !is_debuff {
            self.notify_buffs_changed(target);
        }
        self.touch(target);
        Ok(instance)
    }

    /// Detach every finite effect from a character that just died.
    ///
    /// Each remove half runs here, once. Permanent effects stay attached.
    pub(super) fn clear_finite_effects(&mut self, target: InstanceId) {
        let finite: Vec<EffectInstanceId> = self
            .roster
            .get(target)
            .map(|c| c.effects().filter(|e| !e.is_permanent()).map(|e| e.instance).collect())
            .unwrap_or_default();
        for instance in finite {
            self.detach_effect(target, instance);
        }
        self.recalculate(target);
    }

    /// Take an effect out of its list and run its remove hooks. No recalculation.
    fn detach_effect(&mut self, target: InstanceId, instance: EffectInstanceId) -> Option<Effect> {
        let character = self.roster.get_mut(target)?;
        let in_buffs = character.buffs.iter().position(|e| e.instance == instance);
        let in_debuffs = character.debuffs.iter().position(|e| e.instance == instance);
        let effect = match (in_buffs, in_debuffs) {
            (Some(pos), _) => character.buffs.remove(pos),
            (None, Some(pos)) => character.debuffs.remove(pos),
            (None, None) => return None,
        };

        let toggles: Vec<BattleEvent> = effect
            .hooks
            .iter()
            .filter_map(|h| release_hook(character, h))
            .collect();
        let name = character.name.clone();

        debug!(
            target: "raid_core::effects",
            character = %target,
            effect = %effect.id,
            %instance,
            "effect removed"
        );
        self.ctx.info(format!("{} fades from {name}", effect.name));
        let event = if effect.is_debuff {
            BattleEvent::DebuffRemoved {
                target,
                effect_id: effect.id.clone(),
                instance,
            }
        } else {
            BattleEvent::BuffRemoved {
                target,
                effect_id: effect.id.clone(),
                instance,
            }
        };
        self.ctx.publish(event);
        for event in toggles {
            self.ctx.publish(event);
        }
        Some(effect)
    }

    fn refresh_after_removal(&mut self, target: InstanceId, buffs_changed: bool) {
        self.recalculate(target);
        if buffs_changed {
            self.notify_buffs_changed(target);
        }
        self.touch(target);
    }

    pub(super) fn recalculate(&mut self, target: InstanceId) {
        let bounds = &self.ctx.config.stat_bounds;
        if let Some(character) = self.roster.get_mut(target) {
            character.recalculate_stats(bounds);
        }
    }

    /// Let aura passives react to a change in `changed`'s buffs.
    pub(super) fn notify_buffs_changed(&mut self, changed: InstanceId) {
        let updates: Vec<AuraUpdate> = {
            let view = InterceptView {
                roster: &self.roster,
                config: &self.ctx.config,
            };
            self.interceptors
                .iter()
                .filter_map(|i| i.on_buffs_changed(changed, &view))
                .collect()
        };
        for update in updates {
            self.apply_aura(update);
        }
    }

    /// Create or update an aura buff in place. Does not notify other passives.
    pub(super) fn apply_aura(&mut self, update: AuraUpdate) {
        let bounds = self.ctx.config.stat_bounds.clone();
        let Some(character) = self.roster.get_mut(update.holder) else {
            return;
        };

        let mut applied = None;
        match character.buffs.iter().position(|e| e.id == update.effect.id) {
            Some(pos) => {
                let existing = &mut character.buffs[pos];
                if existing.stat_modifiers == update.effect.stat_modifiers {
                    return;
                }
                existing.stat_modifiers = update.effect.stat_modifiers;
                existing.description = update.effect.description;
            }
            None => {
                applied = Some((update.effect.id.clone(), update.effect.instance));
                character.buffs.push(update.effect);
            }
        }
        character.recalculate_stats(&bounds);

        debug!(target: "raid_core::effects", holder = %update.holder, "aura refreshed");
        if let Some((effect_id, instance)) = applied {
            self.ctx.publish(BattleEvent::BuffApplied {
                target: update.holder,
                effect_id,
                instance,
            });
        }
        self.touch(update.holder);
    }

    /// End-of-turn regeneration from `hp_per_turn` and `mana_per_turn`.
    pub(super) fn regenerate(&mut self, target: InstanceId, report: &mut TurnReport) {
        let Some((hp, mana)) = self
            .roster
            .get(target)
            .map(|c| (c.stats.hp_per_turn, c.stats.mana_per_turn))
        else {
            return;
        };
        if hp > 0.0 {
            let call = HealCall::new(Some(target), target, hp);
            let outcome = self.dispatch(Mutation::Heal(call), PipelinePass::new());
            if outcome.is_applied() && outcome.recipient == target {
                report.healed += outcome.amount;
            }
        }
        if mana > 0.0 {
            report.mana_restored += self.restore_mana_directly(target, mana);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abilities::AbilityRegistry;
    use crate::config::EngineConfig;
    use proptest::prelude::*;
    use raid_rules::{EffectDuration, Stat, StatBlock, StatModifier, Team};

    fn battle() -> (Battle, InstanceId) {
        let mut battle = Battle::new(EngineConfig::seeded(1), AbilityRegistry::new());
        let hero = battle.add_character(
            Character::new(
                "hero",
                "Hero",
                Team::Player,
                StatBlock {
                    physical_damage: 100.0,
                    ..Default::default()
                },
            )
            .with_ability("fireball"),
        );
        (battle, hero)
    }

    #[test]
    fn test_add_buff_recalculates() {
        let (mut battle, hero) = battle();
        let effect = Effect::new("might", "Might", "", EffectDuration::Turns(2), None, false)
            .with_modifier(StatModifier::add(Stat::PhysicalDamage, 25.0));

        battle.add_buff(hero, effect).unwrap();
        assert_eq!(battle.character(hero).unwrap().stats.physical_damage, 125.0);
    }

    #[test]
    fn test_remove_effect_is_idempotent() {
        let (mut battle, hero) = battle();
        let effect = Effect::new("might", "Might", "", EffectDuration::Turns(2), None, false)
            .with_modifier(StatModifier::add(Stat::PhysicalDamage, 25.0));
        let instance = battle.add_buff(hero, effect).unwrap().attached.unwrap();

        assert!(battle.remove_effect(hero, instance).unwrap());
        assert!(!battle.remove_effect(hero, instance).unwrap());
        assert_eq!(battle.character(hero).unwrap().stats.physical_damage, 100.0);
        assert_eq!(
            battle.events().count(|e| matches!(e, BattleEvent::BuffRemoved { .. })),
            1
        );
    }

    #[test]
    fn test_add_buff_to_dead_target_is_rejected() {
        let (mut battle, hero) = battle();
        battle
            .apply_damage(DamageCall::new(None, hero, 500.0, raid_rules::DamageType::True))
            .unwrap();

        let effect = Effect::new("might", "Might", "", EffectDuration::Turns(2), None, false)
            .with_modifier(StatModifier::add(Stat::PhysicalDamage, 25.0));
        let outcome = battle.add_buff(hero, effect).unwrap();

        assert_eq!(outcome.status, MutationStatus::TargetDead);
        assert!(outcome.attached.is_none());
        let hero = battle.character(hero).unwrap();
        assert!(hero.buffs.is_empty());
        assert_eq!(hero.stats.physical_damage, 100.0);
        assert_eq!(
            battle.events().count(|e| matches!(e, BattleEvent::BuffApplied { .. })),
            0
        );
    }

    #[test]
    fn test_death_detaches_finite_effects_only() {
        let (mut battle, hero) = battle();
        let stun = Effect::new("stun", "Stunned", "", EffectDuration::Turns(3), None, true)
            .with_hook(EffectHook::Stun);
        let curse = Effect::new("curse", "Curse", "", EffectDuration::Permanent, None, true);
        let might = Effect::new("might", "Might", "", EffectDuration::Turns(2), None, false)
            .with_modifier(StatModifier::add(Stat::PhysicalDamage, 25.0));
        battle.add_debuff(None, hero, stun).unwrap();
        battle.add_debuff(None, hero, curse).unwrap();
        battle.add_buff(hero, might).unwrap();

        battle
            .apply_damage(DamageCall::new(None, hero, 500.0, raid_rules::DamageType::True))
            .unwrap();

        let dead = battle.character(hero).unwrap();
        assert!(dead.buffs.is_empty());
        assert_eq!(dead.debuffs.len(), 1);
        assert_eq!(dead.debuffs[0].id, "curse");
        assert_eq!(dead.stun_count, 0);
        assert_eq!(dead.stats.physical_damage, 100.0);
        assert_eq!(
            battle.events().count(|e| matches!(e, BattleEvent::DebuffRemoved { .. })),
            1
        );
        assert_eq!(
            battle.events().count(|e| matches!(e, BattleEvent::BuffRemoved { .. })),
            1
        );
    }

    #[test]
    fn test_unknown_target_is_error() {
        let (mut battle, _) = battle();
        let ghost = InstanceId::new();
        let effect = Effect::new("x", "X", "", EffectDuration::Turns(1), None, false);

        assert!(matches!(
            battle.add_buff(ghost, effect.clone()),
            Err(EngineError::UnknownCharacter(id)) if id == ghost
        ));
        assert!(battle.add_debuff(None, ghost, effect).is_err());
        assert!(battle.process_end_of_turn(ghost).is_err());
    }

    #[test]
    fn test_stun_hook_counts() {
        let (mut battle, hero) = battle();
        let stun = Effect::new("stun", "Stunned", "", EffectDuration::Turns(1), None, true)
            .with_hook(EffectHook::Stun);
        let first = battle.add_debuff(None, hero, stun.instantiate()).unwrap();
        battle.add_debuff(None, hero, stun.instantiate()).unwrap();
        assert_eq!(battle.character(hero).unwrap().stun_count, 2);

        battle.remove_effect(hero, first.attached.unwrap()).unwrap();
        assert!(battle.character(hero).unwrap().is_stunned());

        battle.process_end_of_turn(hero).unwrap();
        assert!(!battle.character(hero).unwrap().is_stunned());
        assert!(battle.character(hero).unwrap().debuffs.is_empty());
    }

    #[test]
    fn test_permanent_effect_runs_every_turn_and_never_expires() {
        let (mut battle, hero) = battle();
        let bleed = Effect::new(
            "bleed",
            "Bleed",
            "",
            EffectDuration::Permanent,
            Some(PerTurnEffect::Damage {
                amount: 4.0,
                damage_type: raid_rules::DamageType::True,
            }),
            true,
        );
        battle.add_debuff(None, hero, bleed).unwrap();

        for _ in 0..5 {
            let report = battle.process_end_of_turn(hero).unwrap();
            assert_eq!(report.damage_taken, 4.0);
            assert!(report.expired.is_empty());
        }
        assert_eq!(battle.character(hero).unwrap().current_hp, 80.0);
        assert_eq!(battle.character(hero).unwrap().debuffs.len(), 1);
    }

    #[test]
    fn test_remove_effects_by_id() {
        let (mut battle, hero) = battle();
        let poison = Effect::new("poison", "Poison", "", EffectDuration::Turns(3), None, true);
        battle.add_debuff(None, hero, poison.instantiate()).unwrap();
        battle.add_debuff(None, hero, poison.instantiate()).unwrap();

        assert_eq!(battle.remove_effects_by_id(hero, "poison").unwrap(), 2);
        assert_eq!(battle.remove_effects_by_id(hero, "poison").unwrap(), 0);
    }

    proptest! {
        #[test]
        fn prop_overlapping_disables_release_once(
            durations in proptest::collection::vec(1u32..6, 1..5),
        ) {
            let (mut battle, hero) = battle();
            for turns in &durations {
                let duration = EffectDuration::Turns(*turns);
                let silence = Effect::new("silence", "Silence", "", duration, None, true)
                    .with_hook(EffectHook::DisableAbility { ability_id: "fireball".into() });
                battle.add_debuff(None, hero, silence).unwrap();
            }
            let longest = durations.iter().copied().max().unwrap_or(0);

            for turn in 1..=longest + 2 {
                battle.process_end_of_turn(hero).unwrap();
                let slot = battle.character(hero).unwrap().ability("fireball").unwrap().clone();
                prop_assert_eq!(slot.is_disabled(), turn < longest);
            }

            let slot = battle.character(hero).unwrap().ability("fireball").unwrap().clone();
            prop_assert_eq!(slot.disabled_by, 0);
            let events = battle.events();
            prop_assert_eq!(events.count(|e| matches!(e, BattleEvent::AbilityDisabled { .. })), 1);
            prop_assert_eq!(events.count(|e| matches!(e, BattleEvent::AbilityEnabled { .. })), 1);
        }
    }
}

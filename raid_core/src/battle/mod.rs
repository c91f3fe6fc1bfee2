//! The battle aggregate: roster, context, interceptor chain and ability registry.

mod lifecycle;
mod mutation;

pub use lifecycle::*;

use std::sync::Arc;
use tracing::{debug, warn};

use raid_rules::{Character, ContentPack, InstanceId, TargetType, Team};

use crate::abilities::{AbilityInvocation, AbilityOutcome, AbilityRegistry};
use crate::config::EngineConfig;
use crate::context::{BattleContext, BattleLog, BattleRng};
use crate::error::{EngineError, EngineResult};
use crate::events::{BattleEvent, EventBus, EventListener, Topic};
use crate::intercept::{
    passive_interceptor, InterceptView, Interceptor, InterceptorChain, TauntRedirect,
};
use crate::roster::Roster;
use crate::statistics::StatisticsManager;

/// One battle between the player and enemy teams.
pub struct Battle {
    roster: Roster,
    ctx: BattleContext,
    interceptors: InterceptorChain,
    abilities: AbilityRegistry,
}

impl Battle {
    /// Create an empty battle. The taunt redirect is always installed.
    pub fn new(config: EngineConfig, abilities: AbilityRegistry) -> Self {
        let mut battle = Self {
            roster: Roster::new(),
            ctx: BattleContext::new(config),
            interceptors: InterceptorChain::new(),
            abilities,
        };
        battle.install_interceptor(Arc::new(TauntRedirect));
        battle
    }

    /// Create a battle whose abilities come from a content pack.
    pub fn from_content(config: EngineConfig, pack: &ContentPack) -> EngineResult<Self> {
        Ok(Self::new(config, AbilityRegistry::from_content(pack)?))
    }

    /// Add a character and install its passive.
    pub fn add_character(&mut self, mut character: Character) -> InstanceId {
        character.recalculate_stats(&self.ctx.config.stat_bounds);
        let id = character.instance_id;
        let team = character.team;
        let name = character.name.clone();
        let passive = character.passive.clone();
        self.roster.insert(character);

        debug!(
            target: "raid_core::battle",
            character = %id,
            %team,
            name = %name,
            "character added"
        );
        self.ctx.info(format!("{name} joins the {team} side"));
        self.ctx.publish(BattleEvent::CharacterCreated { character: id, team });

        if let Some(spec) = passive {
            self.install_interceptor(passive_interceptor(&spec, id));
        }
        self.notify_buffs_changed(id);
        self.touch(id);
        id
    }

    /// Instantiate a content template on a team.
    pub fn spawn(
        &mut self,
        pack: &ContentPack,
        template_id: &str,
        team: Team,
    ) -> EngineResult<InstanceId> {
        let template = pack
            .character(template_id)
            .ok_or_else(|| EngineError::UnknownTemplate(template_id.to_string()))?;
        Ok(self.add_character(Character::from_template(template, team)))
    }

    /// Install an interceptor. Returns false if an identical one is already installed.
    pub fn install_interceptor(&mut self, interceptor: Arc<dyn Interceptor>) -> bool {
        let key = interceptor.key();
        if !self.interceptors.install(Arc::clone(&interceptor)) {
            debug!(
                target: "raid_core::pipeline",
                passive = key.passive,
                holder = ?key.holder,
                "interceptor already installed"
            );
            return false;
        }
        debug!(
            target: "raid_core::pipeline",
            passive = key.passive,
            holder = ?key.holder,
            priority = interceptor.priority(),
            "interceptor installed"
        );

        let update = {
            let view = InterceptView {
                roster: &self.roster,
                config: &self.ctx.config,
            };
            interceptor.on_installed(&view)
        };
        if let Some(update) = update {
            self.apply_aura(update);
        }
        true
    }

    /// A character by instance id. Dead characters stay in the roster.
    pub fn character(&self, id: InstanceId) -> Option<&Character> {
        self.roster.get(id)
    }

    fn require(&self, id: InstanceId) -> EngineResult<&Character> {
        self.roster.get(id).ok_or(EngineError::UnknownCharacter(id))
    }

    /// Both teams.
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Services owned by this battle.
    pub fn context(&self) -> &BattleContext {
        &self.ctx
    }

    /// Configuration this battle was created with.
    pub fn config(&self) -> &EngineConfig {
        &self.ctx.config
    }

    /// Event bus, including the bounded journal of recent events.
    pub fn events(&self) -> &EventBus {
        &self.ctx.events
    }

    /// Mutable event bus, for subscribing or draining the journal.
    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.ctx.events
    }

    /// Subscribe a listener to one topic.
    pub fn subscribe(&mut self, topic: Topic, listener: Arc<dyn EventListener>) {
        self.ctx.events.subscribe(topic, listener);
    }

    /// Player-facing battle log.
    pub fn log(&self) -> &BattleLog {
        &self.ctx.log
    }

    /// Damage and healing statistics.
    pub fn statistics(&self) -> &StatisticsManager {
        &self.ctx.statistics
    }

    /// The battle's only RNG.
    pub fn rng_mut(&mut self) -> &mut BattleRng {
        &mut self.ctx.rng
    }

    /// Registered ability handlers.
    pub fn abilities(&self) -> &AbilityRegistry {
        &self.abilities
    }

    /// Installed interceptors in dispatch order.
    pub fn interceptors(&self) -> &InterceptorChain {
        &self.interceptors
    }

    /// Current turn number, starting at 1.
    pub fn turn(&self) -> u32 {
        self.ctx.turn
    }

    /// The winning team once the other one has no living members.
    pub fn winner(&self) -> Option<Team> {
        match (
            self.roster.is_defeated(Team::Player),
            self.roster.is_defeated(Team::Enemy),
        ) {
            (false, true) => Some(Team::Player),
            (true, false) => Some(Team::Enemy),
            _ => None,
        }
    }

    /// Recompute a character's stats after an out-of-band change to its modifiers.
    pub fn recalculate_stats(&mut self, id: InstanceId) -> EngineResult<()> {
        self.require(id)?;
        self.recalculate(id);
        self.touch(id);
        Ok(())
    }

    /// Use an ability.
    ///
    /// Gameplay failures (dead caster or target, stun, disable, cooldown,
    /// mana) return a failed outcome and change nothing. Unknown ids are errors.
    pub fn use_ability(
        &mut self,
        caster: InstanceId,
        ability_id: &str,
        targets: &[InstanceId],
    ) -> EngineResult<AbilityOutcome> {
        let character = self.require(caster)?;
        let name = character.name.clone();
        let alive = character.is_alive();
        let stunned = character.is_stunned();
        let mana = character.current_mana;
        let slot = character.ability(ability_id).cloned();

        let definition = self
            .abilities
            .definition(ability_id)
            .cloned()
            .ok_or_else(|| EngineError::UnknownAbility(ability_id.to_string()))?;

        if !alive {
            return Ok(self.reject(&name, &definition.name, "caster is dead"));
        }
        let slot = slot.ok_or_else(|| EngineError::AbilityNotOwned {
            character: caster,
            ability: ability_id.to_string(),
        })?;
        if stunned {
            return Ok(self.reject(&name, &definition.name, "caster is stunned"));
        }
        if slot.is_disabled() {
            return Ok(self.reject(&name, &definition.name, "ability is disabled"));
        }
        if slot.cooldown_remaining > 0 {
            let reason = format!("on cooldown for {} more turns", slot.cooldown_remaining);
            return Ok(self.reject(&name, &definition.name, &reason));
        }
        if mana < definition.mana_cost {
            return Ok(self.reject(&name, &definition.name, "not enough mana"));
        }
        let resolved = match self.resolve_targets(caster, definition.target_type, targets) {
            Ok(resolved) => resolved,
            Err(reason) => return Ok(self.reject(&name, &definition.name, &reason)),
        };
        let Some(handler) = self.abilities.handler(ability_id) else {
            warn!(target: "raid_core::abilities", ability = ability_id, "no handler registered");
            return Ok(self.reject(&name, &definition.name, "ability has no handler"));
        };

        if let Some(character) = self.roster.get_mut(caster) {
            character.current_mana -= definition.mana_cost;
            if let Some(slot) = character.ability_mut(ability_id) {
                slot.cooldown_remaining = definition.cooldown;
            }
        }
        self.ctx.combat(format!("{name} uses {}", definition.name));
        self.ctx.publish(BattleEvent::AbilityUsed {
            caster,
            ability_id: definition.id.clone(),
            targets: resolved.clone(),
        });

        let invocation = AbilityInvocation {
            caster,
            targets: resolved,
            definition,
        };
        let outcome = handler.execute(self, &invocation)?;
        debug!(
            target: "raid_core::abilities",
            ability = ability_id,
            kind = invocation.definition.effect.kind(),
            damage = outcome.damage,
            healing = outcome.healing,
            "ability resolved"
        );
        self.touch(caster);
        Ok(outcome)
    }

    fn reject(&mut self, caster: &str, ability: &str, reason: &str) -> AbilityOutcome {
        debug!(target: "raid_core::abilities", caster, ability, reason, "ability rejected");
        self.ctx.info(format!("{caster} cannot use {ability}: {reason}"));
        AbilityOutcome::failed(reason)
    }

    fn resolve_targets(
        &self,
        caster: InstanceId,
        target_type: TargetType,
        requested: &[InstanceId],
    ) -> Result<Vec<InstanceId>, String> {
        let team = self
            .roster
            .get(caster)
            .map(|c| c.team)
            .ok_or_else(|| "caster is not in this battle".to_string())?;

        let resolved = match target_type {
            TargetType::SelfTarget => vec![caster],
            TargetType::AllAllies => self.roster.living_on_team(team),
            TargetType::AllEnemies => self.roster.living_on_team(team.opponent()),
            TargetType::Enemy | TargetType::Ally => {
                let Some(&target) = requested.first() else {
                    return Err("no target selected".to_string());
                };
                let Some(character) = self.roster.get(target) else {
                    return Err(format!("target {target} is not in this battle"));
                };
                if !character.is_alive() {
                    return Err(format!("{} is dead", character.name));
                }
                if target_type.is_friendly() != (character.team == team) {
                    return Err(format!("{} is not a valid target", character.name));
                }
                vec![target]
            }
        };

        if resolved.is_empty() {
            return Err("no valid targets".to_string());
        }
        Ok(resolved)
    }

    /// End a team's turn: per-turn effects, countdowns, regeneration and cooldowns.
    pub fn end_turn(&mut self, team: Team) -> Vec<TurnReport> {
        let members = self.roster.living_on_team(team);
        let mut reports = Vec::with_capacity(members.len());

        for id in members {
            let Ok(mut report) = self.process_end_of_turn(id) else {
                continue;
            };
            if self.ctx.config.regeneration && self.roster.is_alive(id) {
                self.regenerate(id, &mut report);
            }
            if let Some(character) = self.roster.get_mut(id) {
                for slot in &mut character.abilities {
                    slot.tick_cooldown();
                }
            }
            reports.push(report);
        }

        let turn = self.ctx.turn;
        debug!(target: "raid_core::battle", %team, turn, "turn ended");
        self.ctx.publish(BattleEvent::TurnEnded { team, turn });
        self.ctx.turn += 1;
        reports
    }

    /// Publish a UI refresh for one character.
    fn touch(&mut self, id: InstanceId) {
        self.ctx.publish(BattleEvent::CharacterUpdated { character: id });
    }
}

//! Ability handlers and the registry that maps ability ids to them.
//!
//! A handler turns one validated invocation into damage, healing and effects
//! using the battle's public mutation API. Validation (caster state, cooldown,
//! mana, targets) happens in [`Battle::use_ability`] before a handler runs.

mod control;
mod offense;
mod support;

pub use control::*;
pub use offense::*;
pub use support::*;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use raid_rules::{AbilityDefinition, AbilityEffectSpec, ContentPack, InstanceId};

use crate::battle::Battle;
use crate::error::EngineResult;

/// One validated use of an ability.
#[derive(Debug, Clone)]
pub struct AbilityInvocation {
    pub caster: InstanceId,
    /// Resolved, living targets.
    pub targets: Vec<InstanceId>,
    pub definition: AbilityDefinition,
}

impl AbilityInvocation {
    pub fn ability_id(&self) -> &str {
        &self.definition.id
    }
}

/// Result of an ability, fed to statistics and the UI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AbilityOutcome {
    pub success: bool,
    pub damage: f64,
    pub healing: f64,
    pub reason: Option<String>,
}

impl AbilityOutcome {
    pub fn succeeded() -> Self {
        Self {
            success: true,
            ..Default::default()
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            reason: Some(reason.into()),
            ..Default::default()
        }
    }
}

/// Statically typed effect of one ability kind.
pub trait AbilityHandler: Send + Sync {
    fn execute(
        &self,
        battle: &mut Battle,
        invocation: &AbilityInvocation,
    ) -> EngineResult<AbilityOutcome>;
}

/// Build the built-in handler for a definition's effect kind.
pub fn builtin_handler(definition: &AbilityDefinition) -> EngineResult<Arc<dyn AbilityHandler>> {
    let handler: Arc<dyn AbilityHandler> = match &definition.effect {
        AbilityEffectSpec::Strike {
            base,
            scaling,
            ratio,
            damage_type,
            hits,
        } => Arc::new(StrikeHandler {
            base: *base,
            scaling: *scaling,
            ratio: *ratio,
            damage_type: *damage_type,
            hits: *hits,
        }),
        AbilityEffectSpec::Heal { base, scaling, ratio } => Arc::new(HealHandler {
            base: *base,
            scaling: *scaling,
            ratio: *ratio,
        }),
        AbilityEffectSpec::Poison { per_stack, duration } => Arc::new(PoisonHandler {
            per_stack: *per_stack,
            duration: *duration,
        }),
        AbilityEffectSpec::StatBuff { .. } => {
            Arc::new(StatBuffHandler::from_definition(definition)?)
        }
        AbilityEffectSpec::Disable { duration } => Arc::new(DisableHandler { duration: *duration }),
        AbilityEffectSpec::Stun { duration } => Arc::new(StunHandler { duration: *duration }),
        AbilityEffectSpec::Taunt { duration, armor_bonus } => Arc::new(TauntHandler {
            duration: *duration,
            armor_bonus: *armor_bonus,
        }),
    };
    Ok(handler)
}

/// Ability definitions and their handlers, populated at startup.
#[derive(Clone, Default)]
pub struct AbilityRegistry {
    definitions: HashMap<String, AbilityDefinition>,
    handlers: HashMap<String, Arc<dyn AbilityHandler>>,
}

impl AbilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every ability in a content pack with its built-in handler.
    pub fn from_content(pack: &ContentPack) -> EngineResult<Self> {
        let mut registry = Self::new();
        for definition in &pack.abilities {
            let handler = builtin_handler(definition)?;
            registry.register(definition.clone(), handler);
        }
        debug!(target: "raid_core::abilities", count = registry.len(), "ability registry built");
        Ok(registry)
    }

    /// Register or replace an ability and its handler.
    pub fn register(&mut self, definition: AbilityDefinition, handler: Arc<dyn AbilityHandler>) {
        self.handlers.insert(definition.id.clone(), handler);
        self.definitions.insert(definition.id.clone(), definition);
    }

    /// Register a definition whose handler will be supplied later.
    pub fn define(&mut self, definition: AbilityDefinition) {
        self.definitions.insert(definition.id.clone(), definition);
    }

    pub fn definition(&self, ability_id: &str) -> Option<&AbilityDefinition> {
        self.definitions.get(ability_id)
    }

    pub fn handler(&self, ability_id: &str) -> Option<Arc<dyn AbilityHandler>> {
        self.handlers.get(ability_id).cloned()
    }

    pub fn contains(&self, ability_id: &str) -> bool {
        self.definitions.contains_key(ability_id)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

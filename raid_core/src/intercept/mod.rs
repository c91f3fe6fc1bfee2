//! Passive interception layer.
//!
//! Every damage, heal and debuff call is a [`Mutation`] dispatched through the
//! battle's [`InterceptorChain`] before it reaches the innermost apply step.
//!
//! # Pipeline pass
//!
//! - Interceptors run in priority order (lower first)
//! - An interceptor that redirects or converts a call is marked visited and is
//!   skipped for the rest of the pass, so it cannot re-enter itself
//! - The number of redirects per pass is capped by `max_redirect_depth`
//! - Follow-up mutations run after the original call has been applied
//!
//! The dispatch loop itself lives on [`crate::Battle`].

mod passives;

pub use passives::*;

use std::sync::Arc;

use raid_rules::{DamageType, Effect, EffectInstanceId, InstanceId};

use crate::config::EngineConfig;
use crate::context::BattleRng;
use crate::roster::Roster;

#[derive(Debug, Clone, PartialEq)]
pub struct DamageCall {
    pub source: Option<InstanceId>,
    pub target: InstanceId,
    pub amount: f64,
    pub damage_type: DamageType,
    pub ability_id: Option<String>,
    pub is_critical: bool,
}

impl DamageCall {
    pub fn new(
        source: Option<InstanceId>,
        target: InstanceId,
        amount: f64,
        damage_type: DamageType,
    ) -> Self {
        Self {
            source,
            target,
            amount,
            damage_type,
            ability_id: None,
            is_critical: false,
        }
    }

    pub fn with_ability(mut self, ability_id: impl Into<String>) -> Self {
        self.ability_id = Some(ability_id.into());
        self
    }

    pub fn critical(mut self, is_critical: bool) -> Self {
        self.is_critical = is_critical;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HealCall {
    pub source: Option<InstanceId>,
    pub target: InstanceId,
    pub amount: f64,
    pub ability_id: Option<String>,
}

impl HealCall {
    pub fn new(source: Option<InstanceId>, target: InstanceId, amount: f64) -> Self {
        Self {
            source,
            target,
            amount,
            ability_id: None,
        }
    }

    pub fn with_ability(mut self, ability_id: impl Into<String>) -> Self {
        self.ability_id = Some(ability_id.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DebuffCall {
    pub source: Option<InstanceId>,
    pub target: InstanceId,
    pub effect: Effect,
    pub ability_id: Option<String>,
}

impl DebuffCall {
    pub fn new(source: Option<InstanceId>, target: InstanceId, effect: Effect) -> Self {
        Self {
            source,
            target,
            effect,
            ability_id: None,
        }
    }

    pub fn with_ability(mut self, ability_id: impl Into<String>) -> Self {
        self.ability_id = Some(ability_id.into());
        self
    }
}

/// A pending change to one character.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Damage(DamageCall),
    Heal(HealCall),
    Debuff(DebuffCall),
}

impl Mutation {
    pub fn target(&self) -> InstanceId {
        match self {
            Mutation::Damage(call) => call.target,
            Mutation::Heal(call) => call.target,
            Mutation::Debuff(call) => call.target,
        }
    }

    pub fn source(&self) -> Option<InstanceId> {
        match self {
            Mutation::Damage(call) => call.source,
            Mutation::Heal(call) => call.source,
            Mutation::Debuff(call) => call.source,
        }
    }

    pub fn ability_id(&self) -> Option<&str> {
        match self {
            Mutation::Damage(call) => call.ability_id.as_deref(),
            Mutation::Heal(call) => call.ability_id.as_deref(),
            Mutation::Debuff(call) => call.ability_id.as_deref(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Mutation::Damage(_) => "damage",
            Mutation::Heal(_) => "heal",
            Mutation::Debuff(_) => "debuff",
        }
    }

    /// Same call aimed at a different recipient.
    pub fn retarget(mut self, to: InstanceId) -> Self {
        match &mut self {
            Mutation::Damage(call) => call.target = to,
            Mutation::Heal(call) => call.target = to,
            Mutation::Debuff(call) => call.target = to,
        }
        self
    }

    /// Damage becomes a heal of the same amount. Other mutations are unchanged.
    pub fn into_heal(self) -> Self {
        match self {
            Mutation::Damage(call) => Mutation::Heal(HealCall {
                source: call.source,
                target: call.target,
                amount: call.amount,
                ability_id: call.ability_id,
            }),
            other => other,
        }
    }
}

/// What an interceptor decided to do with a mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Interception {
    /// Not interested; continue down the chain.
    Pass,
    /// Send the whole mutation to another character.
    Redirect { to: InstanceId },
    /// Drop the mutation.
    Block { reason: String },
    /// Turn damage into healing.
    ConvertToHeal,
    /// Let the mutation through and dispatch these afterwards.
    FollowUp(Vec<Mutation>),
}

/// Identity of an installed interceptor: passive name plus holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InterceptorKey {
    pub passive: &'static str,
    /// `None` for battle-wide interceptors.
    pub holder: Option<InstanceId>,
}

/// Read-only battle state handed to interceptors.
#[derive(Clone, Copy)]
pub struct InterceptView<'a> {
    pub roster: &'a Roster,
    pub config: &'a EngineConfig,
}

/// A permanent buff an aura-type passive wants on its holder.
#[derive(Debug, Clone, PartialEq)]
pub struct AuraUpdate {
    pub holder: InstanceId,
    pub effect: Effect,
}

/// A passive that can inspect and substitute mutations.
///
/// Interceptors are stateless with respect to the battle: everything they need
/// is in the view. Lower priority values run first.
pub trait Interceptor: Send + Sync {
    fn key(&self) -> InterceptorKey;

    fn priority(&self) -> i32 {
        0
    }

    fn intercept(
        &self,
        mutation: &Mutation,
        view: &InterceptView<'_>,
        rng: &mut BattleRng,
    ) -> Interception;

    /// Called after `changed` gained or lost a buff.
    fn on_buffs_changed(
        &self,
        _changed: InstanceId,
        _view: &InterceptView<'_>,
    ) -> Option<AuraUpdate> {
        None
    }

    /// Called once right after installation.
    fn on_installed(&self, _view: &InterceptView<'_>) -> Option<AuraUpdate> {
        None
    }
}

/// Ordered set of installed interceptors, unique by key.
#[derive(Clone, Default)]
pub struct InterceptorChain {
    entries: Vec<Arc<dyn Interceptor>>,
}

impl InterceptorChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install an interceptor. Returns false if one with the same key exists.
    pub fn install(&mut self, interceptor: Arc<dyn Interceptor>) -> bool {
        let key = interceptor.key();
        if self.contains(&key) {
            return false;
        }
        self.entries.push(interceptor);
        self.entries.sort_by_key(|i| i.priority());
        true
    }

    pub fn uninstall(&mut self, key: &InterceptorKey) -> bool {
        let before = self.entries.len();
        self.entries.retain(|i| i.key() != *key);
        self.entries.len() != before
    }

    pub fn contains(&self, key: &InterceptorKey) -> bool {
        self.entries.iter().any(|i| i.key() == *key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Interceptor>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys and priorities in execution order.
    pub fn keys(&self) -> impl Iterator<Item = (InterceptorKey, i32)> + '_ {
        self.entries.iter().map(|i| (i.key(), i.priority()))
    }
}

/// Per-dispatch bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct PipelinePass {
    visited: Vec<InterceptorKey>,
    pub depth: u32,
}

impl PipelinePass {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visited(&self, key: &InterceptorKey) -> bool {
        self.visited.contains(key)
    }

    pub fn visit(&mut self, key: InterceptorKey) {
        if !self.is_visited(&key) {
            self.visited.push(key);
        }
    }

    /// A pass for a nested dispatch, inheriting the visited set.
    pub fn nested(&self) -> Self {
        Self {
            visited: self.visited.clone(),
            depth: self.depth + 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationStatus {
    Applied,
    /// Damage landed as healing of `amount`.
    Converted,
    Dodged,
    Blocked,
    TargetDead,
}

/// Where a mutation finally landed and how much it did.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationOutcome {
    /// The character that actually received the mutation.
    pub recipient: InstanceId,
    /// Damage dealt or healing done after mitigation and caps.
    pub amount: f64,
    pub status: MutationStatus,
    /// Set when a debuff was attached.
    pub attached: Option<EffectInstanceId>,
}

impl MutationOutcome {
    pub fn applied(recipient: InstanceId, amount: f64) -> Self {
        Self {
            recipient,
            amount,
            status: MutationStatus::Applied,
            attached: None,
        }
    }

    pub fn with_status(recipient: InstanceId, status: MutationStatus) -> Self {
        Self {
            recipient,
            amount: 0.0,
            status,
            attached: None,
        }
    }

    pub fn is_applied(&self) -> bool {
        self.status == MutationStatus::Applied
    }
}

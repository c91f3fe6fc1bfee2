//! Built-in passives.

use std::sync::Arc;

use raid_rules::{DamageType, Effect, EffectDuration, InstanceId, PassiveSpec, Stat, StatModifier};

use super::{
    AuraUpdate, DamageCall, InterceptView, Interception, Interceptor, InterceptorKey, Mutation,
};
use crate::context::BattleRng;

pub const TAUNT_REDIRECT: &str = "taunt_redirect";
pub const ALLY_REDIRECT: &str = "ally_redirect";
pub const MOLTEN_AURA: &str = "molten_aura";
pub const FORGE_MASTERY: &str = "forge_mastery";
pub const TREE_IMMUNITY: &str = "tree_immunity";

/// Build the interceptor for a character's passive.
pub fn passive_interceptor(spec: &PassiveSpec, holder: InstanceId) -> Arc<dyn Interceptor> {
    match spec {
        PassiveSpec::AllyRedirect => Arc::new(AllyRedirect { holder }),
        PassiveSpec::MoltenAura { ratio } => Arc::new(MoltenAura {
            holder,
            ratio: *ratio,
        }),
        PassiveSpec::ForgeMastery { per_buff } => Arc::new(ForgeMastery {
            holder,
            per_buff: *per_buff,
        }),
        PassiveSpec::TreeImmunity { healing_sources } => Arc::new(TreeImmunity {
            holder,
            healing_sources: healing_sources.clone(),
        }),
    }
}

/// Damage aimed at a taunt holder's teammate goes to the taunt holder.
///
/// Installed in every battle.
#[derive(Debug, Default)]
pub struct TauntRedirect;

impl Interceptor for TauntRedirect {
    fn key(&self) -> InterceptorKey {
        InterceptorKey {
            passive: TAUNT_REDIRECT,
            holder: None,
        }
    }

    fn priority(&self) -> i32 {
        -10
    }

    fn intercept(
        &self,
        mutation: &Mutation,
        view: &InterceptView<'_>,
        _: &mut BattleRng,
    ) -> Interception {
        let Mutation::Damage(call) = mutation else {
            return Interception::Pass;
        };
        match view.roster.taunt_holder_for(call.target) {
            Some(holder) => Interception::Redirect { to: holder },
            None => Interception::Pass,
        }
    }
}

/// Damage and debuffs aimed at the holder land on a random living ally.
#[derive(Debug)]
pub struct AllyRedirect {
    pub holder: InstanceId,
}

impl Interceptor for AllyRedirect {
    fn key(&self) -> InterceptorKey {
        InterceptorKey {
            passive: ALLY_REDIRECT,
            holder: Some(self.holder),
        }
    }

    fn intercept(
        &self,
        mutation: &Mutation,
        view: &InterceptView<'_>,
        rng: &mut BattleRng,
    ) -> Interception {
        if matches!(mutation, Mutation::Heal(_)) || mutation.target() != self.holder {
            return Interception::Pass;
        }
        let allies = view.roster.allies_of(self.holder);
        match rng.pick(&allies) {
            Some(ally) => Interception::Redirect { to: *ally },
            None => Interception::Pass,
        }
    }
}

/// Casters who damage the holder take a share of the holder's magical damage back.
#[derive(Debug)]
pub struct MoltenAura {
    pub holder: InstanceId,
    pub ratio: f64,
}

impl Interceptor for MoltenAura {
    fn key(&self) -> InterceptorKey {
        InterceptorKey {
            passive: MOLTEN_AURA,
            holder: Some(self.holder),
        }
    }

    fn priority(&self) -> i32 {
        10
    }

    fn intercept(
        &self,
        mutation: &Mutation,
        view: &InterceptView<'_>,
        _: &mut BattleRng,
    ) -> Interception {
        let Mutation::Damage(call) = mutation else {
            return Interception::Pass;
        };
        if call.target != self.holder {
            return Interception::Pass;
        }
        let attacker = call.source.filter(|c| *c != self.holder && view.roster.is_alive(*c));
        let Some(caster) = attacker else {
            return Interception::Pass;
        };
        let Some(holder) = view.roster.get(self.holder) else {
            return Interception::Pass;
        };

        let amount = holder.stats.magical_damage * self.ratio;
        if amount <= 0.0 {
            return Interception::Pass;
        }
        Interception::FollowUp(vec![Mutation::Damage(
            DamageCall::new(Some(self.holder), caster, amount, DamageType::Magical)
                .with_ability(MOLTEN_AURA),
        )])
    }
}

/// The holder's armor and magical shield grow with the buffs on its allies.
#[derive(Debug)]
pub struct ForgeMastery {
    pub holder: InstanceId,
    pub per_buff: f64,
}

impl ForgeMastery {
    fn aura(&self, view: &InterceptView<'_>) -> Option<AuraUpdate> {
        if !view.roster.is_alive(self.holder) {
            return None;
        }
        let ally_buffs: usize = view
            .roster
            .allies_of(self.holder)
            .into_iter()
            .filter_map(|ally| view.roster.get(ally))
            .map(|ally| ally.buffs.len())
            .sum();
        let bonus = self.per_buff * ally_buffs as f64;

        let effect = Effect::new(
            FORGE_MASTERY,
            "Forge Mastery",
            "forge_mastery.png",
            EffectDuration::Permanent,
            None,
            false,
        )
        .with_modifier(StatModifier::add(Stat::Armor, bonus))
        .with_modifier(StatModifier::add(Stat::MagicalShield, bonus))
        .with_description(format!(
            "+{bonus} armor and magical shield from {ally_buffs} allied buffs"
        ))
        .with_source(self.holder);

        Some(AuraUpdate {
            holder: self.holder,
            effect,
        })
    }
}

impl Interceptor for ForgeMastery {
    fn key(&self) -> InterceptorKey {
        InterceptorKey {
            passive: FORGE_MASTERY,
            holder: Some(self.holder),
        }
    }

    fn priority(&self) -> i32 {
        100
    }

    fn intercept(&self, _: &Mutation, _: &InterceptView<'_>, _: &mut BattleRng) -> Interception {
        Interception::Pass
    }

    fn on_buffs_changed(
        &self,
        changed: InstanceId,
        view: &InterceptView<'_>,
    ) -> Option<AuraUpdate> {
        if changed == self.holder || !view.roster.same_team(changed, self.holder) {
            return None;
        }
        self.aura(view)
    }

    fn on_installed(&self, view: &InterceptView<'_>) -> Option<AuraUpdate> {
        self.aura(view)
    }
}

/// The holder ignores abilities, except whitelisted damage sources which heal it.
#[derive(Debug)]
pub struct TreeImmunity {
    pub holder: InstanceId,
    pub healing_sources: Vec<String>,
}

impl TreeImmunity {
    fn is_whitelisted(&self, mutation: &Mutation) -> bool {
        mutation
            .ability_id()
            .is_some_and(|id| self.healing_sources.iter().any(|s| s == id))
    }
}

impl Interceptor for TreeImmunity {
    fn key(&self) -> InterceptorKey {
        InterceptorKey {
            passive: TREE_IMMUNITY,
            holder: Some(self.holder),
        }
    }

    fn priority(&self) -> i32 {
        -20
    }

    fn intercept(
        &self,
        mutation: &Mutation,
        _: &InterceptView<'_>,
        _: &mut BattleRng,
    ) -> Interception {
        if mutation.target() != self.holder {
            return Interception::Pass;
        }
        match mutation {
            Mutation::Heal(_) => Interception::Pass,
            Mutation::Damage(_) if self.is_whitelisted(mutation) => Interception::ConvertToHeal,
            Mutation::Debuff(_) if self.is_whitelisted(mutation) => Interception::Pass,
            _ => Interception::Block {
                reason: format!("immune to {}", mutation.ability_id().unwrap_or("direct damage")),
            },
        }
    }
}

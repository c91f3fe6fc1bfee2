//! Game mechanics: damage types, targeting, teams.

use serde::{Deserialize, Serialize};

/// All damage types in the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageType {
    /// Reduced by armor.
    Physical,
    /// Reduced by magical shield.
    Magical,
    /// Bypasses mitigation and dodge.
    True,
}

impl DamageType {
    /// Whether this damage can be dodged or mitigated.
    pub fn is_mitigated(&self) -> bool {
        !matches!(self, DamageType::True)
    }
}

/// Which characters an ability may target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    Enemy,
    Ally,
    #[serde(rename = "self")]
    SelfTarget,
    AllEnemies,
    AllAllies,
}

impl TargetType {
    /// Whether the caster picks a single explicit target.
    pub fn is_single(&self) -> bool {
        matches!(self, TargetType::Enemy | TargetType::Ally)
    }

    /// Whether valid targets are on the caster's own team.
    pub fn is_friendly(&self) -> bool {
        matches!(
            self,
            TargetType::Ally | TargetType::SelfTarget | TargetType::AllAllies
        )
    }
}

/// The two rosters in a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    Player,
    Enemy,
}

impl Team {
    /// The opposing team.
    pub fn opponent(&self) -> Team {
        match self {
            Team::Player => Team::Enemy,
            Team::Enemy => Team::Player,
        }
    }
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Team::Player => write!(f, "PLAYER"),
            Team::Enemy => write!(f, "ENEMY"),
        }
    }
}

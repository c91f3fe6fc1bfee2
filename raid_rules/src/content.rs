//! Content packs - ability definitions and character templates loaded from TOML or JSON.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use crate::abilities::AbilityDefinition;
use crate::entities::StatBlock;
use crate::error::{RulesError, RulesResult};

const BUILTIN_ROSTER: &str = include_str!("../content/roster.toml");

/// Passive behaviour attached to a character template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PassiveSpec {
    /// Damage and debuffs aimed at the holder go to a random living ally.
    AllyRedirect,
    /// Attackers take `ratio` of the holder's magical damage back.
    MoltenAura {
        #[serde(default = "default_molten_ratio")]
        ratio: f64,
    },
    /// Armor and magical shield scale with the number of buffs on allies.
    ForgeMastery {
        #[serde(default = "default_forge_per_buff")]
        per_buff: f64,
    },
    /// Immune to abilities except `healing_sources`, which heal instead.
    TreeImmunity {
        #[serde(default)]
        healing_sources: Vec<String>,
    },
}

fn default_molten_ratio() -> f64 {
    0.2
}

fn default_forge_per_buff() -> f64 {
    5.0
}

impl PassiveSpec {
    pub fn name(&self) -> &'static str {
        match self {
            PassiveSpec::AllyRedirect => "ally_redirect",
            PassiveSpec::MoltenAura { .. } => "molten_aura",
            PassiveSpec::ForgeMastery { .. } => "forge_mastery",
            PassiveSpec::TreeImmunity { .. } => "tree_immunity",
        }
    }
}

/// Template from which character instances are created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterTemplate {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub base_stats: StatBlock,
    #[serde(default)]
    pub abilities: Vec<String>,
    #[serde(default)]
    pub passive: Option<PassiveSpec>,
}

/// A validated set of abilities and character templates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentPack {
    #[serde(default)]
    pub abilities: Vec<AbilityDefinition>,
    #[serde(default)]
    pub characters: Vec<CharacterTemplate>,
}

impl ContentPack {
    /// Parse and validate a TOML content pack.
    pub fn from_toml_str(source: &str) -> RulesResult<Self> {
        let pack: ContentPack = toml::from_str(source)?;
        pack.validate()?;
        Ok(pack)
    }

    /// Parse and validate a JSON content pack.
    pub fn from_json_str(source: &str) -> RulesResult<Self> {
        let pack: ContentPack = serde_json::from_str(source)?;
        pack.validate()?;
        Ok(pack)
    }

    /// The content pack shipped with the crate.
    pub fn builtin() -> RulesResult<Self> {
        Self::from_toml_str(BUILTIN_ROSTER)
    }

    /// Check id uniqueness and that every template ability exists.
    pub fn validate(&self) -> RulesResult<()> {
        let mut ability_ids = HashSet::new();
        for ability in &self.abilities {
            if !ability_ids.insert(ability.id.as_str()) {
                return Err(RulesError::DuplicateId {
                    kind: "ability",
                    id: ability.id.clone(),
                });
            }
        }

        let mut template_ids = HashSet::new();
        for template in &self.characters {
            if !template_ids.insert(template.id.as_str()) {
                return Err(RulesError::DuplicateId {
                    kind: "character",
                    id: template.id.clone(),
                });
            }
            if let Some(missing) = template
                .abilities
                .iter()
                .find(|id| !ability_ids.contains(id.as_str()))
            {
                return Err(RulesError::MissingTemplateAbility {
                    template: template.id.clone(),
                    ability: missing.clone(),
                });
            }
        }

        debug!(
            target: "raid_rules::content",
            abilities = self.abilities.len(),
            characters = self.characters.len(),
            "content pack validated"
        );
        Ok(())
    }

    pub fn ability(&self, id: &str) -> Option<&AbilityDefinition> {
        self.abilities.iter().find(|a| a.id == id)
    }

    pub fn character(&self, id: &str) -> Option<&CharacterTemplate> {
        self.characters.iter().find(|c| c.id == id)
    }

    /// Merge another pack in, replacing entries with the same id.
    pub fn merge(&mut self, other: ContentPack) -> RulesResult<()> {
        for ability in other.abilities {
            self.abilities.retain(|a| a.id != ability.id);
            self.abilities.push(ability);
        }
        for template in other.characters {
            self.characters.retain(|c| c.id != template.id);
            self.characters.push(template);
        }
        self.validate()
    }
}

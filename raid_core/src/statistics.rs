//! Combat statistics. Write-only from the engine's point of view.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use raid_rules::InstanceId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatKind {
    Damage,
    Healing,
}

/// One `(caster, target, amount, kind, is_critical, ability_id)` record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatRecord {
    pub caster: Option<InstanceId>,
    pub target: InstanceId,
    pub amount: f64,
    pub kind: StatKind,
    pub is_critical: bool,
    pub ability_id: Option<String>,
}

/// Running totals for one character.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacterTotals {
    pub damage_dealt: f64,
    pub damage_taken: f64,
    pub healing_done: f64,
    pub healing_received: f64,
    pub critical_hits: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatisticsManager {
    records: Vec<StatRecord>,
    totals: HashMap<InstanceId, CharacterTotals>,
}

impl StatisticsManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one event and update caster and target totals.
    pub fn record(&mut self, record: StatRecord) {
        if let Some(caster) = record.caster {
            let totals = self.totals.entry(caster).or_default();
            match record.kind {
                StatKind::Damage => totals.damage_dealt += record.amount,
                StatKind::Healing => totals.healing_done += record.amount,
            }
            if record.is_critical {
                totals.critical_hits += 1;
            }
        }

        let totals = self.totals.entry(record.target).or_default();
        match record.kind {
            StatKind::Damage => totals.damage_taken += record.amount,
            StatKind::Healing => totals.healing_received += record.amount,
        }

        self.records.push(record);
    }

    /// Totals for a character; zeroes if it never appeared.
    pub fn totals(&self, character: InstanceId) -> CharacterTotals {
        self.totals.get(&character).cloned().unwrap_or_default()
    }

    /// Every record in the order it was made.
    pub fn records(&self) -> &[StatRecord] {
        &self.records
    }

    /// Records produced by one ability.
    pub fn by_ability<'a>(&'a self, ability_id: &'a str) -> impl Iterator<Item = &'a StatRecord> {
        self.records
            .iter()
            .filter(move |r| r.ability_id.as_deref() == Some(ability_id))
    }
}

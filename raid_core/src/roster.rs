//! Roster - every character in a battle, in insertion order.

use serde::{Deserialize, Serialize};

use raid_rules::{Character, InstanceId, Team};

/// Characters of both teams.
///
/// Insertion order is kept so that iteration, and therefore RNG consumption,
/// is deterministic for a given seed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Roster {
    characters: Vec<Character>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a character at the end of the roster and return its instance id.
    pub fn insert(&mut self, character: Character) -> InstanceId {
        let id = character.instance_id;
        self.characters.push(character);
        id
    }

    /// Look a character up by instance id, dead or alive.
    pub fn get(&self, id: InstanceId) -> Option<&Character> {
        self.characters.iter().find(|c| c.instance_id == id)
    }

    /// Mutable lookup by instance id.
    pub fn get_mut(&mut self, id: InstanceId) -> Option<&mut Character> {
        self.characters.iter_mut().find(|c| c.instance_id == id)
    }

    /// Whether the id belongs to this roster.
    pub fn contains(&self, id: InstanceId) -> bool {
        self.get(id).is_some()
    }

    /// Every character in insertion order, including the dead.
    pub fn iter(&self) -> impl Iterator<Item = &Character> {
        self.characters.iter()
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    /// Whether the id names a living character. Unknown ids are not alive.
    pub fn is_alive(&self, id: InstanceId) -> bool {
        self.get(id).is_some_and(Character::is_alive)
    }

    /// Living members of a team.
    pub fn living_on_team(&self, team: Team) -> Vec<InstanceId> {
        self.characters
            .iter()
            .filter(|c| c.team == team && c.is_alive())
            .map(|c| c.instance_id)
            .collect()
    }

    /// Living teammates of `id`, excluding `id` itself.
    pub fn allies_of(&self, id: InstanceId) -> Vec<InstanceId> {
        let Some(team) = self.get(id).map(|c| c.team) else {
            return Vec::new();
        };
        self.living_on_team(team)
            .into_iter()
            .filter(|ally| *ally != id)
            .collect()
    }

    /// Living members of the opposing team.
    pub fn enemies_of(&self, id: InstanceId) -> Vec<InstanceId> {
        self.get(id)
            .map(|c| self.living_on_team(c.team.opponent()))
            .unwrap_or_default()
    }

    /// Whether two characters are on the same team.
    pub fn same_team(&self, a: InstanceId, b: InstanceId) -> bool {
        match (self.get(a), self.get(b)) {
            (Some(a), Some(b)) => a.team == b.team,
            _ => false,
        }
    }

    /// First living teammate of `id` with an active taunt, other than `id`.
    pub fn taunt_holder_for(&self, id: InstanceId) -> Option<InstanceId> {
        let team = self.get(id)?.team;
        self.characters
            .iter()
            .find(|c| c.team == team && c.instance_id != id && c.is_taunting())
            .map(|c| c.instance_id)
    }

    /// Whether every member of `team` is dead.
    pub fn is_defeated(&self, team: Team) -> bool {
        self.living_on_team(team).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raid_rules::{Effect, EffectDuration, EffectHook, StatBlock};

    fn member(name: &str, team: Team) -> Character {
        Character::new(name, name, team, StatBlock::default())
    }

    #[test]
    fn test_allies_and_enemies() {
        let mut roster = Roster::new();
        let a = roster.insert(member("a", Team::Player));
        let b = roster.insert(member("b", Team::Player));
        let c = roster.insert(member("c", Team::Enemy));

        assert_eq!(roster.allies_of(a), vec![b]);
        assert_eq!(roster.enemies_of(a), vec![c]);
        assert!(roster.same_team(a, b));
        assert!(!roster.same_team(a, c));

        roster.get_mut(b).unwrap().is_dead = true;
        assert!(roster.allies_of(a).is_empty());
        assert!(!roster.is_defeated(Team::Player));
    }

    #[test]
    fn test_taunt_holder_excludes_self() {
        let mut roster = Roster::new();
        let tank = roster.insert(member("tank", Team::Player));
        let squishy = roster.insert(member("squishy", Team::Player));
        roster.get_mut(tank).unwrap().buffs.push(
            Effect::new("taunt", "Taunt", "", EffectDuration::Turns(2), None, false)
                .with_hook(EffectHook::Taunt),
        );

        assert_eq!(roster.taunt_holder_for(squishy), Some(tank));
        assert_eq!(roster.taunt_holder_for(tank), None);
    }

    #[test]
    fn test_unknown_id_queries_are_empty() {
        let roster = Roster::new();
        let ghost = InstanceId::new();
        assert!(roster.allies_of(ghost).is_empty());
        assert!(roster.enemies_of(ghost).is_empty());
        assert!(!roster.is_alive(ghost));
        assert_eq!(roster.taunt_holder_for(ghost), None);
    }
}

//! Battle events and a synchronous topic-based event bus.
//!
//! Events are published after the state change they describe has completed,
//! so a listener reacting to [`BattleEvent::CharacterUpdated`] always reads
//! fresh stats.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::trace;

use raid_rules::{EffectInstanceId, InstanceId, Team};

use crate::error::EngineResult;

/// Topics for event routing.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Roster membership and character state refreshes.
    Lifecycle,
    /// Buffs, debuffs and the ability toggles they drive.
    Effects,
    /// Damage, healing and interception results.
    Combat,
    /// Turn management.
    Turn,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BattleEvent {
    CharacterCreated {
        character: InstanceId,
        team: Team,
    },
    CharacterDied {
        character: InstanceId,
        killer: Option<InstanceId>,
    },
    /// The UI should redraw this character.
    CharacterUpdated {
        character: InstanceId,
    },
    BuffApplied {
        target: InstanceId,
        effect_id: String,
        instance: EffectInstanceId,
    },
    BuffRemoved {
        target: InstanceId,
        effect_id: String,
        instance: EffectInstanceId,
    },
    DebuffApplied {
        target: InstanceId,
        effect_id: String,
        instance: EffectInstanceId,
    },
    DebuffRemoved {
        target: InstanceId,
        effect_id: String,
        instance: EffectInstanceId,
    },
    AbilityDisabled {
        character: InstanceId,
        ability_id: String,
    },
    AbilityEnabled {
        character: InstanceId,
        ability_id: String,
    },
    AbilityUsed {
        caster: InstanceId,
        ability_id: String,
        targets: Vec<InstanceId>,
    },
    DamageDealt {
        source: Option<InstanceId>,
        target: InstanceId,
        amount: f64,
        is_critical: bool,
    },
    Healed {
        source: Option<InstanceId>,
        target: InstanceId,
        amount: f64,
    },
    Dodged {
        source: Option<InstanceId>,
        target: InstanceId,
    },
    Redirected {
        passive: String,
        from: InstanceId,
        to: InstanceId,
    },
    Blocked {
        passive: String,
        target: InstanceId,
        reason: String,
    },
    TurnEnded {
        team: Team,
        turn: u32,
    },
}

impl BattleEvent {
    pub fn topic(&self) -> Topic {
        match self {
            BattleEvent::CharacterCreated { .. }
            | BattleEvent::CharacterDied { .. }
            | BattleEvent::CharacterUpdated { .. } => Topic::Lifecycle,
            BattleEvent::BuffApplied { .. }
            | BattleEvent::BuffRemoved { .. }
            | BattleEvent::DebuffApplied { .. }
            | BattleEvent::DebuffRemoved { .. }
            | BattleEvent::AbilityDisabled { .. }
            | BattleEvent::AbilityEnabled { .. } => Topic::Effects,
            BattleEvent::AbilityUsed { .. }
            | BattleEvent::DamageDealt { .. }
            | BattleEvent::Healed { .. }
            | BattleEvent::Dodged { .. }
            | BattleEvent::Redirected { .. }
            | BattleEvent::Blocked { .. } => Topic::Combat,
            BattleEvent::TurnEnded { .. } => Topic::Turn,
        }
    }
}

/// Receives events synchronously as they are published.
///
/// Listeners must tolerate redundant `CharacterUpdated` notifications.
pub trait EventListener: Send + Sync {
    fn on_event(&self, event: &BattleEvent);
}

struct Subscription {
    topic: Option<Topic>,
    listener: Arc<dyn EventListener>,
}

/// Journal size used by [`EventBus::new`].
pub const DEFAULT_JOURNAL_CAPACITY: usize = 1000;

/// Topic-based event bus.
///
/// Every published event is also kept in a bounded journal that tests and
/// replay tooling can inspect or drain. The oldest events are dropped first.
pub struct EventBus {
    subscriptions: Vec<Subscription>,
    journal: VecDeque<BattleEvent>,
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_JOURNAL_CAPACITY)
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bus whose journal keeps at most `capacity` events.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            subscriptions: Vec::new(),
            journal: VecDeque::with_capacity(capacity.min(256)),
            capacity: capacity.max(1),
        }
    }

    /// Publish an event to its topic's listeners and record it.
    pub fn publish(&mut self, event: BattleEvent) {
        let topic = event.topic();
        for subscription in &self.subscriptions {
            if subscription.topic.map_or(true, |t| t == topic) {
                subscription.listener.on_event(&event);
            }
        }
        trace!(target: "raid_core::events", ?topic, ?event, "published");
        if self.journal.len() == self.capacity {
            self.journal.pop_front();
        }
        self.journal.push_back(event);
    }

    /// Subscribe to a single topic.
    pub fn subscribe(&mut self, topic: Topic, listener: Arc<dyn EventListener>) {
        self.subscriptions.push(Subscription {
            topic: Some(topic),
            listener,
        });
    }

    /// Subscribe to every topic.
    pub fn subscribe_all(&mut self, listener: Arc<dyn EventListener>) {
        self.subscriptions.push(Subscription {
            topic: None,
            listener,
        });
    }

    /// Recorded events, oldest first.
    pub fn journal(&self) -> impl Iterator<Item = &BattleEvent> {
        self.journal.iter()
    }

    /// Number of events currently in the journal.
    pub fn len(&self) -> usize {
        self.journal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.journal.is_empty()
    }

    /// Take every recorded event, leaving the journal empty.
    pub fn drain(&mut self) -> Vec<BattleEvent> {
        self.journal.drain(..).collect()
    }

    /// Number of recorded events matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&BattleEvent) -> bool) -> usize {
        self.journal.iter().filter(|e| predicate(e)).count()
    }

    /// Serialize the journal as JSON.
    pub fn export_json(&self) -> EngineResult<String> {
        Ok(serde_json::to_string(&self.journal)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<BattleEvent>>,
    }

    impl EventListener for Recorder {
        fn on_event(&self, event: &BattleEvent) {
            self.seen.lock().unwrap().push(event.clone());
        }
    }

    #[test]
    fn test_topic_routing() {
        let mut bus = EventBus::new();
        let turns = Arc::new(Recorder::default());
        let everything = Arc::new(Recorder::default());
        bus.subscribe(Topic::Turn, turns.clone());
        bus.subscribe_all(everything.clone());

        let character = InstanceId::new();
        bus.publish(BattleEvent::CharacterUpdated { character });
        bus.publish(BattleEvent::TurnEnded {
            team: Team::Player,
            turn: 1,
        });

        assert_eq!(turns.seen.lock().unwrap().len(), 1);
        assert_eq!(everything.seen.lock().unwrap().len(), 2);
        assert_eq!(bus.len(), 2);
    }

    #[test]
    fn test_drain_and_count() {
        let mut bus = EventBus::new();
        let character = InstanceId::new();
        bus.publish(BattleEvent::CharacterUpdated { character });
        bus.publish(BattleEvent::CharacterUpdated { character });

        assert_eq!(
            bus.count(|e| matches!(e, BattleEvent::CharacterUpdated { .. })),
            2
        );
        let json = bus.export_json().unwrap();
        assert!(json.contains("CharacterUpdated"));

        assert_eq!(bus.drain().len(), 2);
        assert!(bus.is_empty());
    }

    #[test]
    fn test_journal_drops_oldest_events() {
        let mut bus = EventBus::with_capacity(3);
        for turn in 1..=10 {
            bus.publish(BattleEvent::TurnEnded {
                team: Team::Player,
                turn,
            });
        }

        assert_eq!(bus.len(), 3);
        let turns: Vec<u32> = bus
            .journal()
            .filter_map(|e| match e {
                BattleEvent::TurnEnded { turn, .. } => Some(*turn),
                _ => None,
            })
            .collect();
        assert_eq!(turns, vec![8, 9, 10]);
    }
}

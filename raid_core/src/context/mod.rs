//! Battle context - everything a battle used to reach for through globals.

mod battle_log;
mod rng;

pub use battle_log::*;
pub use rng::*;

use crate::config::EngineConfig;
use crate::events::{BattleEvent, EventBus};
use crate::statistics::StatisticsManager;

/// Services owned by one battle and handed explicitly to the engine.
pub struct BattleContext {
    pub config: EngineConfig,
    pub rng: BattleRng,
    pub log: BattleLog,
    pub events: EventBus,
    pub statistics: StatisticsManager,
    /// Current turn number, starting at 1.
    pub turn: u32,
}

impl BattleContext {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            rng: BattleRng::new(config.seed),
            log: BattleLog::new(config.log_capacity),
            events: EventBus::with_capacity(config.journal_capacity),
            statistics: StatisticsManager::new(),
            turn: 1,
            config,
        }
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.log.push(self.turn, LogLevel::Info, message);
    }

    pub fn combat(&mut self, message: impl Into<String>) {
        self.log.push(self.turn, LogLevel::Combat, message);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.log.push(self.turn, LogLevel::Warning, message);
    }

    pub fn publish(&mut self, event: BattleEvent) {
        self.events.publish(event);
    }
}

impl Default for BattleContext {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raid_rules::InstanceId;

    #[test]
    fn test_capacities_come_from_config() {
        let mut ctx = BattleContext::new(EngineConfig {
            log_capacity: 2,
            journal_capacity: 4,
            ..EngineConfig::seeded(1)
        });
        let character = InstanceId::new();
        for _ in 0..10 {
            ctx.info("tick");
            ctx.publish(BattleEvent::CharacterUpdated { character });
        }

        assert_eq!(ctx.log.len(), 2);
        assert_eq!(ctx.events.len(), 4);
    }
}

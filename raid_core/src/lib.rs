//! # Raid Core
//!
//! The battle engine of the raid battler. This crate drives `raid_rules` data:
//! it owns the roster, attaches and expires effects, routes every damage, heal
//! and debuff through the passive interceptor chain, and resolves abilities.
//!
//! ## Core Components
//!
//! - **battle**: The `Battle` aggregate - roster, effect lifecycle, turn processing
//! - **intercept**: Interceptor chain and the built-in passives
//! - **abilities**: Ability handlers and the registry that maps ability ids to them
//! - **context**: RNG, battle log, event bus and statistics owned by a battle
//! - **events**: Battle events for UI and turn-driver communication
//!
//! ## Design Philosophy
//!
//! - **Explicit context**: No ambient globals; everything a battle needs is in its `BattleContext`
//! - **Pure stats**: Effective stats are always recomputed from base stats and active effects
//! - **Pipelines, not patches**: Passives intercept mutations through an ordered chain

pub mod abilities;
pub mod battle;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod intercept;
pub mod roster;
pub mod statistics;

pub use abilities::*;
pub use battle::*;
pub use config::*;
pub use context::*;
pub use error::*;
pub use events::*;
pub use intercept::*;
pub use roster::*;
pub use statistics::*;

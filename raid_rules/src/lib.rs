//! # Raid Rules
//!
//! The rules crate for the raid battler - stat blocks, effects, stat modifiers,
//! ability definitions and character templates.
//! This crate holds data and pure functions only; the battle engine lives in `raid_core`.

pub mod abilities;
pub mod content;
pub mod effects;
pub mod entities;
pub mod error;
pub mod mechanics;

pub use abilities::*;
pub use content::*;
pub use effects::*;
pub use entities::*;
pub use error::*;
pub use mechanics::*;

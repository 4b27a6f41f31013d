//! # Skirmish Combat
//!
//! Combat resolution core for a tick-driven multiplayer field.
//!
//! This crate provides:
//! - Actors with a per-tick life-cycle (death detection, idle tracking)
//! - Skill casting and target attack orchestration
//! - Damage application with a concurrent per-attacker damage ledger
//! - Damage calculation (normal, critical, block, miss)
//! - Buffs with event procs and probabilistic reflect
//! - The field that owns actors and broadcasts notifications

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod actor;
pub mod animation;
pub mod buff;
pub mod calculator;
pub mod condition;
pub mod config;
pub mod damage;
pub mod error;
pub mod events;
pub mod field;
pub mod metadata;
pub mod random;
pub mod reflect;
pub mod skill;
pub mod stats;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::actor::*;
    pub use crate::animation::*;
    pub use crate::buff::*;
    pub use crate::calculator::*;
    pub use crate::condition::*;
    pub use crate::config::*;
    pub use crate::damage::*;
    pub use crate::error::*;
    pub use crate::events::*;
    pub use crate::field::*;
    pub use crate::metadata::*;
    pub use crate::random::*;
    pub use crate::reflect::*;
    pub use crate::skill::*;
    pub use crate::stats::*;
}

pub use prelude::*;

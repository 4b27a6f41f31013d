//! # Skirmish Common
//!
//! Common types shared by the Skirmish combat crates.
//!
//! This crate provides:
//! - ID types (ObjectId, SkillId, EffectId, SkillUid)
//! - The simulation tick type
//! - Spatial transform (position + rotation in degrees)
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod ids;
pub mod transform;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::*;
    pub use crate::ids::*;
    pub use crate::transform::*;
}

pub use prelude::*;

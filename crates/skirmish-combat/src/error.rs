//! Error types for combat operations.

use skirmish_common::{ObjectId, SkillId};
use thiserror::Error;

use crate::condition::SkillEntity;

/// Combat error types.
#[derive(Debug, Clone, Error)]
pub enum CombatError {
    /// Skill id/level pair has no metadata
    #[error("invalid skill use: {id},{level}")]
    SkillNotFound {
        /// Requested skill
        id: SkillId,
        /// Requested level
        level: i16,
    },
    /// Motion point is outside the skill's motion list
    #[error("skill {id} rejected motion point {point}")]
    InvalidMotionPoint {
        /// Skill being cast
        id: SkillId,
        /// Rejected motion point
        point: u8,
    },
    /// Effect target resolution hit an entity tag it cannot resolve
    #[error("unrecognized skill entity: {0:?}")]
    UnrecognizedEntity(SkillEntity),
    /// Actor not registered in the field
    #[error("actor not found: {0}")]
    ActorNotFound(ObjectId),
    /// Metadata table could not be parsed
    #[error("metadata error: {0}")]
    Metadata(String),
}

/// Result type for combat operations.
pub type CombatResult<T> = Result<T, CombatError>;

//! Spatial transform for actors.

pub use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Position and rotation of an actor.
///
/// Rotation is stored as Euler angles in degrees; `z` is the facing (yaw).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// World position
    pub position: Vec3,
    /// Rotation angles in degrees
    pub rotation: Vec3,
}

impl Transform {
    /// Creates a transform at the given position with no rotation.
    #[must_use]
    pub const fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation: Vec3::ZERO,
        }
    }

    /// Sets the rotation (builder).
    #[must_use]
    pub const fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    /// Unit vector the transform is facing on the XY plane.
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        let yaw = self.rotation.z.to_radians();
        Vec3::new(yaw.cos(), yaw.sin(), 0.0)
    }

    /// Distance to another position.
    #[must_use]
    pub fn distance_to(&self, other: Vec3) -> f32 {
        self.position.distance(other)
    }
}

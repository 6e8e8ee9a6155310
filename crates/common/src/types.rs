use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Index of the pitch angle inside [`Pose::eulers`].
pub const PITCH: usize = 1;
/// Index of the yaw / spin angle inside [`Pose::eulers`].
pub const YAW: usize = 2;

/// Largest pitch magnitude a camera may reach, in degrees.
pub const PITCH_LIMIT: f32 = 89.0;

/// Position plus Euler orientation, shared by every placeable thing.
///
/// Angles are stored in degrees. Index 1 is pitch and index 2 is yaw (the
/// spin angle for entities); index 0 is carried but unused by the demos.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub eulers: Vec3,
}

impl Pose {
    pub fn new(position: Vec3, eulers: Vec3) -> Self {
        Self { position, eulers }
    }

    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            eulers: Vec3::ZERO,
        }
    }

    pub fn pitch(&self) -> f32 {
        self.eulers[PITCH]
    }

    pub fn yaw(&self) -> f32 {
        self.eulers[YAW]
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::at(Vec3::ZERO)
    }
}

/// Anything that can place itself in the world.
pub trait ModelTransform {
    fn model_transform(&self) -> Mat4;
}

/// Anything that can look at the world.
pub trait ViewTransform {
    fn view_transform(&self) -> Mat4;
}

/// Wrap an angle in degrees into `[0, 360)`.
pub fn wrap_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid may round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Clamp a pitch angle in degrees into `[-PITCH_LIMIT, PITCH_LIMIT]`.
pub fn clamp_pitch(angle: f32) -> f32 {
    angle.clamp(-PITCH_LIMIT, PITCH_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pose_default_is_origin() {
        let p = Pose::default();
        assert_eq!(p.position, Vec3::ZERO);
        assert_eq!(p.eulers, Vec3::ZERO);
    }

    #[test]
    fn pose_accessors_follow_axis_convention() {
        let p = Pose::new(Vec3::ZERO, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(p.pitch(), 2.0);
        assert_eq!(p.yaw(), 3.0);
    }

    #[test]
    fn wrap_keeps_angles_in_range() {
        assert_eq!(wrap_degrees(0.0), 0.0);
        assert_eq!(wrap_degrees(360.0), 0.0);
        assert_eq!(wrap_degrees(370.0), 10.0);
        assert_eq!(wrap_degrees(-10.0), 350.0);
        assert_eq!(wrap_degrees(725.0), 5.0);
    }

    #[test]
    fn wrap_handles_tiny_negative_values() {
        let w = wrap_degrees(-1e-6);
        assert!((0.0..360.0).contains(&w), "got {w}");
    }

    #[test]
    fn clamp_pitch_limits() {
        assert_eq!(clamp_pitch(120.0), 89.0);
        assert_eq!(clamp_pitch(-500.0), -89.0);
        assert_eq!(clamp_pitch(12.5), 12.5);
    }
}

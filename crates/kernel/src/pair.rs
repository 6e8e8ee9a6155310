use glam::Mat4;
use triview_common::{PITCH, Pose, YAW, wrap_degrees};

use crate::scene::SPIN_PER_FRAME;

/// Two triangles tumbling on one shared angle with different rotation orders.
///
/// The transforms are meant to be baked into vertex data rather than passed
/// as a model uniform.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrianglePair {
    pub pose: Pose,
}

impl TrianglePair {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the tumble angle and retreat the secondary angle, both wrapped.
    pub fn update(&mut self, rate: f32) {
        let step = SPIN_PER_FRAME * rate;
        let eulers = &mut self.pose.eulers;
        eulers[YAW] = wrap_degrees(eulers[YAW] + step);
        eulers[PITCH] = wrap_degrees(eulers[PITCH] - step);
    }

    pub fn angle(&self) -> f32 {
        self.pose.yaw()
    }

    /// Rotate about Z, then Y, then X.
    pub fn first_transform(&self) -> Mat4 {
        let theta = self.angle().to_radians();
        Mat4::from_translation(self.pose.position)
            * Mat4::from_rotation_x(theta)
            * Mat4::from_rotation_y(theta)
            * Mat4::from_rotation_z(theta)
    }

    /// Rotate about Y, then Z, then X.
    pub fn second_transform(&self) -> Mat4 {
        let theta = self.angle().to_radians();
        Mat4::from_translation(self.pose.position)
            * Mat4::from_rotation_x(theta)
            * Mat4::from_rotation_z(theta)
            * Mat4::from_rotation_y(theta)
    }

    pub fn transforms(&self) -> [Mat4; 2] {
        [self.first_transform(), self.second_transform()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn starts_at_identity() {
        let pair = TrianglePair::new();
        assert_eq!(pair.transforms(), [Mat4::IDENTITY, Mat4::IDENTITY]);
    }

    #[test]
    fn angles_stay_wrapped() {
        let mut pair = TrianglePair::new();
        for _ in 0..3_000 {
            pair.update(1.0);
            assert!((0.0..360.0).contains(&pair.pose.yaw()));
            assert!((0.0..360.0).contains(&pair.pose.pitch()));
        }
    }

    #[test]
    fn secondary_angle_retreats() {
        let mut pair = TrianglePair::new();
        pair.update(1.0);
        assert_eq!(pair.angle(), 0.25);
        assert_eq!(pair.pose.pitch(), 359.75);
    }

    #[test]
    fn rotation_orders_differ() {
        let mut pair = TrianglePair::new();
        pair.pose.eulers[YAW] = 90.0;
        let p = Vec3::new(0.5, -0.5, 0.0);
        let a = pair.first_transform().transform_point3(p);
        let b = pair.second_transform().transform_point3(p);
        assert!(!a.abs_diff_eq(b, 1e-3), "orders should disagree: {a} vs {b}");
        // rotations preserve distance from the origin
        assert!((a.length() - p.length()).abs() < 1e-5);
        assert!((b.length() - p.length()).abs() < 1e-5);
    }
}

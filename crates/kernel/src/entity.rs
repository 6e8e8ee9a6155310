use glam::{Mat4, Vec3};
use triview_common::{ModelTransform, Pose, YAW, wrap_degrees};

/// A placeable object: a pose that turns into a model transform.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Entity {
    pub pose: Pose,
}

impl Entity {
    pub fn new(position: Vec3, eulers: Vec3) -> Self {
        Self {
            pose: Pose::new(position, eulers),
        }
    }

    pub fn at(position: Vec3) -> Self {
        Self {
            pose: Pose::at(position),
        }
    }

    /// Advance the spin angle by `degrees`, keeping it in `[0, 360)`.
    pub fn spin(&mut self, degrees: f32) {
        self.pose.eulers[YAW] = wrap_degrees(self.pose.eulers[YAW] + degrees);
    }
}

impl ModelTransform for Entity {
    /// Rotate about the vertical axis by the spin angle, then translate to
    /// the entity position. No scaling.
    fn model_transform(&self) -> Mat4 {
        let rotation = Mat4::from_rotation_y(self.pose.yaw().to_radians());
        let translation = Mat4::from_translation(self.pose.position);
        translation * rotation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_entity_has_identity_transform() {
        let e = Entity::default();
        assert_eq!(e.model_transform(), Mat4::IDENTITY);
    }

    #[test]
    fn translation_only_moves_points() {
        let e = Entity::at(Vec3::new(0.0, 0.0, -2.0));
        let p = e.model_transform().transform_point3(Vec3::new(0.5, -0.5, 0.0));
        assert!(p.abs_diff_eq(Vec3::new(0.5, -0.5, -2.0), 1e-6));
    }

    #[test]
    fn rotation_is_applied_before_translation() {
        let e = Entity::new(Vec3::new(3.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 90.0));
        // +X rotated 90 degrees about Y lands on -Z, then shifts by +3 on X
        let p = e.model_transform().transform_point3(Vec3::X);
        assert!(p.abs_diff_eq(Vec3::new(3.0, 0.0, -1.0), 1e-6), "got {p}");
    }

    #[test]
    fn repeated_spin_stays_in_range() {
        let mut e = Entity::default();
        for _ in 0..10_000 {
            e.spin(0.25);
            let yaw = e.pose.yaw();
            assert!((0.0..360.0).contains(&yaw), "yaw out of range: {yaw}");
        }
    }

    #[test]
    fn spin_wraps_past_full_turn() {
        let mut e = Entity::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 359.9));
        e.spin(0.25);
        assert!((e.pose.yaw() - 0.15).abs() < 1e-3);
    }
}

use glam::Vec3;
use triview_common::{PITCH, YAW, clamp_pitch, wrap_degrees};
use triview_input::Action;

use crate::camera::Camera;
use crate::entity::Entity;

/// Degrees the subject spins per nominal frame.
pub const SPIN_PER_FRAME: f32 = 0.25;

/// One subject entity and one camera, owned outright.
///
/// All mutation goes through [`Scene::update`], [`Scene::move_camera`],
/// [`Scene::spin_camera`] or [`Scene::apply`].
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub subject: Entity,
    pub camera: Camera,
}

impl Scene {
    pub fn new(subject: Entity, camera: Camera) -> Self {
        Self { subject, camera }
    }

    /// Subject two units in front of a viewer looking down -Z.
    pub fn facing() -> Self {
        Self::new(Entity::at(Vec3::new(0.0, 0.0, -2.0)), Camera::default())
    }

    /// Subject three units ahead of a Z-up first-person camera at the origin.
    pub fn first_person() -> Self {
        Self::new(Entity::at(Vec3::new(3.0, 0.0, 0.0)), Camera::default())
    }

    /// Advance one frame. `rate` is elapsed frame time over the nominal
    /// frame time, so motion speed does not depend on frame rate.
    pub fn update(&mut self, rate: f32) {
        self.subject.spin(SPIN_PER_FRAME * rate);
        self.camera.update();
    }

    /// Displace the camera by a world-space delta. No bounds.
    pub fn move_camera(&mut self, delta: Vec3) {
        self.camera.pose.position += delta;
    }

    /// Add to the camera eulers: yaw wraps into `[0, 360)`, pitch is clamped.
    pub fn spin_camera(&mut self, delta: Vec3) {
        let eulers = &mut self.camera.pose.eulers;
        *eulers += delta;
        eulers[YAW] = wrap_degrees(eulers[YAW]);
        eulers[PITCH] = clamp_pitch(eulers[PITCH]);
    }

    /// Route an input action. Returns false for [`Action::Quit`], which the
    /// scene cannot handle itself.
    pub fn apply(&mut self, action: Action) -> bool {
        match action {
            Action::Move(delta) => self.move_camera(delta),
            Action::Spin(delta) => self.spin_camera(delta),
            Action::Quit => {
                tracing::debug!("scene received quit");
                return false;
            }
        }
        true
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::first_person()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use triview_common::{ModelTransform, ViewTransform};

    #[test]
    fn update_spins_subject_by_rate() {
        let mut s = Scene::first_person();
        s.update(2.0);
        assert_eq!(s.subject.pose.yaw(), 0.5);
        s.update(0.0);
        assert_eq!(s.subject.pose.yaw(), 0.5);
    }

    #[test]
    fn subject_spin_stays_in_range() {
        let mut s = Scene::first_person();
        for _ in 0..5_000 {
            s.update(1.0);
            let yaw = s.subject.pose.yaw();
            assert!((0.0..360.0).contains(&yaw), "yaw out of range: {yaw}");
        }
    }

    #[test]
    fn update_refreshes_camera_basis() {
        let mut s = Scene::first_person();
        s.camera.pose.eulers.z = 90.0;
        s.update(1.0);
        assert!(s.camera.forward().abs_diff_eq(Vec3::Y, 1e-6));
    }

    #[test]
    fn move_camera_adds_delta() {
        let mut s = Scene::first_person();
        s.move_camera(Vec3::new(1.0, -2.0, 0.5));
        s.move_camera(Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(s.camera.pose.position, Vec3::new(2.0, -2.0, 0.5));
    }

    #[test]
    fn pitch_is_clamped_for_any_delta() {
        let mut s = Scene::first_person();
        for delta in [500.0, -1000.0, 89.5, -89.5, 3.0, f32::MAX / 2.0] {
            s.spin_camera(Vec3::new(0.0, delta, 0.0));
            let pitch = s.camera.pose.pitch();
            assert!((-89.0..=89.0).contains(&pitch), "pitch {pitch} after {delta}");
        }
    }

    #[test]
    fn yaw_wraps_both_ways() {
        let mut s = Scene::first_person();
        s.spin_camera(Vec3::new(0.0, 0.0, -10.0));
        assert_eq!(s.camera.pose.yaw(), 350.0);
        s.spin_camera(Vec3::new(0.0, 0.0, 20.0));
        assert_eq!(s.camera.pose.yaw(), 10.0);
        s.spin_camera(Vec3::new(0.0, 0.0, 350.0));
        assert_eq!(s.camera.pose.yaw(), 0.0);
    }

    #[test]
    fn apply_routes_actions() {
        let mut s = Scene::first_person();
        assert!(s.apply(Action::Move(Vec3::X)));
        assert!(s.apply(Action::Spin(Vec3::new(0.0, 100.0, 45.0))));
        assert!(!s.apply(Action::Quit));
        assert_eq!(s.camera.pose.position, Vec3::X);
        assert_eq!(s.camera.pose.pitch(), 89.0);
        assert_eq!(s.camera.pose.yaw(), 45.0);
    }

    #[test]
    fn first_person_subject_is_in_view() {
        let s = Scene::first_person();
        let world = s.subject.model_transform().transform_point3(Vec3::ZERO);
        let view = s.camera.view_transform().transform_point3(world);
        assert!(view.z < 0.0, "subject behind camera: {view}");
    }
}

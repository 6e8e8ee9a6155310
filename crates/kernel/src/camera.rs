use glam::{Mat3, Mat4, Vec3};
use triview_common::{Pose, ViewTransform};

/// Camera-local axes before any rotation. The world is Z-up.
const LOCAL_UP: Vec3 = Vec3::Z;
const LOCAL_RIGHT: Vec3 = Vec3::Y;
const LOCAL_FORWARD: Vec3 = Vec3::X;

/// First-person camera: a pose plus the basis vectors derived from it.
///
/// Call [`Camera::update`] after touching the eulers; the basis is not
/// recomputed lazily.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub pose: Pose,
    up: Vec3,
    right: Vec3,
    forward: Vec3,
}

impl Camera {
    pub fn new(position: Vec3, eulers: Vec3) -> Self {
        let mut camera = Self {
            pose: Pose::new(position, eulers),
            up: LOCAL_UP,
            right: LOCAL_RIGHT,
            forward: LOCAL_FORWARD,
        };
        camera.update();
        camera
    }

    /// Recompute up/right/forward from yaw (about world up) and pitch.
    pub fn update(&mut self) {
        let rotation = Mat3::from_rotation_z(self.pose.yaw().to_radians())
            * Mat3::from_rotation_y(self.pose.pitch().to_radians());
        self.up = rotation * LOCAL_UP;
        self.right = rotation * LOCAL_RIGHT;
        self.forward = rotation * LOCAL_FORWARD;
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn forward(&self) -> Vec3 {
        self.forward
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::ZERO)
    }
}

impl ViewTransform for Camera {
    fn view_transform(&self) -> Mat4 {
        let eye = self.pose.position;
        Mat4::look_at_rh(eye, eye + self.forward, self.up)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_orthonormal(c: &Camera) {
        for v in [c.up(), c.right(), c.forward()] {
            assert!((v.length() - 1.0).abs() < 1e-5, "not unit: {v}");
        }
        assert!(c.up().dot(c.right()).abs() < 1e-5);
        assert!(c.up().dot(c.forward()).abs() < 1e-5);
        assert!(c.right().dot(c.forward()).abs() < 1e-5);
    }

    #[test]
    fn zero_eulers_give_canonical_axes() {
        let c = Camera::default();
        assert_eq!(c.up(), Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(c.right(), Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(c.forward(), Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn basis_stays_orthonormal() {
        for (pitch, yaw) in [(0.0, 45.0), (30.0, 200.0), (-89.0, 359.0), (89.0, 0.25)] {
            let c = Camera::new(Vec3::ZERO, Vec3::new(0.0, pitch, yaw));
            assert_orthonormal(&c);
        }
    }

    #[test]
    fn yaw_turns_forward_in_horizontal_plane() {
        let c = Camera::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 90.0));
        assert!(c.forward().abs_diff_eq(Vec3::Y, 1e-6), "got {}", c.forward());
        assert!(c.up().abs_diff_eq(Vec3::Z, 1e-6));
    }

    #[test]
    fn positive_pitch_looks_down() {
        let c = Camera::new(Vec3::ZERO, Vec3::new(0.0, 30.0, 0.0));
        assert!(c.forward().z < 0.0);
    }

    #[test]
    fn update_picks_up_new_eulers() {
        let mut c = Camera::default();
        c.pose.eulers.z = 180.0;
        assert_eq!(c.forward(), Vec3::X);
        c.update();
        assert!(c.forward().abs_diff_eq(-Vec3::X, 1e-6));
    }

    #[test]
    fn view_puts_forward_point_in_front() {
        let c = Camera::new(Vec3::new(1.0, 2.0, 0.0), Vec3::ZERO);
        let ahead = c.pose.position + c.forward();
        let p = c.view_transform().transform_point3(ahead);
        assert!(p.abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), 1e-6), "got {p}");
    }

    #[test]
    fn view_maps_world_up_to_screen_up() {
        let c = Camera::default();
        let p = c.view_transform().transform_point3(Vec3::Z);
        assert!(p.abs_diff_eq(Vec3::Y, 1e-6), "got {p}");
    }
}

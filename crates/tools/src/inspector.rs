use glam::Vec3;
use triview_common::ModelTransform;
use triview_kernel::{Scene, TrianglePair};

/// Scene inspector for developer tooling.
///
/// Read-only queries against scene state for logging and the headless
/// simulator.
pub struct SceneInspector;

impl SceneInspector {
    /// Produce a summary of the scene state.
    pub fn summary(scene: &Scene) -> SceneSummary {
        let subject_origin = scene.subject.model_transform().transform_point3(Vec3::ZERO);
        SceneSummary {
            subject_position: subject_origin.to_array(),
            subject_spin: scene.subject.pose.yaw(),
            camera_position: scene.camera.pose.position.to_array(),
            camera_pitch: scene.camera.pose.pitch(),
            camera_yaw: scene.camera.pose.yaw(),
            camera_forward: scene.camera.forward().to_array(),
        }
    }

    /// Tumble and secondary angles of a triangle pair, in degrees.
    pub fn pair_angles(pair: &TrianglePair) -> [f32; 2] {
        [pair.angle(), pair.pose.pitch()]
    }
}

/// Summary of scene state for the inspector.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneSummary {
    pub subject_position: [f32; 3],
    pub subject_spin: f32,
    pub camera_position: [f32; 3],
    pub camera_pitch: f32,
    pub camera_yaw: f32,
    pub camera_forward: [f32; 3],
}

impl std::fmt::Display for SceneSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [sx, sy, sz] = self.subject_position;
        let [cx, cy, cz] = self.camera_position;
        let [fx, fy, fz] = self.camera_forward;
        write!(
            f,
            "subject pos=({sx:.2}, {sy:.2}, {sz:.2}) spin={:.2} | camera pos=({cx:.2}, {cy:.2}, {cz:.2}) pitch={:.2} yaw={:.2} fwd=({fx:.2}, {fy:.2}, {fz:.2})",
            self.subject_spin, self.camera_pitch, self.camera_yaw,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_of_fresh_scene() {
        let scene = Scene::first_person();
        let s = SceneInspector::summary(&scene);
        assert_eq!(s.subject_position, [3.0, 0.0, 0.0]);
        assert_eq!(s.subject_spin, 0.0);
        assert_eq!(s.camera_position, [0.0, 0.0, 0.0]);
        assert_eq!(s.camera_forward, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn summary_tracks_updates() {
        let mut scene = Scene::first_person();
        scene.move_camera(Vec3::new(0.0, 1.0, 0.0));
        scene.update(4.0);
        let s = SceneInspector::summary(&scene);
        assert_eq!(s.camera_position, [0.0, 1.0, 0.0]);
        assert_eq!(s.subject_spin, 1.0);
    }

    #[test]
    fn summary_display() {
        let s = SceneInspector::summary(&Scene::facing());
        let text = format!("{s}");
        assert!(text.contains("subject pos=(0.00, 0.00, -2.00)"));
        assert!(text.contains("yaw=0.00"));
    }

    #[test]
    fn pair_angles_follow_update() {
        let mut pair = TrianglePair::new();
        pair.update(2.0);
        assert_eq!(SceneInspector::pair_angles(&pair), [0.5, 359.5]);
    }
}

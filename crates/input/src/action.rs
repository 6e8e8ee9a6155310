use glam::Vec3;

/// A high-level action produced from raw input.
///
/// The scene consumes actions, never raw input events, so the windowed demo
/// and the headless simulator share the same scene logic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Displace the camera by a world-space delta.
    Move(Vec3),
    /// Add a delta to the camera eulers (degrees: x unused, y pitch, z yaw).
    Spin(Vec3),
    /// Leave the render loop.
    Quit,
}

impl Action {
    pub fn is_quit(&self) -> bool {
        matches!(self, Action::Quit)
    }
}

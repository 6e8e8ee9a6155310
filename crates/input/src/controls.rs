use glam::Vec3;

use crate::action::Action;
use crate::source::{InputSource, Key};
use crate::walk::{WalkKeys, walk_delta};

/// WASD walking plus relative mouse-look emulated by re-centering the cursor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FirstPersonControls {
    center: (f64, f64),
}

impl FirstPersonControls {
    /// Controls for a window of `width` x `height` pixels.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            center: (width as f64 / 2.0, height as f64 / 2.0),
        }
    }

    pub fn center(&self) -> (f64, f64) {
        self.center
    }

    /// True when the window asked to close or Escape is held.
    pub fn quit_requested(input: &dyn InputSource) -> bool {
        input.close_requested() || input.is_key_down(Key::Escape)
    }

    /// Read the current input state and turn it into actions.
    ///
    /// `yaw` is the camera yaw in degrees. The cursor is put back at the
    /// window center after reading it.
    pub fn poll(&self, input: &mut dyn InputSource, yaw: f32, rate: f32) -> Vec<Action> {
        if Self::quit_requested(input) {
            return vec![Action::Quit];
        }

        let mut actions = Vec::with_capacity(2);

        let keys = WalkKeys::from_held(
            input.is_key_down(Key::W),
            input.is_key_down(Key::A),
            input.is_key_down(Key::S),
            input.is_key_down(Key::D),
        );
        if let Some(delta) = walk_delta(keys, yaw, rate) {
            actions.push(Action::Move(delta));
        }

        let (x, y) = input.cursor_position();
        let (cx, cy) = self.center;
        let yaw_delta = rate as f64 * (cx - x);
        let pitch_delta = -(rate as f64) * (cy - y);
        if yaw_delta != 0.0 || pitch_delta != 0.0 {
            actions.push(Action::Spin(Vec3::new(
                0.0,
                pitch_delta as f32,
                yaw_delta as f32,
            )));
        }
        input.set_cursor_position(cx, cy);

        if !actions.is_empty() {
            tracing::trace!(?actions, "input actions");
        }
        actions
    }
}

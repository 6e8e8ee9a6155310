use std::collections::HashSet;
use std::time::Duration;

/// The keys the demos react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    W,
    A,
    S,
    D,
    Escape,
}

/// The window/input collaborator as seen by the render loop.
///
/// The loop only ever asks whether a key is held, where the cursor is, how
/// much time has passed and whether the window wants to close. It only ever
/// moves the cursor and sets the window title.
pub trait InputSource {
    fn is_key_down(&self, key: Key) -> bool;

    /// Cursor position in window pixels.
    fn cursor_position(&self) -> (f64, f64);

    fn set_cursor_position(&mut self, x: f64, y: f64);

    /// Time since the input source was created.
    fn elapsed(&self) -> Duration;

    fn close_requested(&self) -> bool;

    fn set_title(&mut self, title: &str);
}

/// Input source driven entirely by the caller.
///
/// Used by the headless simulator and by tests in place of a real window.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    held: HashSet<Key>,
    cursor: (f64, f64),
    elapsed: Duration,
    close: bool,
    title: Option<String>,
    cursor_warps: usize,
}

impl ScriptedInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with the cursor resting at `(x, y)`.
    pub fn with_cursor(x: f64, y: f64) -> Self {
        Self {
            cursor: (x, y),
            ..Self::default()
        }
    }

    pub fn press(&mut self, key: Key) {
        self.held.insert(key);
    }

    pub fn release(&mut self, key: Key) {
        self.held.remove(&key);
    }

    pub fn move_cursor(&mut self, x: f64, y: f64) {
        self.cursor = (x, y);
    }

    pub fn advance(&mut self, dt: Duration) {
        self.elapsed += dt;
    }

    pub fn request_close(&mut self) {
        self.close = true;
    }

    /// Last title set by the loop, if any.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Number of times the loop moved the cursor.
    pub fn cursor_warps(&self) -> usize {
        self.cursor_warps
    }
}

impl InputSource for ScriptedInput {
    fn is_key_down(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    fn cursor_position(&self) -> (f64, f64) {
        self.cursor
    }

    fn set_cursor_position(&mut self, x: f64, y: f64) {
        self.cursor = (x, y);
        self.cursor_warps += 1;
    }

    fn elapsed(&self) -> Duration {
        self.elapsed
    }

    fn close_requested(&self) -> bool {
        self.close
    }

    fn set_title(&mut self, title: &str) {
        self.title = Some(title.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_and_release() {
        let mut input = ScriptedInput::new();
        input.press(Key::W);
        assert!(input.is_key_down(Key::W));
        assert!(!input.is_key_down(Key::S));
        input.release(Key::W);
        assert!(!input.is_key_down(Key::W));
    }

    #[test]
    fn cursor_warps_are_counted() {
        let mut input = ScriptedInput::with_cursor(10.0, 20.0);
        assert_eq!(input.cursor_position(), (10.0, 20.0));
        input.set_cursor_position(320.0, 240.0);
        assert_eq!(input.cursor_position(), (320.0, 240.0));
        assert_eq!(input.cursor_warps(), 1);
        input.move_cursor(1.0, 1.0);
        assert_eq!(input.cursor_warps(), 1);
    }

    #[test]
    fn time_and_close() {
        let mut input = ScriptedInput::new();
        input.advance(Duration::from_millis(16));
        input.advance(Duration::from_millis(17));
        assert_eq!(input.elapsed(), Duration::from_millis(33));
        assert!(!input.close_requested());
        input.request_close();
        assert!(input.close_requested());
    }

    #[test]
    fn title_is_recorded() {
        let mut input = ScriptedInput::new();
        assert_eq!(input.title(), None);
        input.set_title("Running at 60 fps.");
        assert_eq!(input.title(), Some("Running at 60 fps."));
    }
}

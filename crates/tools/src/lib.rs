//! Developer tooling: frame-rate counter and scene inspector.
//!
//! # Invariants
//! - Tools read scene state; they never mutate it.

pub mod framerate;
pub mod inspector;

pub use framerate::{FrameRateCounter, FrameReport, NOMINAL_FRAME_MS};
pub use inspector::{SceneInspector, SceneSummary};

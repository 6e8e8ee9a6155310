//! Shared types for the triview demos.
//!
//! # Invariants
//! - Angles are degrees everywhere; conversion to radians happens at the
//!   point a matrix is built.
//! - Wrapped angles live in `[0, 360)`, pitch in `[-89, 89]`.

pub mod config;
pub mod types;

pub use config::{ConfigError, DemoConfig, DemoKind};
pub use types::{
    ModelTransform, PITCH, PITCH_LIMIT, Pose, ViewTransform, YAW, clamp_pitch, wrap_degrees,
};

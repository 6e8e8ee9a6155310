//! Scene kernel: the entity/camera/scene model and its per-frame update.
//!
//! # Invariants
//! - Entities and cameras share a [`Pose`](triview_common::Pose) by composition.
//! - Camera basis vectors are orthonormal and derived from the current eulers.
//! - The scene consumes input [`Action`](triview_input::Action)s, never raw events.

pub mod camera;
pub mod entity;
pub mod pair;
pub mod scene;

pub use camera::Camera;
pub use entity::Entity;
pub use pair::TrianglePair;
pub use scene::{SPIN_PER_FRAME, Scene};

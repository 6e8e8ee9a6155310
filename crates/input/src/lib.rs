//! Desktop input mapped to camera actions.
//!
//! # Invariants
//! - The scene consumes [`Action`]s, never raw key or cursor events.
//! - Opposing keys cancel out: a combination absent from the walk table
//!   produces no movement at all.

pub mod action;
pub mod controls;
pub mod source;
pub mod walk;

pub use action::Action;
pub use controls::FirstPersonControls;
pub use source::{InputSource, Key, ScriptedInput};
pub use walk::{WALK_SPEED, WalkKeys, walk_delta, walk_offset};

//! # Simulation Engine
//!
//! The deterministic core: fixed timestep, fighter state and physics,
//! data-driven actions, combat resolution and input history.
//!
//! - `fighter` / `simulation` - the per-frame update loop and match loop
//! - `action` / `subaction` / `script` - the data-driven move system
//! - `hitbox` - combat shapes, locks and knockback math
//! - `input_buffer` - frame-indexed input log with temporal queries
//! - `stage` / `sprite` - static geometry and the rendering boundary

pub mod action;
pub mod events;
pub mod fighter;
pub mod geometry;
pub mod hitbox;
pub mod input_buffer;
pub mod physics_constants;
pub mod script;
pub mod simulation;
pub mod sprite;
pub mod stage;
pub mod subaction;
pub mod timestep;

//! # pf_core - Deterministic Platform Fighter Simulation Engine
//!
//! This library provides a deterministic, fixed-timestep platform fighter
//! simulation core: fighter physics and state, data-driven actions built
//! from a closed set of scripted operations, hitbox/hurtbox combat
//! resolution, and a frame-indexed input buffer with temporal queries.
//!
//! ## Features
//! - 100% deterministic simulation (same inputs = same state)
//! - Data-driven move definitions loaded from JSON
//! - Frame-exact knockback, shields and hitbox locks
//! - Rendering, audio and input devices stay outside the core

// Allow unused code for features under development
#![allow(dead_code)]
// Game engine APIs often require many parameters for physics, state, etc.
#![allow(clippy::too_many_arguments)]

pub mod engine;
pub mod error;
pub mod models;

// Re-export the main simulation surface
pub use engine::action::{Action, ActionBehavior, ActionState, ScriptedBehavior};
pub use engine::events::EngineEvent;
pub use engine::fighter::{Fighter, FighterId};
pub use engine::geometry::Rect;
pub use engine::hitbox::{Hitbox, HitboxKind, HitboxLock, HitboxParams, LockId};
pub use engine::input_buffer::{InputBuffer, Key, Keybindings, LogicalKey};
pub use engine::script::{
    ActionDef, MoveSet, Predicate, ScriptError, ScriptedActionFactory, StateTransition,
    TransitionRule,
};
pub use engine::simulation::Simulation;
pub use engine::stage::{Platform, Stage};
pub use engine::sprite::{NullSprite, Sprite};
pub use engine::subaction::{Comparator, SubAction, VarSource, VarValue};
pub use error::{EngineError, Result};
pub use models::attributes::FighterAttributes;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

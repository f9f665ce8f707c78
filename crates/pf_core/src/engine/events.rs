//! Observable match events.
//!
//! Fighters queue these as side effects of a frame; the simulation drains
//! them after each tick so embedders can drive UI, sound and match rules
//! without reaching into fighter internals.

use serde::{Deserialize, Serialize};

use crate::engine::fighter::FighterId;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EngineEvent {
    /// A fighter crossed the blast line and respawned
    Died { fighter: FighterId },

    /// Shield integrity reached zero while shielding
    ShieldBreak { fighter: FighterId },

    /// A hitbox connected with a hurtbox. `damage` is the effective
    /// (charge-scaled) damage dealt.
    HitLanded { attacker: FighterId, victim: FighterId, damage: f32 },
}

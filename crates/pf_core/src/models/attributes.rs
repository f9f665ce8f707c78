//! Per-fighter movement configuration.
//!
//! These values come from character data files and stay fixed for the life
//! of a fighter unless a scripted move rewrites one (charge moves that
//! alter gravity, crouch states that raise friction, and so on). Script
//! access goes through the name-based `get`/`set` pair.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FighterAttributes {
    /// Total jumps available before touching the ground again
    #[serde(default = "default_jumps")]
    pub jumps: u32,

    /// Grounded easing toward preferred horizontal speed (px/frame^2)
    #[serde(default = "default_friction")]
    pub friction: f32,

    /// Airborne easing toward preferred horizontal speed (px/frame^2)
    #[serde(default = "default_air_control")]
    pub air_control: f32,

    /// Downward acceleration per airborne frame (px/frame^2)
    #[serde(default = "default_gravity")]
    pub gravity: f32,

    /// Terminal fall speed (px/frame)
    #[serde(default = "default_max_fall_speed")]
    pub max_fall_speed: f32,

    /// Knockback resistance; heavier fighters fly less far
    #[serde(default = "default_weight")]
    pub weight: f32,
}

fn default_jumps() -> u32 {
    2
}

fn default_friction() -> f32 {
    0.3
}

fn default_air_control() -> f32 {
    0.2
}

fn default_gravity() -> f32 {
    0.5
}

fn default_max_fall_speed() -> f32 {
    20.0
}

fn default_weight() -> f32 {
    100.0
}

impl Default for FighterAttributes {
    fn default() -> Self {
        Self {
            jumps: default_jumps(),
            friction: default_friction(),
            air_control: default_air_control(),
            gravity: default_gravity(),
            max_fall_speed: default_max_fall_speed(),
            weight: default_weight(),
        }
    }
}

impl FighterAttributes {
    /// Look up an attribute by its data-file name. `jumps` widens to f32.
    pub fn get(&self, name: &str) -> Option<f32> {
        match name {
            "jumps" => Some(self.jumps as f32),
            "friction" => Some(self.friction),
            "air_control" => Some(self.air_control),
            "gravity" => Some(self.gravity),
            "max_fall_speed" => Some(self.max_fall_speed),
            "weight" => Some(self.weight),
            _ => None,
        }
    }

    /// Overwrite an attribute by its data-file name. `jumps` truncates.
    pub fn set(&mut self, name: &str, value: f32) -> Result<()> {
        match name {
            "jumps" => self.jumps = value as u32,
            "friction" => self.friction = value,
            "air_control" => self.air_control = value,
            "gravity" => self.gravity = value,
            "max_fall_speed" => self.max_fall_speed = value,
            "weight" => self.weight = value,
            _ => {
                return Err(EngineError::InvalidParameter(format!(
                    "unknown fighter attribute: {}",
                    name
                )))
            }
        }
        Ok(())
    }
}

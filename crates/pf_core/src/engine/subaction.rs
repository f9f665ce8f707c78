//! Scripted operations: the closed instruction set move data is built from.
//!
//! Each operation performs exactly one observable effect against the
//! current action's state or the owning fighter. Conditionals carry their
//! own child lists, so a whole frame of a move is a small tree of these.
//!
//! Referencing a hitbox name that the action never created is an authoring
//! error in the move data and panics; tolerated input problems (unknown
//! opcode tags) are handled at load time instead, see `script`.

use crate::engine::action::ActionState;
use crate::engine::fighter::Fighter;
use crate::engine::hitbox::{Hitbox, HitboxKind, HitboxLock, HitboxParams, HitboxPatch};
use crate::engine::script::StateTransition;

use serde::{Deserialize, Serialize};

/// A script-visible value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VarValue {
    Bool(bool),
    Int(i64),
    Float(f32),
    Str(String),
}

impl VarValue {
    /// Numeric view; ints widen. Bools and strings are not numbers.
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            VarValue::Int(v) => Some(*v as f32),
            VarValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Compare against another value. Numbers compare across Int/Float;
    /// bools and strings support equality only.
    pub fn compare(&self, comparator: Comparator, other: &VarValue) -> bool {
        if let (Some(a), Some(b)) = (self.as_f32(), other.as_f32()) {
            return match comparator {
                Comparator::Eq => a == b,
                Comparator::Ne => a != b,
                Comparator::Lt => a < b,
                Comparator::Le => a <= b,
                Comparator::Gt => a > b,
                Comparator::Ge => a >= b,
            };
        }
        match comparator {
            Comparator::Eq => self.same_value(other),
            Comparator::Ne => !self.same_value(other),
            _ => false,
        }
    }

    fn same_value(&self, other: &VarValue) -> bool {
        match (self, other) {
            (VarValue::Bool(a), VarValue::Bool(b)) => a == b,
            (VarValue::Str(a), VarValue::Str(b)) => a == b,
            _ => false,
        }
    }
}

/// The closed comparator set. Move data spells these `==`, `<`, `<=`,
/// `>`, `>=`, `!=`; anything else fails at load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
    Ne,
}

impl Comparator {
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "==" => Some(Comparator::Eq),
            "<" => Some(Comparator::Lt),
            "<=" => Some(Comparator::Le),
            ">" => Some(Comparator::Gt),
            ">=" => Some(Comparator::Ge),
            "!=" => Some(Comparator::Ne),
            _ => None,
        }
    }

    /// Ordering comparators require numeric operands.
    pub fn is_ordering(&self) -> bool {
        !matches!(self, Comparator::Eq | Comparator::Ne)
    }
}

/// Where a conditional reads its left-hand value from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VarSource {
    /// A variable previously written by `ModifyActionVar`
    ActionVar(String),
    /// A fighter attribute by data-file name
    Attribute(String),
    /// The action's current frame counter
    Frame,
}

/// One scripted operation.
#[derive(Debug, Clone, PartialEq)]
pub enum SubAction {
    ChangeSprite { sprite: String, subimage: u32 },
    ChangeSubimage { index: u32 },
    ChangeFighterSpeed { x: Option<f32>, y: Option<f32>, x_relative: bool },
    ChangeFighterPreferredSpeed { x: Option<f32>, y: Option<f32> },
    ApplyForceVector { magnitude: f32, direction: f32, preferred: bool },
    ShiftPosition { x: Option<f32>, y: Option<f32> },
    ModifyAttribute { name: String, value: f32 },
    ModifyActionVar { name: String, value: VarValue },
    SetFrame { frame: u32 },
    NextFrame,
    IfVar {
        source: VarSource,
        comparator: Comparator,
        value: VarValue,
        if_ops: Vec<SubAction>,
        else_ops: Vec<SubAction>,
    },
    CreateHitbox { name: String, kind: HitboxKind, params: HitboxParams },
    ActivateHitbox { name: String },
    DeactivateHitbox { name: String },
    UpdateHitbox { name: String },
    ModifyHitbox { name: String, patch: HitboxPatch },
    TransitionState { to: StateTransition },
    UpdateLandingLag { frames: u32, reset: bool },
    Print { message: String },
}

impl SubAction {
    pub fn execute(&self, state: &mut ActionState, fighter: &mut Fighter) {
        match self {
            SubAction::ChangeSprite { sprite, subimage } => {
                state.sprite_name = sprite.clone();
                fighter.change_sprite(sprite, *subimage);
            }
            SubAction::ChangeSubimage { index } => {
                fighter.change_subimage(*index);
            }
            SubAction::ChangeFighterSpeed { x, y, x_relative } => {
                if let Some(x) = x {
                    fighter.velocity.0 =
                        if *x_relative { x * fighter.facing as f32 } else { *x };
                }
                if let Some(y) = y {
                    fighter.velocity.1 = *y;
                }
            }
            SubAction::ChangeFighterPreferredSpeed { x, y } => {
                if let Some(x) = x {
                    fighter.preferred_velocity.0 = *x;
                }
                if let Some(y) = y {
                    fighter.preferred_velocity.1 = *y;
                }
            }
            SubAction::ApplyForceVector { magnitude, direction, preferred } => {
                fighter.set_speed(*magnitude, *direction, *preferred);
            }
            SubAction::ShiftPosition { x, y } => {
                if let Some(x) = x {
                    fighter.rect.x = *x;
                }
                if let Some(y) = y {
                    fighter.rect.y = *y;
                }
            }
            SubAction::ModifyAttribute { name, value } => {
                if fighter.attributes.set(name, *value).is_err() {
                    panic!("modifyAttribute references unknown attribute '{}'", name);
                }
            }
            SubAction::ModifyActionVar { name, value } => {
                state.vars.insert(name.clone(), value.clone());
            }
            SubAction::SetFrame { frame } => {
                state.frame = *frame;
                state.frame_set_this_update = true;
            }
            SubAction::NextFrame => {
                state.frame += 1;
            }
            SubAction::IfVar { source, comparator, value, if_ops, else_ops } => {
                let current = match source {
                    VarSource::ActionVar(name) => state.vars.get(name).cloned(),
                    VarSource::Attribute(name) => {
                        fighter.attributes.get(name).map(VarValue::Float)
                    }
                    VarSource::Frame => Some(VarValue::Int(state.frame as i64)),
                };
                // A variable that was never written compares false.
                let cond = current.map(|v| v.compare(*comparator, value)).unwrap_or(false);
                let branch = if cond { if_ops } else { else_ops };
                for op in branch {
                    op.execute(state, fighter);
                }
            }
            SubAction::CreateHitbox { name, kind, params } => {
                let lock = if !params.lock.is_empty() {
                    *state
                        .hitbox_locks
                        .entry(params.lock.clone())
                        .or_insert_with(HitboxLock::new)
                } else {
                    HitboxLock::new()
                };
                let hitbox = Hitbox::new(fighter.id, params.clone(), *kind, lock.id());
                state.hitboxes.insert(name.clone(), hitbox);
            }
            SubAction::ActivateHitbox { name } => {
                let center = fighter.rect.center();
                let facing = fighter.facing;
                let hb = hitbox_mut(state, name);
                hb.active = true;
                hb.update_position(center, facing);
            }
            SubAction::DeactivateHitbox { name } => {
                hitbox_mut(state, name).active = false;
            }
            SubAction::UpdateHitbox { name } => {
                let center = fighter.rect.center();
                let facing = fighter.facing;
                hitbox_mut(state, name).update_position(center, facing);
            }
            SubAction::ModifyHitbox { name, patch } => {
                hitbox_mut(state, name).apply_patch(patch);
            }
            SubAction::TransitionState { to } => {
                fighter.queue_transition(*to);
            }
            SubAction::UpdateLandingLag { frames, reset } => {
                fighter.update_landing_lag(*frames, *reset);
            }
            SubAction::Print { message } => {
                log::info!("{}", message);
            }
        }
    }
}

fn hitbox_mut<'a>(state: &'a mut ActionState, name: &str) -> &'a mut Hitbox {
    state
        .hitboxes
        .get_mut(name)
        .unwrap_or_else(|| panic!("action '{}' has no hitbox named '{}'", state.name, name))
}

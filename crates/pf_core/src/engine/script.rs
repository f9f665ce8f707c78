//! Move data loading: JSON action documents into runnable definitions.
//!
//! A move file is one JSON document with an `actions` map. Each action
//! carries set-up and tear-down op lists, a frame-indexed op table and a
//! list of transition rules. Ops are decoded node by node against the
//! closed opcode set; an unknown opcode tag is logged and skipped so old
//! engines tolerate newer move files. Everything else that is malformed
//! (bad comparators, unknown transitions, non-numeric frame keys) fails
//! the load with a `ScriptError`.
//!
//! Decoded definitions are immutable and shared via `Arc`, so a hundred
//! activations of the same move share one definition.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use fxhash::FxHashMap;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::engine::action::{Action, ActionState, ScriptedBehavior};
use crate::engine::fighter::Fighter;
use crate::engine::hitbox::{HitboxKind, HitboxParams, HitboxPatch};
use crate::engine::input_buffer::LogicalKey;
use crate::engine::subaction::{Comparator, SubAction, VarSource, VarValue};

#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("action '{action}': frame key '{key}' is not a frame number")]
    BadFrameKey { action: String, key: String },

    #[error("action '{action}': unknown comparator '{text}'")]
    BadComparator { action: String, text: String },

    #[error("action '{action}': unknown state transition '{name}'")]
    UnknownTransition { action: String, name: String },

    #[error("action '{action}': unknown predicate check '{kind}'")]
    UnknownPredicate { action: String, kind: String },

    #[error("action '{action}': unknown logical key '{name}'")]
    UnknownKey { action: String, name: String },

    #[error("action '{action}': op '{op}' is missing field '{field}'")]
    MissingField { action: String, op: String, field: String },

    #[error("action '{action}': op node is not an object")]
    MalformedOp { action: String },
}

/// The closed set of fighter state changes a script or the engine itself
/// can request. Each maps to a conventionally named action definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateTransition {
    Idle,
    Move,
    Run,
    Pivot,
    Stop,
    Land,
    Fall,
    Jump,
    AirJump,
    GroundAttack,
    AirAttack,
    Shield,
    ShieldBreak,
    ForwardRoll,
    BackwardRoll,
    SpotDodge,
    AirDodge,
}

impl StateTransition {
    pub const ALL: [StateTransition; 17] = [
        StateTransition::Idle,
        StateTransition::Move,
        StateTransition::Run,
        StateTransition::Pivot,
        StateTransition::Stop,
        StateTransition::Land,
        StateTransition::Fall,
        StateTransition::Jump,
        StateTransition::AirJump,
        StateTransition::GroundAttack,
        StateTransition::AirAttack,
        StateTransition::Shield,
        StateTransition::ShieldBreak,
        StateTransition::ForwardRoll,
        StateTransition::BackwardRoll,
        StateTransition::SpotDodge,
        StateTransition::AirDodge,
    ];

    /// The action definition name this transition resolves to.
    pub fn action_name(&self) -> &'static str {
        match self {
            StateTransition::Idle => "idle",
            StateTransition::Move => "move",
            StateTransition::Run => "run",
            StateTransition::Pivot => "pivot",
            StateTransition::Stop => "stop",
            StateTransition::Land => "land",
            StateTransition::Fall => "fall",
            StateTransition::Jump => "jump",
            StateTransition::AirJump => "air_jump",
            StateTransition::GroundAttack => "ground_attack",
            StateTransition::AirAttack => "air_attack",
            StateTransition::Shield => "shield",
            StateTransition::ShieldBreak => "shield_break",
            StateTransition::ForwardRoll => "forward_roll",
            StateTransition::BackwardRoll => "backward_roll",
            StateTransition::SpotDodge => "spot_dodge",
            StateTransition::AirDodge => "air_dodge",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        StateTransition::ALL.iter().copied().find(|t| t.action_name() == name)
    }
}

/// A transition condition evaluated once per frame against the current
/// action and fighter. Combinators nest arbitrarily.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// The action's frame counter against a literal
    Frame { comparator: Comparator, value: u32 },
    /// An action var or attribute against a literal; unset vars fail
    Var { source: VarSource, comparator: Comparator, value: VarValue },
    /// A temporal query against the fighter's input buffer
    Input { key: LogicalKey, within: usize, pressed: bool, and_released: bool, not_released: bool },
    /// The key is held right now
    Held { key: LogicalKey },
    Grounded { value: bool },
    All(Vec<Predicate>),
    Any(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn evaluate(&self, state: &ActionState, fighter: &Fighter) -> bool {
        match self {
            Predicate::Frame { comparator, value } => VarValue::Int(state.frame as i64)
                .compare(*comparator, &VarValue::Int(*value as i64)),
            Predicate::Var { source, comparator, value } => {
                let current = match source {
                    VarSource::ActionVar(name) => state.vars.get(name).cloned(),
                    VarSource::Attribute(name) => fighter.attributes.get(name).map(VarValue::Float),
                    VarSource::Frame => Some(VarValue::Int(state.frame as i64)),
                };
                current.map(|v| v.compare(*comparator, value)).unwrap_or(false)
            }
            Predicate::Input { key, within, pressed, and_released, not_released } => {
                fighter.buffer_contains(*key, *within, *pressed, *and_released, *not_released)
            }
            Predicate::Held { key } => fighter.keys_contain(*key),
            Predicate::Grounded { value } => fighter.grounded == *value,
            Predicate::All(children) => children.iter().all(|p| p.evaluate(state, fighter)),
            Predicate::Any(children) => children.iter().any(|p| p.evaluate(state, fighter)),
            Predicate::Not(child) => !child.evaluate(state, fighter),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransitionRule {
    pub when: Predicate,
    pub to: StateTransition,
}

/// One fully decoded action. Frame ops run on their exact frame; the
/// counter auto-advances afterwards unless a `SetFrame` op overrode it,
/// and wraps to `loop_frame` once it passes `length`.
#[derive(Debug)]
pub struct ActionDef {
    pub name: String,
    /// Sprite to switch to on entry; empty means "use the action name"
    pub sprite: String,
    pub length: u32,
    pub loop_frame: Option<u32>,
    pub set_up: Vec<SubAction>,
    pub tear_down: Vec<SubAction>,
    pub frames: FxHashMap<u32, Vec<SubAction>>,
    pub transitions: Vec<TransitionRule>,
}

// ============================================================
// Raw document shape
// ============================================================

#[derive(Debug, Deserialize)]
struct RawMoveSet {
    #[serde(default)]
    actions: FxHashMap<String, RawActionDef>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawActionDef {
    sprite: String,
    length: u32,
    loop_frame: Option<u32>,
    set_up: Vec<Value>,
    tear_down: Vec<Value>,
    frames: FxHashMap<String, Vec<Value>>,
    transitions: Vec<RawTransitionRule>,
}

#[derive(Debug, Deserialize)]
struct RawTransitionRule {
    when: Value,
    to: String,
}

/// A named collection of action definitions, usually one per character.
#[derive(Debug, Default)]
pub struct MoveSet {
    actions: FxHashMap<String, Arc<ActionDef>>,
}

impl MoveSet {
    pub fn from_json_str(text: &str) -> Result<Self, ScriptError> {
        let raw: RawMoveSet = serde_json::from_str(text)?;
        let mut actions = FxHashMap::default();
        for (name, raw_def) in raw.actions {
            let def = decode_action(&name, raw_def)?;
            actions.insert(name, Arc::new(def));
        }
        Ok(Self { actions })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScriptError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Register a definition built in code. Tests and built-in movesets
    /// use this instead of JSON.
    pub fn insert(&mut self, def: ActionDef) {
        self.actions.insert(def.name.clone(), Arc::new(def));
    }

    pub fn get(&self, name: &str) -> Option<&Arc<ActionDef>> {
        self.actions.get(name)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Turns state transitions into runnable actions by conventional name.
/// Transitions with no matching definition fall back to the inert idle.
#[derive(Debug, Default)]
pub struct ScriptedActionFactory {
    moves: MoveSet,
}

impl ScriptedActionFactory {
    pub fn new(moves: MoveSet) -> Self {
        Self { moves }
    }

    pub fn action_for(&self, transition: StateTransition) -> Action {
        match self.moves.get(transition.action_name()) {
            Some(def) => {
                Action::new(&def.name, Box::new(ScriptedBehavior::new(Arc::clone(def))))
            }
            None => Action::idle(),
        }
    }

    pub fn moves(&self) -> &MoveSet {
        &self.moves
    }
}

// ============================================================
// Validation pass
// ============================================================

fn decode_action(name: &str, raw: RawActionDef) -> Result<ActionDef, ScriptError> {
    let mut frames = FxHashMap::default();
    for (key, nodes) in raw.frames {
        let frame: u32 = key.parse().map_err(|_| ScriptError::BadFrameKey {
            action: name.to_string(),
            key: key.clone(),
        })?;
        frames.insert(frame, decode_ops(name, &nodes)?);
    }

    let mut transitions = Vec::with_capacity(raw.transitions.len());
    for rule in raw.transitions {
        let to = StateTransition::parse(&rule.to).ok_or_else(|| ScriptError::UnknownTransition {
            action: name.to_string(),
            name: rule.to.clone(),
        })?;
        transitions.push(TransitionRule { when: decode_predicate(name, &rule.when)?, to });
    }

    Ok(ActionDef {
        name: name.to_string(),
        sprite: raw.sprite,
        length: raw.length,
        loop_frame: raw.loop_frame,
        set_up: decode_ops(name, &raw.set_up)?,
        tear_down: decode_ops(name, &raw.tear_down)?,
        frames,
        transitions,
    })
}

fn decode_ops(action: &str, nodes: &[Value]) -> Result<Vec<SubAction>, ScriptError> {
    let mut ops = Vec::with_capacity(nodes.len());
    for node in nodes {
        if let Some(op) = decode_op(action, node)? {
            ops.push(op);
        }
    }
    Ok(ops)
}

fn decode_op(action: &str, node: &Value) -> Result<Option<SubAction>, ScriptError> {
    let map = node
        .as_object()
        .ok_or_else(|| ScriptError::MalformedOp { action: action.to_string() })?;
    let tag = req_str(action, "?", map, "op")?;

    let op = match tag {
        "changeSprite" => SubAction::ChangeSprite {
            sprite: req_str(action, tag, map, "sprite")?.to_string(),
            subimage: opt_u32(map, "subimage", 0),
        },
        "changeSubimage" => SubAction::ChangeSubimage { index: req_u32(action, tag, map, "index")? },
        "changeFighterSpeed" => SubAction::ChangeFighterSpeed {
            x: opt_f32(map, "x"),
            y: opt_f32(map, "y"),
            x_relative: opt_bool(map, "relative", false),
        },
        "changeFighterPreferredSpeed" => SubAction::ChangeFighterPreferredSpeed {
            x: opt_f32(map, "x"),
            y: opt_f32(map, "y"),
        },
        "applyForceVector" => SubAction::ApplyForceVector {
            magnitude: req_f32(action, tag, map, "magnitude")?,
            direction: req_f32(action, tag, map, "direction")?,
            preferred: opt_bool(map, "preferred", false),
        },
        "shiftPosition" => {
            SubAction::ShiftPosition { x: opt_f32(map, "x"), y: opt_f32(map, "y") }
        }
        "modifyAttribute" => SubAction::ModifyAttribute {
            name: req_str(action, tag, map, "name")?.to_string(),
            value: req_f32(action, tag, map, "value")?,
        },
        "modifyActionVar" => SubAction::ModifyActionVar {
            name: req_str(action, tag, map, "name")?.to_string(),
            value: decode_var_value(action, tag, "value", req(action, tag, map, "value")?)?,
        },
        "setFrame" => SubAction::SetFrame { frame: req_u32(action, tag, map, "frame")? },
        "nextFrame" => SubAction::NextFrame,
        "ifVar" => decode_if_var(action, map)?,
        "createHitbox" => SubAction::CreateHitbox {
            name: req_str(action, tag, map, "name")?.to_string(),
            kind: match map.get("kind") {
                Some(v) => serde_json::from_value::<HitboxKind>(v.clone())?,
                None => HitboxKind::default(),
            },
            params: match map.get("params") {
                Some(v) => serde_json::from_value::<HitboxParams>(v.clone())?,
                None => HitboxParams::default(),
            },
        },
        "activateHitbox" => {
            SubAction::ActivateHitbox { name: req_str(action, tag, map, "name")?.to_string() }
        }
        "deactivateHitbox" => {
            SubAction::DeactivateHitbox { name: req_str(action, tag, map, "name")?.to_string() }
        }
        "updateHitbox" => {
            SubAction::UpdateHitbox { name: req_str(action, tag, map, "name")?.to_string() }
        }
        "modifyHitbox" => SubAction::ModifyHitbox {
            name: req_str(action, tag, map, "name")?.to_string(),
            patch: match map.get("patch") {
                Some(v) => serde_json::from_value::<HitboxPatch>(v.clone())?,
                None => HitboxPatch::default(),
            },
        },
        "transitionState" => {
            let to = req_str(action, tag, map, "to")?;
            SubAction::TransitionState {
                to: StateTransition::parse(to).ok_or_else(|| ScriptError::UnknownTransition {
                    action: action.to_string(),
                    name: to.to_string(),
                })?,
            }
        }
        "updateLandingLag" => SubAction::UpdateLandingLag {
            frames: req_u32(action, tag, map, "frames")?,
            reset: opt_bool(map, "reset", false),
        },
        "print" => SubAction::Print { message: req_str(action, tag, map, "message")?.to_string() },
        unknown => {
            log::warn!("action '{}': ignoring unknown subaction op '{}'", action, unknown);
            return Ok(None);
        }
    };
    Ok(Some(op))
}

fn decode_if_var(action: &str, map: &serde_json::Map<String, Value>) -> Result<SubAction, ScriptError> {
    let source = match map.get("source").and_then(Value::as_str).unwrap_or("var") {
        "var" => VarSource::ActionVar(req_str(action, "ifVar", map, "name")?.to_string()),
        "attribute" => VarSource::Attribute(req_str(action, "ifVar", map, "name")?.to_string()),
        "frame" => VarSource::Frame,
        other => {
            return Err(ScriptError::UnknownPredicate {
                action: action.to_string(),
                kind: other.to_string(),
            })
        }
    };
    let comparator = decode_comparator(
        action,
        map.get("comparator").and_then(Value::as_str).unwrap_or("=="),
    )?;
    let value = decode_var_value(action, "ifVar", "value", req(action, "ifVar", map, "value")?)?;
    let if_ops = match map.get("then") {
        Some(Value::Array(nodes)) => decode_ops(action, nodes)?,
        _ => Vec::new(),
    };
    let else_ops = match map.get("else") {
        Some(Value::Array(nodes)) => decode_ops(action, nodes)?,
        _ => Vec::new(),
    };
    Ok(SubAction::IfVar { source, comparator, value, if_ops, else_ops })
}

fn decode_predicate(action: &str, node: &Value) -> Result<Predicate, ScriptError> {
    let map = node
        .as_object()
        .ok_or_else(|| ScriptError::MalformedOp { action: action.to_string() })?;
    let kind = req_str(action, "when", map, "check")?;

    let predicate = match kind {
        "frame" => Predicate::Frame {
            comparator: decode_comparator(
                action,
                map.get("comparator").and_then(Value::as_str).unwrap_or(">="),
            )?,
            value: req_u32(action, kind, map, "value")?,
        },
        "var" => Predicate::Var {
            source: VarSource::ActionVar(req_str(action, kind, map, "name")?.to_string()),
            comparator: decode_comparator(
                action,
                map.get("comparator").and_then(Value::as_str).unwrap_or("=="),
            )?,
            value: decode_var_value(action, kind, "value", req(action, kind, map, "value")?)?,
        },
        "attribute" => Predicate::Var {
            source: VarSource::Attribute(req_str(action, kind, map, "name")?.to_string()),
            comparator: decode_comparator(
                action,
                map.get("comparator").and_then(Value::as_str).unwrap_or("=="),
            )?,
            value: decode_var_value(action, kind, "value", req(action, kind, map, "value")?)?,
        },
        "input" => Predicate::Input {
            key: decode_key(action, req_str(action, kind, map, "key")?)?,
            within: opt_u32(map, "within", 0) as usize,
            pressed: opt_bool(map, "pressed", true),
            and_released: opt_bool(map, "and_released", false),
            not_released: opt_bool(map, "not_released", false),
        },
        "held" => Predicate::Held { key: decode_key(action, req_str(action, kind, map, "key")?)? },
        "grounded" => Predicate::Grounded { value: opt_bool(map, "value", true) },
        "all" | "any" => {
            let nodes = match req(action, kind, map, "of")? {
                Value::Array(nodes) => nodes,
                _ => {
                    return Err(ScriptError::MissingField {
                        action: action.to_string(),
                        op: kind.to_string(),
                        field: "of".to_string(),
                    })
                }
            };
            let mut children = Vec::with_capacity(nodes.len());
            for child in nodes {
                children.push(decode_predicate(action, child)?);
            }
            if kind == "all" {
                Predicate::All(children)
            } else {
                Predicate::Any(children)
            }
        }
        "not" => Predicate::Not(Box::new(decode_predicate(
            action,
            req(action, kind, map, "of")?,
        )?)),
        unknown => {
            return Err(ScriptError::UnknownPredicate {
                action: action.to_string(),
                kind: unknown.to_string(),
            })
        }
    };
    Ok(predicate)
}

// ============================================================
// Field helpers
// ============================================================

fn decode_comparator(action: &str, text: &str) -> Result<Comparator, ScriptError> {
    Comparator::parse(text).ok_or_else(|| ScriptError::BadComparator {
        action: action.to_string(),
        text: text.to_string(),
    })
}

fn decode_key(action: &str, name: &str) -> Result<LogicalKey, ScriptError> {
    LogicalKey::ALL
        .iter()
        .copied()
        .find(|l| l.name() == name)
        .ok_or_else(|| ScriptError::UnknownKey {
            action: action.to_string(),
            name: name.to_string(),
        })
}

fn decode_var_value(
    action: &str,
    op: &str,
    field: &str,
    value: &Value,
) -> Result<VarValue, ScriptError> {
    match value {
        Value::Bool(b) => Ok(VarValue::Bool(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(VarValue::Int(i)),
            None => Ok(VarValue::Float(n.as_f64().unwrap_or(0.0) as f32)),
        },
        Value::String(s) => Ok(VarValue::Str(s.clone())),
        _ => Err(ScriptError::MissingField {
            action: action.to_string(),
            op: op.to_string(),
            field: field.to_string(),
        }),
    }
}

fn req<'a>(
    action: &str,
    op: &str,
    map: &'a serde_json::Map<String, Value>,
    field: &str,
) -> Result<&'a Value, ScriptError> {
    map.get(field).ok_or_else(|| ScriptError::MissingField {
        action: action.to_string(),
        op: op.to_string(),
        field: field.to_string(),
    })
}

fn req_str<'a>(
    action: &str,
    op: &str,
    map: &'a serde_json::Map<String, Value>,
    field: &str,
) -> Result<&'a str, ScriptError> {
    req(action, op, map, field)?.as_str().ok_or_else(|| ScriptError::MissingField {
        action: action.to_string(),
        op: op.to_string(),
        field: field.to_string(),
    })
}

fn req_f32(
    action: &str,
    op: &str,
    map: &serde_json::Map<String, Value>,
    field: &str,
) -> Result<f32, ScriptError> {
    req(action, op, map, field)?.as_f64().map(|f| f as f32).ok_or_else(|| {
        ScriptError::MissingField {
            action: action.to_string(),
            op: op.to_string(),
            field: field.to_string(),
        }
    })
}

fn req_u32(
    action: &str,
    op: &str,
    map: &serde_json::Map<String, Value>,
    field: &str,
) -> Result<u32, ScriptError> {
    req(action, op, map, field)?.as_u64().map(|v| v as u32).ok_or_else(|| {
        ScriptError::MissingField {
            action: action.to_string(),
            op: op.to_string(),
            field: field.to_string(),
        }
    })
}

fn opt_f32(map: &serde_json::Map<String, Value>, field: &str) -> Option<f32> {
    map.get(field).and_then(Value::as_f64).map(|f| f as f32)
}

fn opt_u32(map: &serde_json::Map<String, Value>, field: &str, default: u32) -> u32 {
    map.get(field).and_then(Value::as_u64).map(|v| v as u32).unwrap_or(default)
}

fn opt_bool(map: &serde_json::Map<String, Value>, field: &str, default: bool) -> bool {
    map.get(field).and_then(Value::as_bool).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fighter::test_support::test_fighter;

    const JAB: &str = r#"{
        "actions": {
            "ground_attack": {
                "sprite": "jab",
                "length": 12,
                "set_up": [
                    {"op": "changeFighterPreferredSpeed", "x": 0.0},
                    {"op": "createHitbox", "name": "fist",
                     "params": {"center": [14.0, 0.0], "size": [10.0, 8.0],
                                "damage": 4.0, "base_knockback": 6.0}}
                ],
                "tear_down": [
                    {"op": "deactivateHitbox", "name": "fist"}
                ],
                "frames": {
                    "3": [{"op": "activateHitbox", "name": "fist"}],
                    "6": [{"op": "deactivateHitbox", "name": "fist"}],
                    "12": [{"op": "transitionState", "to": "idle"}]
                },
                "transitions": [
                    {"when": {"check": "all", "of": [
                        {"check": "frame", "comparator": ">=", "value": 10},
                        {"check": "input", "key": "attack", "within": 4}
                    ]}, "to": "ground_attack"}
                ]
            }
        }
    }"#;

    #[test]
    fn test_load_full_action_document() {
        let moves = MoveSet::from_json_str(JAB).unwrap();
        assert_eq!(moves.len(), 1);
        let def = moves.get("ground_attack").unwrap();
        assert_eq!(def.sprite, "jab");
        assert_eq!(def.length, 12);
        assert_eq!(def.set_up.len(), 2);
        assert_eq!(def.tear_down.len(), 1);
        assert_eq!(def.frames[&3], vec![SubAction::ActivateHitbox { name: "fist".into() }]);
        assert_eq!(
            def.frames[&12],
            vec![SubAction::TransitionState { to: StateTransition::Idle }]
        );
        assert_eq!(def.transitions.len(), 1);
        assert_eq!(def.transitions[0].to, StateTransition::GroundAttack);
    }

    #[test]
    fn test_create_hitbox_params_decode_through_serde() {
        let moves = MoveSet::from_json_str(JAB).unwrap();
        let def = moves.get("ground_attack").unwrap();
        match &def.set_up[1] {
            SubAction::CreateHitbox { name, kind, params } => {
                assert_eq!(name, "fist");
                assert_eq!(*kind, HitboxKind::Damage);
                assert_eq!(params.center, (14.0, 0.0));
                assert_eq!(params.damage, 4.0);
                // Unspecified fields keep their authoring defaults
                assert_eq!(params.hitstun, 1.0);
            }
            other => panic!("expected createHitbox, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_op_is_skipped_not_fatal() {
        let doc = r#"{"actions": {"idle": {
            "set_up": [
                {"op": "doABarrelRoll"},
                {"op": "nextFrame"}
            ]
        }}}"#;
        let moves = MoveSet::from_json_str(doc).unwrap();
        let def = moves.get("idle").unwrap();
        assert_eq!(def.set_up, vec![SubAction::NextFrame]);
    }

    #[test]
    fn test_bad_comparator_fails_load() {
        let doc = r#"{"actions": {"idle": {
            "transitions": [{"when": {"check": "frame", "comparator": "~=", "value": 1}, "to": "fall"}]
        }}}"#;
        let err = MoveSet::from_json_str(doc).unwrap_err();
        assert!(matches!(err, ScriptError::BadComparator { .. }), "got {:?}", err);
    }

    #[test]
    fn test_unknown_transition_fails_load() {
        let doc = r#"{"actions": {"idle": {
            "frames": {"0": [{"op": "transitionState", "to": "moonwalk"}]}
        }}}"#;
        let err = MoveSet::from_json_str(doc).unwrap_err();
        assert!(matches!(err, ScriptError::UnknownTransition { .. }), "got {:?}", err);
    }

    #[test]
    fn test_unknown_predicate_and_key_fail_load() {
        let doc = r#"{"actions": {"idle": {
            "transitions": [{"when": {"check": "moon_phase"}, "to": "fall"}]
        }}}"#;
        assert!(matches!(
            MoveSet::from_json_str(doc).unwrap_err(),
            ScriptError::UnknownPredicate { .. }
        ));

        let doc = r#"{"actions": {"idle": {
            "transitions": [{"when": {"check": "held", "key": "start"}, "to": "fall"}]
        }}}"#;
        assert!(matches!(
            MoveSet::from_json_str(doc).unwrap_err(),
            ScriptError::UnknownKey { .. }
        ));
    }

    #[test]
    fn test_bad_frame_key_fails_load() {
        let doc = r#"{"actions": {"idle": {
            "frames": {"startup": [{"op": "nextFrame"}]}
        }}}"#;
        let err = MoveSet::from_json_str(doc).unwrap_err();
        assert!(matches!(err, ScriptError::BadFrameKey { .. }), "got {:?}", err);
    }

    #[test]
    fn test_state_transition_name_round_trip() {
        for t in StateTransition::ALL {
            assert_eq!(StateTransition::parse(t.action_name()), Some(t));
        }
        assert_eq!(StateTransition::parse("moonwalk"), None);
    }

    #[test]
    fn test_if_var_decodes_sources_and_branches() {
        let doc = r#"{"actions": {"idle": {
            "frames": {"0": [
                {"op": "ifVar", "source": "frame", "comparator": ">=", "value": 5,
                 "then": [{"op": "nextFrame"}],
                 "else": [{"op": "setFrame", "frame": 0}]}
            ]}
        }}}"#;
        let moves = MoveSet::from_json_str(doc).unwrap();
        let def = moves.get("idle").unwrap();
        match &def.frames[&0][0] {
            SubAction::IfVar { source, comparator, if_ops, else_ops, .. } => {
                assert_eq!(*source, VarSource::Frame);
                assert_eq!(*comparator, Comparator::Ge);
                assert_eq!(if_ops.len(), 1);
                assert_eq!(else_ops.len(), 1);
            }
            other => panic!("expected ifVar, got {:?}", other),
        }
    }

    #[test]
    fn test_predicate_evaluation_against_fighter() {
        let fighter = test_fighter();
        let mut state = ActionState::new("test_action");
        state.frame = 8;

        let frame_check =
            Predicate::Frame { comparator: Comparator::Ge, value: 5 };
        assert!(frame_check.evaluate(&state, &fighter));

        let grounded = Predicate::Grounded { value: fighter.grounded };
        assert!(grounded.evaluate(&state, &fighter));
        assert!(!Predicate::Not(Box::new(grounded.clone())).evaluate(&state, &fighter));

        let both = Predicate::All(vec![frame_check.clone(), grounded.clone()]);
        assert!(both.evaluate(&state, &fighter));

        let either = Predicate::Any(vec![
            Predicate::Frame { comparator: Comparator::Lt, value: 5 },
            grounded,
        ]);
        assert!(either.evaluate(&state, &fighter));
    }

    #[test]
    fn test_var_predicate_unset_fails() {
        let fighter = test_fighter();
        let state = ActionState::new("test_action");
        let p = Predicate::Var {
            source: VarSource::ActionVar("never".into()),
            comparator: Comparator::Eq,
            value: VarValue::Int(1),
        };
        assert!(!p.evaluate(&state, &fighter));
    }

    #[test]
    fn test_factory_falls_back_to_idle() {
        let factory = ScriptedActionFactory::new(MoveSet::from_json_str(JAB).unwrap());
        let action = factory.action_for(StateTransition::GroundAttack);
        assert_eq!(action.name(), "ground_attack");

        let fallback = factory.action_for(StateTransition::AirDodge);
        assert_eq!(fallback.name(), "idle");
    }
}

//! Actions: the fighter's state machine states.
//!
//! An `Action` is the pairing of per-activation state (frame counter,
//! script variables, hitboxes, locks) with a behavior implementing the
//! four lifecycle hooks. Exactly one action is current per fighter at any
//! time, and `Fighter::change_action` is the only transition primitive:
//! the incoming action's `set_up` runs before the outgoing one's
//! `tear_down`, which lets a charge move hand state across the boundary.
//!
//! Behaviors never swap the current action from inside their own hooks.
//! They queue a `StateTransition` on the fighter instead, and the fighter
//! loop applies the newest queued request after the hook returns.

use std::sync::Arc;

use fxhash::FxHashMap;

use crate::engine::fighter::Fighter;
use crate::engine::hitbox::{Hitbox, HitboxLock};
use crate::engine::script::ActionDef;
use crate::engine::subaction::VarValue;

/// Per-activation state of an action. Reset every time the action is
/// re-entered, because a fresh `Action` is built per transition.
#[derive(Debug)]
pub struct ActionState {
    pub name: String,
    pub frame: u32,
    pub sprite_name: String,
    /// Set by the `SetFrame` op; suppresses this frame's auto-advance
    pub frame_set_this_update: bool,
    pub vars: FxHashMap<String, VarValue>,
    pub hitboxes: FxHashMap<String, Hitbox>,
    pub hitbox_locks: FxHashMap<String, HitboxLock>,
}

impl ActionState {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            frame: 0,
            sprite_name: String::new(),
            frame_set_this_update: false,
            vars: FxHashMap::default(),
            hitboxes: FxHashMap::default(),
            hitbox_locks: FxHashMap::default(),
        }
    }

    /// Hitboxes currently able to hit.
    pub fn active_hitboxes(&self) -> impl Iterator<Item = &Hitbox> {
        self.hitboxes.values().filter(|h| h.active)
    }
}

/// The lifecycle hooks an action implements. External move libraries
/// plug in here; the engine itself only ships `ScriptedBehavior` (built
/// from move data, see `script`) and the empty idle fallback.
pub trait ActionBehavior {
    /// Runs once when the action becomes current, before the previous
    /// action's `tear_down`.
    fn set_up(&mut self, _state: &mut ActionState, _fighter: &mut Fighter) {}

    /// Runs once when the action stops being current. `next` is the
    /// incoming action, already set up.
    fn tear_down(&mut self, _state: &mut ActionState, _fighter: &mut Fighter, _next: &mut Action) {}

    /// Evaluates transition conditions once per frame, before `update`.
    fn state_transitions(&mut self, _state: &mut ActionState, _fighter: &mut Fighter) {}

    /// Advances the action by one frame.
    fn update(&mut self, _state: &mut ActionState, _fighter: &mut Fighter) {}
}

/// The empty fallback action. Does nothing, transitions nowhere.
pub struct IdleBehavior;

impl ActionBehavior for IdleBehavior {}

/// The data-driven behavior every loaded move runs with. Executes the
/// definition's op lists at the right lifecycle points and advances the
/// frame counter, deferring to `SetFrame` overrides and the loop point.
pub struct ScriptedBehavior {
    def: Arc<ActionDef>,
}

impl ScriptedBehavior {
    pub fn new(def: Arc<ActionDef>) -> Self {
        Self { def }
    }
}

impl ActionBehavior for ScriptedBehavior {
    fn set_up(&mut self, state: &mut ActionState, fighter: &mut Fighter) {
        let sprite =
            if self.def.sprite.is_empty() { self.def.name.as_str() } else { self.def.sprite.as_str() };
        state.sprite_name = sprite.to_string();
        fighter.change_sprite(sprite, 0);
        for op in &self.def.set_up {
            op.execute(state, fighter);
        }
    }

    fn tear_down(&mut self, state: &mut ActionState, fighter: &mut Fighter, _next: &mut Action) {
        for op in &self.def.tear_down {
            op.execute(state, fighter);
        }
    }

    fn state_transitions(&mut self, state: &mut ActionState, fighter: &mut Fighter) {
        for rule in &self.def.transitions {
            if rule.when.evaluate(state, fighter) {
                fighter.queue_transition(rule.to);
            }
        }
    }

    fn update(&mut self, state: &mut ActionState, fighter: &mut Fighter) {
        state.frame_set_this_update = false;
        if let Some(ops) = self.def.frames.get(&state.frame) {
            for op in ops {
                op.execute(state, fighter);
            }
        }
        if !state.frame_set_this_update {
            state.frame += 1;
        }
        if let Some(loop_frame) = self.def.loop_frame {
            if state.frame > self.def.length {
                state.frame = loop_frame;
            }
        }
    }
}

/// State plus behavior. The split lets a hook receive `&mut ActionState`
/// and `&mut Fighter` at the same time without aliasing.
pub struct Action {
    pub state: ActionState,
    behavior: Box<dyn ActionBehavior>,
}

impl Action {
    pub fn new(name: &str, behavior: Box<dyn ActionBehavior>) -> Self {
        Self { state: ActionState::new(name), behavior }
    }

    pub fn idle() -> Self {
        Self::new("idle", Box::new(IdleBehavior))
    }

    pub fn name(&self) -> &str {
        &self.state.name
    }

    pub fn set_up(&mut self, fighter: &mut Fighter) {
        self.behavior.set_up(&mut self.state, fighter);
    }

    pub fn tear_down(&mut self, fighter: &mut Fighter, next: &mut Action) {
        self.behavior.tear_down(&mut self.state, fighter, next);
    }

    pub fn state_transitions(&mut self, fighter: &mut Fighter) {
        self.behavior.state_transitions(&mut self.state, fighter);
    }

    pub fn update(&mut self, fighter: &mut Fighter) {
        self.behavior.update(&mut self.state, fighter);
    }
}

impl std::fmt::Debug for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Action").field("state", &self.state).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fighter::test_support::test_fighter;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct RecordingBehavior {
        tag: &'static str,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl ActionBehavior for RecordingBehavior {
        fn set_up(&mut self, _state: &mut ActionState, _fighter: &mut Fighter) {
            self.log.borrow_mut().push(format!("{}:set_up", self.tag));
        }

        fn tear_down(
            &mut self,
            _state: &mut ActionState,
            _fighter: &mut Fighter,
            next: &mut Action,
        ) {
            self.log.borrow_mut().push(format!("{}:tear_down->{}", self.tag, next.name()));
        }

        fn update(&mut self, state: &mut ActionState, _fighter: &mut Fighter) {
            self.log.borrow_mut().push(format!("{}:update@{}", self.tag, state.frame));
            state.frame += 1;
        }
    }

    #[test]
    fn test_set_up_runs_before_tear_down() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut fighter = test_fighter();

        let first = Action::new(
            "first",
            Box::new(RecordingBehavior { tag: "first", log: Rc::clone(&log) }),
        );
        fighter.change_action(first);
        assert_eq!(log.borrow().as_slice(), ["first:set_up"]);

        let second = Action::new(
            "second",
            Box::new(RecordingBehavior { tag: "second", log: Rc::clone(&log) }),
        );
        fighter.change_action(second);
        assert_eq!(
            log.borrow().as_slice(),
            ["first:set_up", "second:set_up", "first:tear_down->second"]
        );
        assert_eq!(fighter.current_action_name(), "second");
    }

    #[test]
    fn test_action_state_starts_clean() {
        let state = ActionState::new("jab");
        assert_eq!(state.name, "jab");
        assert_eq!(state.frame, 0);
        assert!(state.vars.is_empty());
        assert!(state.hitboxes.is_empty());
        assert_eq!(state.active_hitboxes().count(), 0);
    }

    #[test]
    fn test_idle_action_is_inert() {
        let mut fighter = test_fighter();
        let mut idle = Action::idle();
        assert_eq!(idle.name(), "idle");
        idle.state_transitions(&mut fighter);
        idle.update(&mut fighter);
        assert_eq!(idle.state.frame, 0);
    }

    mod scripted {
        use super::*;
        use crate::engine::script::{ActionDef, Predicate, StateTransition, TransitionRule};
        use crate::engine::subaction::{Comparator, SubAction};

        fn def(name: &str) -> ActionDef {
            ActionDef {
                name: name.to_string(),
                sprite: String::new(),
                length: 0,
                loop_frame: None,
                set_up: Vec::new(),
                tear_down: Vec::new(),
                frames: FxHashMap::default(),
                transitions: Vec::new(),
            }
        }

        fn scripted(def: ActionDef) -> Action {
            let name = def.name.clone();
            Action::new(&name, Box::new(ScriptedBehavior::new(Arc::new(def))))
        }

        #[test]
        fn test_frame_auto_advances_each_update() {
            let mut fighter = test_fighter();
            let mut action = scripted(def("wait"));
            action.update(&mut fighter);
            action.update(&mut fighter);
            assert_eq!(action.state.frame, 2);
        }

        #[test]
        fn test_set_frame_suppresses_auto_advance() {
            let mut fighter = test_fighter();
            let mut d = def("charge");
            d.frames.insert(2, vec![SubAction::SetFrame { frame: 10 }]);
            let mut action = scripted(d);

            action.update(&mut fighter); // 0 -> 1
            action.update(&mut fighter); // 1 -> 2
            action.update(&mut fighter); // SetFrame pins 10, no advance
            assert_eq!(action.state.frame, 10);
            action.update(&mut fighter); // normal advance resumes
            assert_eq!(action.state.frame, 11);
        }

        #[test]
        fn test_loop_point_wraps_past_length() {
            let mut fighter = test_fighter();
            let mut d = def("run_cycle");
            d.length = 3;
            d.loop_frame = Some(1);
            let mut action = scripted(d);

            for _ in 0..4 {
                action.update(&mut fighter);
            }
            // 0 -> 1 -> 2 -> 3 -> 4 wraps to 1
            assert_eq!(action.state.frame, 1);
        }

        #[test]
        fn test_set_up_applies_sprite_and_ops() {
            let mut fighter = test_fighter();
            let mut d = def("jab");
            d.set_up.push(SubAction::ChangeFighterPreferredSpeed { x: Some(0.0), y: None });
            fighter.preferred_velocity.0 = 5.0;

            let mut action = scripted(d);
            action.set_up(&mut fighter);
            // Empty sprite field falls back to the action name
            assert_eq!(action.state.sprite_name, "jab");
            assert_eq!(fighter.preferred_velocity.0, 0.0);
        }

        #[test]
        fn test_transition_rules_queue_on_fighter() {
            let mut fighter = test_fighter();
            let mut d = def("fall_check");
            d.transitions.push(TransitionRule {
                when: Predicate::Frame { comparator: Comparator::Ge, value: 2 },
                to: StateTransition::Jump,
            });
            let mut action = scripted(d);

            action.state_transitions(&mut fighter);
            assert_eq!(fighter.pending_transition(), None);

            action.state.frame = 2;
            action.state_transitions(&mut fighter);
            assert_eq!(fighter.pending_transition(), Some(StateTransition::Jump));
        }
    }
}

//! Fighter state and the per-frame update pipeline.
//!
//! A fighter owns everything that changes during a match: position and
//! velocity, damage and shield, the current action, the input log and the
//! lock list of hits that may not land again yet. `update` advances all
//! of it by exactly one frame in a fixed order; the order is part of the
//! engine contract because replays depend on it.
//!
//! The stage is passed in by reference each frame and never stored, so a
//! fighter can be simulated against any geometry without back-references.

use fxhash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::engine::action::Action;
use crate::engine::events::EngineEvent;
use crate::engine::geometry::{xy_from_dm, Rect};
use crate::engine::hitbox::{total_knockback, Hitbox, LockEntry};
use crate::engine::input_buffer::{InputBuffer, Key, Keybindings, LogicalKey};
use crate::engine::physics_constants::{damage, defaults, ground, knockback, shield};
use crate::engine::script::{ScriptedActionFactory, StateTransition};
use crate::engine::sprite::Sprite;
use crate::engine::stage::Stage;
use crate::models::attributes::FighterAttributes;

/// Index of a fighter within the match. Stable for the whole match; used
/// to key hitbox locks and events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FighterId(pub u32);

pub struct Fighter {
    pub id: FighterId,

    /// Physics body. Collision and movement run against this rect.
    pub rect: Rect,
    /// Target area for incoming hitboxes; follows the sprite's bounds.
    pub hurtbox: Rect,
    pub velocity: (f32, f32),
    /// Easing target for horizontal drift; knockback launches bypass it.
    pub preferred_velocity: (f32, f32),
    /// +1 facing right, -1 facing left
    pub facing: i8,

    pub damage: f32,
    pub jumps_remaining: u32,
    pub grounded: bool,
    pub shielding: bool,
    pub shield_integrity: f32,
    pub rotation: f32,
    pub landing_lag: u32,

    pub attributes: FighterAttributes,
    pub bindings: Keybindings,
    pub input_buffer: InputBuffer,
    pub hitbox_locks: Vec<LockEntry>,

    keys_held: FxHashSet<Key>,
    current_action: Option<Action>,
    pending_transition: Option<StateTransition>,
    events: Vec<EngineEvent>,
    factory: ScriptedActionFactory,
    sprite: Box<dyn Sprite>,
}

impl Fighter {
    pub fn new(
        id: FighterId,
        attributes: FighterAttributes,
        bindings: Keybindings,
        factory: ScriptedActionFactory,
        sprite: Box<dyn Sprite>,
    ) -> Self {
        let rect = sprite.bounding_rect();
        let jumps = attributes.jumps;
        let mut fighter = Self {
            id,
            rect,
            hurtbox: rect,
            velocity: (0.0, 0.0),
            preferred_velocity: (0.0, 0.0),
            facing: 1,
            damage: 0.0,
            jumps_remaining: jumps,
            grounded: false,
            shielding: false,
            shield_integrity: shield::MAX_INTEGRITY,
            rotation: 0.0,
            landing_lag: defaults::LANDING_LAG_FRAMES,
            attributes,
            bindings,
            input_buffer: InputBuffer::new(),
            hitbox_locks: Vec::new(),
            keys_held: FxHashSet::default(),
            current_action: Some(Action::idle()),
            pending_transition: None,
            events: Vec::new(),
            factory,
            sprite,
        };
        let idle = fighter.factory.action_for(StateTransition::Idle);
        fighter.change_action(idle);
        fighter
    }

    // ============================================================
    // Update loop
    // ============================================================

    /// Advance one frame. The step order is load-bearing; reordering any
    /// of it changes replay output.
    pub fn update(&mut self, stage: &Stage) {
        // 1. Commit this frame's input edges
        self.input_buffer.push();

        // 2. Ease horizontal velocity toward the preferred target,
        //    clamped so it never overshoots
        let factor = if self.grounded {
            self.attributes.friction
        } else {
            self.attributes.air_control
        };
        let diff = self.preferred_velocity.0 - self.velocity.0;
        if diff != 0.0 {
            self.velocity.0 += diff.signum() * diff.abs().min(factor);
        }

        // 3. Expired lock entries leave before the rest count down
        self.hitbox_locks.retain(|entry| entry.frames_remaining > 0);
        for entry in &mut self.hitbox_locks {
            entry.frames_remaining -= 1;
        }

        // 4. Delegate to the current action
        self.hurtbox = self.sprite.bounding_rect();
        if let Some(mut action) = self.current_action.take() {
            action.state_transitions(self);
            self.current_action = Some(action);
        }
        self.apply_pending_transition();
        if let Some(mut action) = self.current_action.take() {
            action.update(self);
            self.current_action = Some(action);
        }
        self.apply_pending_transition();
        self.shield_integrity =
            (self.shield_integrity + shield::REGEN_PER_FRAME).min(shield::MAX_INTEGRITY);

        // 5. Gravity. Exactly-zero vertical velocity reseeds to a unit
        //    fall so a held fast-fall can always re-apply.
        if self.velocity.1 == 0.0 {
            self.velocity.1 = ground::FALL_SEED;
        } else {
            self.velocity.1 += self.attributes.gravity;
            if self.velocity.1 > self.attributes.max_fall_speed {
                self.velocity.1 = self.attributes.max_fall_speed;
            }
        }
        if self.grounded {
            self.jumps_remaining = self.attributes.jumps;
        }

        // 6. Grounded re-probe: displace, test, restore
        self.rect.y += ground::PROBE_DEPTH;
        self.grounded = stage.collides(&self.rect);
        self.rect.y -= ground::PROBE_DEPTH;

        // 7. Horizontal movement. Velocity survives the snap, so pressing
        //    into a wall keeps momentum for when the wall ends.
        self.rect.x += self.velocity.0;
        for index in stage.collide_rect(&self.rect) {
            let platform = stage.platforms[index].rect;
            if self.velocity.0 > 0.0 {
                self.rect.set_right(platform.left());
            } else if self.velocity.0 < 0.0 {
                self.rect.set_left(platform.right());
            }
        }

        // 8. Vertical movement zeroes velocity on contact
        self.rect.y += self.velocity.1;
        for index in stage.collide_rect(&self.rect) {
            let platform = stage.platforms[index].rect;
            if self.velocity.1 > 0.0 {
                self.rect.set_bottom(platform.top());
                self.velocity.1 = 0.0;
            } else if self.velocity.1 < 0.0 {
                self.rect.set_top(platform.bottom());
                self.velocity.1 = 0.0;
            }
        }

        // 9. Blast-line check on all four sides
        if self.rect.fully_outside(&stage.blast_line) {
            self.die(stage.spawn_point);
        }

        // 10. Sprite transform sync and hurtbox refresh
        self.sprite.set_position((self.rect.x, self.rect.y));
        self.sprite.flip_x(self.facing);
        self.hurtbox = self.sprite.bounding_rect();
    }

    // ============================================================
    // Actions
    // ============================================================

    /// The only transition primitive. The incoming action's `set_up` runs
    /// before the outgoing one's `tear_down`, which receives the incoming
    /// action for stateful handoff.
    pub fn change_action(&mut self, mut next: Action) {
        next.set_up(self);
        if let Some(mut old) = self.current_action.take() {
            old.tear_down(self, &mut next);
        }
        self.current_action = Some(next);
    }

    /// Ask for a state change. Applied by the update loop after the
    /// currently executing hook returns; the last request in a frame wins.
    pub fn queue_transition(&mut self, transition: StateTransition) {
        self.pending_transition = Some(transition);
    }

    pub fn pending_transition(&self) -> Option<StateTransition> {
        self.pending_transition
    }

    fn apply_pending_transition(&mut self) {
        if let Some(transition) = self.pending_transition.take() {
            let next = self.factory.action_for(transition);
            self.change_action(next);
            self.shielding = transition == StateTransition::Shield;
        }
    }

    pub fn current_action_name(&self) -> &str {
        self.current_action.as_ref().map(|a| a.name()).unwrap_or("")
    }

    pub fn current_action(&self) -> Option<&Action> {
        self.current_action.as_ref()
    }

    pub fn current_action_mut(&mut self) -> Option<&mut Action> {
        self.current_action.as_mut()
    }

    /// Hitboxes of the current action that can hit this frame.
    pub fn active_hitboxes(&self) -> impl Iterator<Item = &Hitbox> {
        self.current_action.iter().flat_map(|a| a.state.active_hitboxes())
    }

    // ============================================================
    // Input
    // ============================================================

    /// Record a press edge. Pressing one horizontal direction releases
    /// the other, so left+right never coexist in the held set.
    pub fn key_pressed(&mut self, key: Key) {
        self.input_buffer.append(key, true);
        self.keys_held.insert(key);
        if key == self.bindings.left {
            self.key_released(self.bindings.right);
        } else if key == self.bindings.right {
            self.key_released(self.bindings.left);
        }
    }

    /// Record a release edge. Ignored when the key is not actually held,
    /// which keeps synthetic releases from polluting the buffer.
    pub fn key_released(&mut self, key: Key) -> bool {
        if self.keys_held.remove(&key) {
            self.input_buffer.append(key, false);
            true
        } else {
            false
        }
    }

    pub fn keys_contain(&self, logical: LogicalKey) -> bool {
        self.keys_held.contains(&self.bindings.resolve(logical))
    }

    /// Temporal query against the committed input history.
    pub fn buffer_contains(
        &self,
        logical: LogicalKey,
        distance_back: usize,
        state: bool,
        and_released: bool,
        not_released: bool,
    ) -> bool {
        self.input_buffer.contains(
            self.bindings.resolve(logical),
            distance_back,
            state,
            and_released,
            not_released,
        )
    }

    /// The device keys for forward and backward relative to facing.
    pub fn forward_backward_keys(&self) -> (Key, Key) {
        if self.facing == 1 {
            (self.bindings.right, self.bindings.left)
        } else {
            (self.bindings.left, self.bindings.right)
        }
    }

    // ============================================================
    // Facing and trajectory helpers
    // ============================================================

    pub fn flip(&mut self) {
        self.facing = -self.facing;
        self.sprite.flip_x(self.facing);
    }

    /// 0 degrees when facing right, 180 when facing left.
    pub fn facing_direction(&self) -> f32 {
        if self.facing == 1 {
            0.0
        } else {
            180.0
        }
    }

    /// Mirror an angular offset around the facing direction.
    pub fn forward_with_offset(&self, offset: f32) -> f32 {
        if self.facing == 1 {
            offset
        } else {
            180.0 - offset
        }
    }

    // ============================================================
    // Combat
    // ============================================================

    pub fn deal_damage(&mut self, amount: f32) {
        self.damage = (self.damage + amount).min(damage::MAX);
    }

    /// Take a hit: deal the damage, run the knockback formula against the
    /// post-hit damage total, apply directional influence and launch.
    /// Returns the total knockback for the caller's bookkeeping.
    pub fn apply_knockback(
        &mut self,
        hit_damage: f32,
        base_kb: f32,
        kb_growth: f32,
        mut trajectory: f32,
        weight_influence: f32,
    ) -> f32 {
        self.velocity = (0.0, 0.0);
        self.deal_damage(hit_damage);

        let weight = self.attributes.weight * weight_influence;
        let total = total_knockback(self.damage, hit_damage, weight, kb_growth, base_kb);

        // DI only bends near-horizontal launches, read from keys held
        // right now rather than buffered history
        let normalized = trajectory.rem_euclid(360.0);
        let in_di_band = (normalized < knockback::DI_RIGHT_EDGE_DEG
            || normalized > knockback::DI_RIGHT_WRAP_DEG)
            || (normalized > knockback::DI_LEFT_LOW_DEG
                && normalized < knockback::DI_LEFT_HIGH_DEG);
        if in_di_band {
            if self.keys_contain(LogicalKey::Up) {
                trajectory += knockback::DI_ADJUST_DEG;
            }
            if self.keys_contain(LogicalKey::Down) {
                trajectory -= knockback::DI_ADJUST_DEG;
            }
        }

        self.set_speed(total, trajectory, false);
        self.preferred_velocity = (0.0, 0.0);
        total
    }

    /// Set velocity (or its easing target) from a direction/magnitude
    /// pair.
    pub fn set_speed(&mut self, speed: f32, direction: f32, preferred: bool) {
        let (x, y) = xy_from_dm(direction, speed);
        if preferred {
            self.preferred_velocity = (x, y);
        } else {
            self.velocity = (x, y);
        }
    }

    /// Register a hit against this fighter's lock list. Returns false if
    /// the (owner, lock) pair is already locked, in which case the hit
    /// must not apply.
    pub fn lock_hitbox(&mut self, hitbox: &Hitbox) -> bool {
        if self
            .hitbox_locks
            .iter()
            .any(|entry| entry.owner == hitbox.owner && entry.lock_id == hitbox.lock_id)
        {
            return false;
        }
        self.hitbox_locks.push(LockEntry {
            frames_remaining: hitbox.params.lock_frames as i32,
            owner: hitbox.owner,
            lock_id: hitbox.lock_id,
        });
        true
    }

    /// Drain shield integrity, clamped at zero. Integrity reaching zero
    /// forces the break.
    pub fn shield_damage(&mut self, amount: f32) {
        self.shield_integrity = (self.shield_integrity - amount).max(0.0);
        if self.shield_integrity <= 0.0 {
            self.events.push(EngineEvent::ShieldBreak { fighter: self.id });
            self.queue_transition(StateTransition::ShieldBreak);
        }
    }

    /// Raise (or with `reset`, overwrite) the landing lag the next landing
    /// will incur.
    pub fn update_landing_lag(&mut self, frames: u32, reset: bool) {
        if reset {
            self.landing_lag = frames;
        } else if frames > self.landing_lag {
            self.landing_lag = frames;
        }
    }

    pub fn rotate_sprite(&mut self, degrees: f32) {
        self.rotation = degrees;
        self.sprite.rotate(degrees);
    }

    pub fn unrotate(&mut self) {
        self.rotation = 0.0;
        self.sprite.rotate(0.0);
    }

    /// Full respawn reset: damage, velocity, jumps, position.
    pub fn die(&mut self, spawn_point: (f32, f32)) {
        self.damage = 0.0;
        self.velocity = (0.0, 0.0);
        self.jumps_remaining = self.attributes.jumps;
        self.rect.set_midtop(spawn_point);
        self.events.push(EngineEvent::Died { fighter: self.id });
    }

    // ============================================================
    // Sprite forwarding
    // ============================================================

    pub fn change_sprite(&mut self, name: &str, subimage: u32) {
        self.sprite.change_image(name);
        if subimage != 0 {
            self.sprite.change_subimage(subimage);
        }
    }

    pub fn change_subimage(&mut self, index: u32) {
        self.sprite.change_subimage(index);
    }

    pub fn draw(&mut self, offset: (f32, f32), scale: f32) {
        self.sprite.draw(offset, scale);
    }

    // ============================================================
    // Events
    // ============================================================

    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }
}

impl std::fmt::Debug for Fighter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fighter")
            .field("id", &self.id)
            .field("rect", &self.rect)
            .field("velocity", &self.velocity)
            .field("facing", &self.facing)
            .field("damage", &self.damage)
            .field("grounded", &self.grounded)
            .field("shield_integrity", &self.shield_integrity)
            .field("action", &self.current_action_name())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::engine::sprite::NullSprite;

    pub fn test_bindings() -> Keybindings {
        Keybindings::from_map([
            ("left", Key(1)),
            ("right", Key(2)),
            ("up", Key(3)),
            ("down", Key(4)),
            ("jump", Key(5)),
            ("attack", Key(6)),
            ("shield", Key(7)),
        ])
        .unwrap()
    }

    pub fn test_fighter() -> Fighter {
        Fighter::new(
            FighterId(0),
            FighterAttributes::default(),
            test_bindings(),
            ScriptedActionFactory::default(),
            Box::new(NullSprite::new((20.0, 40.0))),
        )
    }
}

//! Hitboxes, hitbox locks and knockback math.
//!
//! A hitbox is a rectangle owned by an attacking fighter, positioned
//! relative to that fighter and flipped with facing. Hit parameters come
//! from move data. Locks guarantee a hitbox applies at most once to a
//! given victim while its lock entry is alive; hitboxes created under the
//! same lock name within one action share a single lock identity, so a
//! multi-rect attack still only hits once.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::engine::fighter::FighterId;
use crate::engine::geometry::Rect;
use crate::engine::physics_constants::{defaults, knockback};

/// Identity of a hitbox lock. Compared only for equality; the value
/// itself carries no meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LockId(u64);

static NEXT_LOCK_ID: AtomicU64 = AtomicU64::new(0);

/// An allocated lock identity. Actions own these by name; hitboxes carry
/// non-owning `LockId` copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitboxLock {
    id: LockId,
}

impl HitboxLock {
    pub fn new() -> Self {
        Self { id: LockId(NEXT_LOCK_ID.fetch_add(1, Ordering::Relaxed)) }
    }

    #[inline]
    pub fn id(&self) -> LockId {
        self.id
    }
}

impl Default for HitboxLock {
    fn default() -> Self {
        Self::new()
    }
}

/// One entry in a victim's lock list: this (owner, lock) pair cannot hit
/// again until the countdown expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockEntry {
    pub frames_remaining: i32,
    pub owner: FighterId,
    pub lock_id: LockId,
}

/// Resolution policy variants. Same data, different angle/velocity
/// treatment at hit time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HitboxKind {
    #[default]
    Damage,
    Sakurai,
    Funnel,
}

/// Hit parameters as authored in move data. Field defaults match what a
/// bare hitbox node means in the move format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HitboxParams {
    /// Center offset from the owner's center, in the owner's facing frame
    pub center: (f32, f32),
    pub size: (f32, f32),
    pub damage: f32,
    pub base_knockback: f32,
    pub knockback_growth: f32,
    /// Launch angle in degrees, 0 = right, 90 = up
    pub trajectory: f32,
    pub hitstun: f32,
    /// Lock name shared within the owning action; empty = private lock
    pub lock: String,
    pub weight_influence: f32,
    pub shield_multiplier: f32,
    /// Non-zero skips clash resolution entirely
    pub transcendence: i32,
    pub priority_diff: f32,
    pub charge_damage: f32,
    pub charge_base_knockback: f32,
    pub charge_knockback_growth: f32,
    /// Funnel draw factors toward the hitbox center
    pub x_draw: f32,
    pub y_draw: f32,
    /// Lock duration registered on a successful hit
    pub lock_frames: u32,
}

impl Default for HitboxParams {
    fn default() -> Self {
        Self {
            center: (0.0, 0.0),
            size: (0.0, 0.0),
            damage: 0.0,
            base_knockback: 0.0,
            knockback_growth: 0.0,
            trajectory: 0.0,
            hitstun: 1.0,
            lock: String::new(),
            weight_influence: 1.0,
            shield_multiplier: 1.0,
            transcendence: 0,
            priority_diff: 0.0,
            charge_damage: 0.0,
            charge_base_knockback: 0.0,
            charge_knockback_growth: 0.0,
            x_draw: 0.1,
            y_draw: 0.1,
            lock_frames: defaults::LOCK_FRAMES,
        }
    }
}

/// A typed patch for live hitbox tweaks mid-move (growing rects, damage
/// ramps). Absent fields leave the hitbox untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HitboxPatch {
    pub center: Option<(f32, f32)>,
    pub size: Option<(f32, f32)>,
    pub damage: Option<f32>,
    pub base_knockback: Option<f32>,
    pub knockback_growth: Option<f32>,
    pub trajectory: Option<f32>,
    pub hitstun: Option<f32>,
    pub weight_influence: Option<f32>,
    pub shield_multiplier: Option<f32>,
    pub transcendence: Option<i32>,
    pub priority_diff: Option<f32>,
    pub x_draw: Option<f32>,
    pub y_draw: Option<f32>,
    pub lock_frames: Option<u32>,
}

/// A live hitbox inside an action's hitbox map.
#[derive(Debug, Clone)]
pub struct Hitbox {
    pub owner: FighterId,
    pub rect: Rect,
    pub params: HitboxParams,
    pub kind: HitboxKind,
    pub active: bool,
    pub lock_id: LockId,
    /// Charge units accumulated by charge-and-release moves
    pub charge: u32,
}

impl Hitbox {
    pub fn new(owner: FighterId, params: HitboxParams, kind: HitboxKind, lock_id: LockId) -> Self {
        let rect = Rect::from_center(params.center, params.size);
        Self { owner, rect, params, kind, active: false, lock_id, charge: 0 }
    }

    /// Re-anchor the rect to the owner's center, mirroring the x offset
    /// when the owner faces left.
    pub fn update_position(&mut self, owner_center: (f32, f32), facing: i8) {
        let offset_x = self.params.center.0 * facing as f32;
        self.rect.set_center((owner_center.0 + offset_x, owner_center.1 + self.params.center.1));
    }

    /// Add charge units. Charged values scale linearly per unit.
    pub fn apply_charge(&mut self, units: u32) {
        self.charge += units;
    }

    #[inline]
    pub fn charged_damage(&self) -> f32 {
        self.params.damage + self.params.charge_damage * self.charge as f32
    }

    #[inline]
    pub fn charged_base_knockback(&self) -> f32 {
        self.params.base_knockback + self.params.charge_base_knockback * self.charge as f32
    }

    #[inline]
    pub fn charged_knockback_growth(&self) -> f32 {
        self.params.knockback_growth + self.params.charge_knockback_growth * self.charge as f32
    }

    /// Clash priority: effective damage plus the authored bias.
    #[inline]
    pub fn priority(&self) -> f32 {
        self.charged_damage() + self.params.priority_diff
    }

    /// Apply a mid-move patch. A size change resizes the rect in place
    /// around its current center.
    pub fn apply_patch(&mut self, patch: &HitboxPatch) {
        if let Some(center) = patch.center {
            self.params.center = center;
        }
        if let Some(size) = patch.size {
            self.params.size = size;
            self.rect = Rect::from_center(self.rect.center(), size);
        }
        if let Some(v) = patch.damage {
            self.params.damage = v;
        }
        if let Some(v) = patch.base_knockback {
            self.params.base_knockback = v;
        }
        if let Some(v) = patch.knockback_growth {
            self.params.knockback_growth = v;
        }
        if let Some(v) = patch.trajectory {
            self.params.trajectory = v;
        }
        if let Some(v) = patch.hitstun {
            self.params.hitstun = v;
        }
        if let Some(v) = patch.weight_influence {
            self.params.weight_influence = v;
        }
        if let Some(v) = patch.shield_multiplier {
            self.params.shield_multiplier = v;
        }
        if let Some(v) = patch.transcendence {
            self.params.transcendence = v;
        }
        if let Some(v) = patch.priority_diff {
            self.params.priority_diff = v;
        }
        if let Some(v) = patch.x_draw {
            self.params.x_draw = v;
        }
        if let Some(v) = patch.y_draw {
            self.params.y_draw = v;
        }
        if let Some(v) = patch.lock_frames {
            self.params.lock_frames = v;
        }
    }
}

/// Outcome of two opposing active hitboxes overlapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClashOutcome {
    /// At least one side is transcendent; neither is cancelled
    NoClash,
    /// Priorities are close; both hitboxes are cancelled
    BothCancel,
    FirstWins,
    SecondWins,
}

/// Resolve a clash between two overlapping hitboxes.
pub fn clash(a: &Hitbox, b: &Hitbox) -> ClashOutcome {
    if a.params.transcendence != 0 || b.params.transcendence != 0 {
        return ClashOutcome::NoClash;
    }
    let diff = a.priority() - b.priority();
    if diff.abs() <= knockback::CLASH_THRESHOLD {
        ClashOutcome::BothCancel
    } else if diff > 0.0 {
        ClashOutcome::FirstWins
    } else {
        ClashOutcome::SecondWins
    }
}

/// The knockback formula.
///
/// `damage_after` is the receiver's damage AFTER the hit has been dealt,
/// `hit_damage` the damage of the hit itself, `weight` the receiver's
/// effective weight.
pub fn total_knockback(damage_after: f32, hit_damage: f32, weight: f32, kbg: f32, kb: f32) -> f32 {
    use knockback::*;
    (((((damage_after / DAMAGE_DIV) + (damage_after * hit_damage) / PRODUCT_DIV)
        * (WEIGHT_NUM / (weight + WEIGHT_OFFSET))
        * SCALE)
        + BASE_OFFSET)
        * kbg)
        + kb
}

/// Trajectory adjustment for Sakurai-kind hitboxes: weak launches stay
/// grazing, strong launches lift toward 45 degrees on the launch side.
pub fn sakurai_adjusted_trajectory(base_trajectory: f32, total_kb: f32) -> f32 {
    use knockback::*;
    if total_kb <= SAKURAI_WEAK_KB {
        return base_trajectory;
    }
    let lift = ((total_kb - SAKURAI_WEAK_KB) * SAKURAI_LIFT_PER_UNIT).min(SAKURAI_MAX_LIFT_DEG);
    let rightward = base_trajectory < 90.0 || base_trajectory > 270.0;
    if rightward {
        base_trajectory + lift
    } else {
        base_trajectory - lift
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_lock_identities_are_unique() {
        let a = HitboxLock::new();
        let b = HitboxLock::new();
        assert_ne!(a.id(), b.id());
        let copy = a;
        assert_eq!(a.id(), copy.id());
    }

    #[test]
    fn test_params_defaults_from_empty_json() {
        let p: HitboxParams = serde_json::from_str("{}").unwrap();
        assert_eq!(p.hitstun, 1.0);
        assert_eq!(p.weight_influence, 1.0);
        assert_eq!(p.shield_multiplier, 1.0);
        assert_eq!(p.x_draw, 0.1);
        assert_eq!(p.y_draw, 0.1);
        assert_eq!(p.lock_frames, defaults::LOCK_FRAMES);
        assert_eq!(p.transcendence, 0);
    }

    #[test]
    fn test_update_position_flips_offset_with_facing() {
        let params =
            HitboxParams { center: (20.0, -5.0), size: (10.0, 10.0), ..Default::default() };
        let mut hb = Hitbox::new(FighterId(0), params, HitboxKind::Damage, HitboxLock::new().id());

        hb.update_position((100.0, 50.0), 1);
        assert_eq!(hb.rect.center(), (120.0, 45.0));

        hb.update_position((100.0, 50.0), -1);
        assert_eq!(hb.rect.center(), (80.0, 45.0));
    }

    #[test]
    fn test_charge_scales_damage_and_knockback() {
        let params = HitboxParams {
            damage: 5.0,
            base_knockback: 4.0,
            knockback_growth: 1.0,
            charge_damage: 2.0,
            charge_base_knockback: 1.0,
            charge_knockback_growth: 0.5,
            ..Default::default()
        };
        let mut hb = Hitbox::new(FighterId(0), params, HitboxKind::Damage, HitboxLock::new().id());
        hb.apply_charge(3);
        assert!(close(hb.charged_damage(), 11.0));
        assert!(close(hb.charged_base_knockback(), 7.0));
        assert!(close(hb.charged_knockback_growth(), 2.5));
    }

    #[test]
    fn test_knockback_formula_reference_values() {
        // Fresh receiver at 0, hit for 10: p = 10 after the hit
        let kb = total_knockback(10.0, 10.0, 100.0, 1.0, 5.0);
        assert!(close(kb, 18.4), "got {}", kb);

        // Mid-damage receiver
        let kb = total_knockback(23.0, 15.0, 100.0, 1.2, 8.0);
        assert!(close(kb, 46.844), "got {}", kb);

        // Zero-damage hit on an undamaged receiver collapses to the base
        let kb = total_knockback(0.0, 0.0, 100.0, 1.0, 0.0);
        assert!(close(kb, 5.0), "got {}", kb);

        // Zero growth ignores everything but base knockback
        let kb = total_knockback(400.0, 50.0, 80.0, 0.0, 12.0);
        assert!(close(kb, 12.0), "got {}", kb);
    }

    #[test]
    fn test_heavier_fighters_take_less_knockback() {
        let light = total_knockback(50.0, 12.0, 80.0, 1.0, 0.0);
        let heavy = total_knockback(50.0, 12.0, 130.0, 1.0, 0.0);
        assert!(light > heavy);
    }

    #[test]
    fn test_clash_outcomes() {
        let mk = |damage: f32, transcendence: i32| {
            let params = HitboxParams { damage, transcendence, ..Default::default() };
            Hitbox::new(FighterId(0), params, HitboxKind::Damage, HitboxLock::new().id())
        };

        assert_eq!(clash(&mk(10.0, 0), &mk(12.0, 0)), ClashOutcome::BothCancel);
        assert_eq!(clash(&mk(25.0, 0), &mk(5.0, 0)), ClashOutcome::FirstWins);
        assert_eq!(clash(&mk(5.0, 0), &mk(25.0, 0)), ClashOutcome::SecondWins);
        assert_eq!(clash(&mk(25.0, 1), &mk(5.0, 0)), ClashOutcome::NoClash);
    }

    #[test]
    fn test_priority_includes_authored_bias() {
        let params = HitboxParams { damage: 10.0, priority_diff: 3.0, ..Default::default() };
        let hb = Hitbox::new(FighterId(0), params, HitboxKind::Damage, HitboxLock::new().id());
        assert!(close(hb.priority(), 13.0));
    }

    #[test]
    fn test_sakurai_weak_hits_stay_horizontal() {
        assert_eq!(sakurai_adjusted_trajectory(0.0, 20.0), 0.0);
        assert_eq!(sakurai_adjusted_trajectory(180.0, 32.0), 180.0);
    }

    #[test]
    fn test_sakurai_strong_hits_lift_toward_45() {
        // 10 units over the threshold: 30 degrees of lift
        let t = sakurai_adjusted_trajectory(0.0, 42.0);
        assert!(close(t, 30.0), "got {}", t);

        // Leftward launch lifts by decreasing the angle toward 135
        let t = sakurai_adjusted_trajectory(180.0, 42.0);
        assert!(close(t, 150.0), "got {}", t);

        // Lift caps at 45 degrees
        let t = sakurai_adjusted_trajectory(0.0, 1000.0);
        assert!(close(t, 45.0), "got {}", t);
    }
}

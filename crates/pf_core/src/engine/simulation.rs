//! The match loop.
//!
//! `Simulation` owns the fighters and the stage and advances the whole
//! match one tick at a time: every fighter updates exactly once per tick,
//! in index order, and then all pending hits are resolved in a single
//! pass. Nothing re-enters a fighter update during resolution, so the
//! cross-fighter mutation (damage, knockback, locks) is sequenced the
//! same way every run.
//!
//! Resolution order inside a tick:
//! 1. fighter updates (movement, actions, input commit)
//! 2. hitboxes re-anchor to their owners' resolved positions
//! 3. clashes between opposing active hitboxes, cancelled boxes drop out
//! 4. surviving hitboxes against hurtboxes, one application per hit
//! 5. fighter event queues drain into the match event queue

use crate::engine::events::EngineEvent;
use crate::engine::fighter::Fighter;
use crate::engine::hitbox::{
    clash, sakurai_adjusted_trajectory, total_knockback, ClashOutcome, Hitbox, HitboxKind,
};
use crate::engine::physics_constants::{damage, shield};
use crate::engine::stage::Stage;

pub struct Simulation {
    pub fighters: Vec<Fighter>,
    pub stage: Stage,
    /// Ticks elapsed since the match started
    pub frame: u64,
    events: Vec<EngineEvent>,
}

impl Simulation {
    pub fn new(fighters: Vec<Fighter>, stage: Stage) -> Self {
        Self { fighters, stage, frame: 0, events: Vec::new() }
    }

    /// Advance the match by one tick.
    pub fn tick(&mut self) {
        for fighter in &mut self.fighters {
            fighter.update(&self.stage);
        }
        self.anchor_hitboxes();
        self.resolve_clashes();
        self.resolve_hits();
        for fighter in &mut self.fighters {
            let drained = fighter.drain_events();
            self.events.extend(drained);
        }
        self.frame += 1;
    }

    /// Events queued since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    /// Re-anchor every hitbox to its owner's post-movement position, so
    /// resolution sees this tick's geometry rather than last tick's.
    fn anchor_hitboxes(&mut self) {
        for fighter in &mut self.fighters {
            let center = fighter.rect.center();
            let facing = fighter.facing;
            if let Some(action) = fighter.current_action_mut() {
                for hitbox in action.state.hitboxes.values_mut() {
                    hitbox.update_position(center, facing);
                }
            }
        }
    }

    /// Hitbox-vs-hitbox pass. Runs before hurtbox hits so a cancelled
    /// hitbox cannot land this tick.
    fn resolve_clashes(&mut self) {
        let mut cancelled: Vec<(usize, String)> = Vec::new();
        for a in 0..self.fighters.len() {
            for b in (a + 1)..self.fighters.len() {
                for (name_a, hb_a) in active_named(&self.fighters[a]) {
                    for (name_b, hb_b) in active_named(&self.fighters[b]) {
                        if !hb_a.rect.overlaps(&hb_b.rect) {
                            continue;
                        }
                        match clash(hb_a, hb_b) {
                            ClashOutcome::NoClash => {}
                            ClashOutcome::BothCancel => {
                                cancelled.push((a, name_a.clone()));
                                cancelled.push((b, name_b.clone()));
                            }
                            ClashOutcome::FirstWins => cancelled.push((b, name_b.clone())),
                            ClashOutcome::SecondWins => cancelled.push((a, name_a.clone())),
                        }
                    }
                }
            }
        }
        for (index, name) in cancelled {
            log::debug!("clash cancelled hitbox '{}' of fighter {:?}", name, self.fighters[index].id);
            if let Some(action) = self.fighters[index].current_action_mut() {
                if let Some(hitbox) = action.state.hitboxes.get_mut(&name) {
                    hitbox.active = false;
                }
            }
        }
    }

    /// Hitbox-vs-hurtbox pass. Hits are collected first and applied once
    /// each, so a launch caused by an earlier hit never moves a victim
    /// out of (or into) a later one within the same tick.
    fn resolve_hits(&mut self) {
        let mut hits: Vec<(usize, Hitbox)> = Vec::new();
        for attacker in 0..self.fighters.len() {
            for victim in 0..self.fighters.len() {
                if victim == attacker {
                    continue;
                }
                let hurtbox = self.fighters[victim].hurtbox;
                for hitbox in self.fighters[attacker].active_hitboxes() {
                    if hitbox.rect.overlaps(&hurtbox) {
                        hits.push((victim, hitbox.clone()));
                    }
                }
            }
        }

        for (victim_index, hitbox) in hits {
            let victim = &mut self.fighters[victim_index];

            // A raised shield redirects contact into integrity drain, one
            // unit per tick of sustained overlap. No lock is registered.
            if victim.shielding {
                victim.shield_damage(shield::CONTACT_DAMAGE_PER_FRAME);
                continue;
            }

            if !victim.lock_hitbox(&hitbox) {
                continue;
            }

            let effective = hitbox.charged_damage();
            let base_kb = hitbox.charged_base_knockback();
            let kb_growth = hitbox.charged_knockback_growth();
            match hitbox.kind {
                HitboxKind::Damage => {
                    victim.apply_knockback(
                        effective,
                        base_kb,
                        kb_growth,
                        hitbox.params.trajectory,
                        hitbox.params.weight_influence,
                    );
                }
                HitboxKind::Sakurai => {
                    // Predict the launch strength against the post-hit
                    // damage total, bend the trajectory, then launch.
                    let damage_after = (victim.damage + effective).min(damage::MAX);
                    let weight = victim.attributes.weight * hitbox.params.weight_influence;
                    let predicted =
                        total_knockback(damage_after, effective, weight, kb_growth, base_kb);
                    let trajectory =
                        sakurai_adjusted_trajectory(hitbox.params.trajectory, predicted);
                    victim.apply_knockback(
                        effective,
                        base_kb,
                        kb_growth,
                        trajectory,
                        hitbox.params.weight_influence,
                    );
                }
                HitboxKind::Funnel => {
                    // Pull the victim toward the hitbox center before the
                    // launch so the knockback starts from the drawn-in
                    // position.
                    let target = hitbox.rect.center();
                    let center = victim.rect.center();
                    victim.rect.x += (target.0 - center.0) * hitbox.params.x_draw;
                    victim.rect.y += (target.1 - center.1) * hitbox.params.y_draw;
                    victim.apply_knockback(
                        effective,
                        base_kb,
                        kb_growth,
                        hitbox.params.trajectory,
                        hitbox.params.weight_influence,
                    );
                }
            }

            log::trace!(
                "hit landed: {:?} -> {:?} for {}",
                hitbox.owner,
                victim.id,
                effective
            );
            self.events.push(EngineEvent::HitLanded {
                attacker: hitbox.owner,
                victim: victim.id,
                damage: effective,
            });
        }
    }
}

fn active_named(fighter: &Fighter) -> impl Iterator<Item = (&String, &Hitbox)> {
    fighter
        .current_action()
        .into_iter()
        .flat_map(|action| action.state.hitboxes.iter())
        .filter(|(_, hitbox)| hitbox.active)
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("frame", &self.frame)
            .field("fighters", &self.fighters.len())
            .field("pending_events", &self.events.len())
            .finish()
    }
}

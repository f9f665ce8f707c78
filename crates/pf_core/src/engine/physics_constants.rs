//! Physics constants for fighter simulation
//!
//! All tuning values live here so the update loop and combat resolution
//! stay free of magic numbers. Velocities are pixels per frame.

// ============================================================
// Damage
// ============================================================
pub mod damage {
    /// Hard cap on accumulated damage
    pub const MAX: f32 = 999.0;
}

// ============================================================
// Shield
// ============================================================
pub mod shield {
    /// Shield integrity ceiling
    pub const MAX_INTEGRITY: f32 = 100.0;

    /// Integrity regained every frame, shielding or not
    pub const REGEN_PER_FRAME: f32 = 0.5;

    /// Integrity lost per frame of sustained hitbox contact
    pub const CONTACT_DAMAGE_PER_FRAME: f32 = 1.0;
}

// ============================================================
// Knockback formula
//
// totalKB = (((((p/10) + (p*d)/20) * (200/(w+100)) * 1.4) + 5) * kbg) + kb
// where p = receiver damage AFTER the hit, d = hit damage, w = weight.
// ============================================================
pub mod knockback {
    pub const DAMAGE_DIV: f32 = 10.0;
    pub const PRODUCT_DIV: f32 = 20.0;
    pub const WEIGHT_NUM: f32 = 200.0;
    pub const WEIGHT_OFFSET: f32 = 100.0;
    pub const SCALE: f32 = 1.4;
    pub const BASE_OFFSET: f32 = 5.0;

    // ========================================
    // Directional influence
    //
    // DI applies only to near-horizontal launches: strictly inside
    // (0, 45) / (315, 360) around right, or (135, 225) around left.
    // ========================================

    /// Lower edge of the right-side band (exclusive)
    pub const DI_RIGHT_EDGE_DEG: f32 = 45.0;

    /// Upper edge of the right-side band (exclusive)
    pub const DI_RIGHT_WRAP_DEG: f32 = 315.0;

    /// Edges of the left-side band (both exclusive)
    pub const DI_LEFT_LOW_DEG: f32 = 135.0;
    pub const DI_LEFT_HIGH_DEG: f32 = 225.0;

    /// Trajectory shift per held vertical direction
    pub const DI_ADJUST_DEG: f32 = 15.0;

    // ========================================
    // Sakurai-angle adjustment
    // ========================================

    /// Total knockback below which the launch stays horizontal
    pub const SAKURAI_WEAK_KB: f32 = 32.0;

    /// Degrees of lift gained per knockback unit above the weak threshold
    pub const SAKURAI_LIFT_PER_UNIT: f32 = 3.0;

    /// Lift ceiling for strong hits
    pub const SAKURAI_MAX_LIFT_DEG: f32 = 45.0;

    // ========================================
    // Hitbox clashing
    // ========================================

    /// Priority gap within which two clashing hitboxes cancel each other
    pub const CLASH_THRESHOLD: f32 = 9.0;
}

// ============================================================
// Ground detection
// ============================================================
pub mod ground {
    /// Probe displacement below the feet when re-testing grounded state (px)
    pub const PROBE_DEPTH: f32 = 2.0;

    /// Downward velocity seeded when vertical velocity is exactly zero,
    /// so a held fast-fall can always be re-applied
    pub const FALL_SEED: f32 = 1.0;
}

// ============================================================
// Defaults
// ============================================================
pub mod defaults {
    /// Frames of landing lag when a move does not override it
    pub const LANDING_LAG_FRAMES: u32 = 6;

    /// Hitbox lock duration when the move data omits one (frames)
    pub const LOCK_FRAMES: u32 = 40;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_di_band_edges_are_symmetric() {
        assert_eq!(knockback::DI_RIGHT_EDGE_DEG, 45.0);
        assert_eq!(knockback::DI_RIGHT_WRAP_DEG, 360.0 - 45.0);
        assert_eq!(knockback::DI_LEFT_LOW_DEG, 180.0 - 45.0);
        assert_eq!(knockback::DI_LEFT_HIGH_DEG, 180.0 + 45.0);
    }

    #[test]
    fn test_shield_regen_refills_from_zero() {
        let frames = (shield::MAX_INTEGRITY / shield::REGEN_PER_FRAME) as u32;
        assert_eq!(frames, 200);
    }
}

//! Static stage geometry.
//!
//! A stage is read-only during a match: solid platforms, the blast-line
//! region and the respawn point. Fighters receive it by reference each
//! frame and never store it.

use serde::{Deserialize, Serialize};

use crate::engine::geometry::Rect;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    pub rect: Rect,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub platforms: Vec<Platform>,
    /// Fighters fully outside this region die
    pub blast_line: Rect,
    /// Respawn anchor; fighters reposition their midtop here
    pub spawn_point: (f32, f32),
}

impl Stage {
    pub fn new(platforms: Vec<Platform>, blast_line: Rect, spawn_point: (f32, f32)) -> Self {
        Self { platforms, blast_line, spawn_point }
    }

    /// Indices of platforms overlapping `rect`.
    pub fn collide_rect(&self, rect: &Rect) -> Vec<usize> {
        self.platforms
            .iter()
            .enumerate()
            .filter(|(_, p)| p.rect.overlaps(rect))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn collides(&self, rect: &Rect) -> bool {
        self.platforms.iter().any(|p| p.rect.overlaps(rect))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage() -> Stage {
        Stage::new(
            vec![
                Platform { rect: Rect { x: 0.0, y: 100.0, w: 200.0, h: 20.0 } },
                Platform { rect: Rect { x: 300.0, y: 100.0, w: 50.0, h: 20.0 } },
            ],
            Rect { x: -100.0, y: -100.0, w: 600.0, h: 400.0 },
            (100.0, 20.0),
        )
    }

    #[test]
    fn test_collide_rect_reports_indices() {
        let s = stage();
        let probe = Rect { x: 190.0, y: 90.0, w: 20.0, h: 20.0 };
        assert_eq!(s.collide_rect(&probe), vec![0]);

        let wide = Rect { x: 100.0, y: 90.0, w: 250.0, h: 20.0 };
        assert_eq!(s.collide_rect(&wide), vec![0, 1]);

        let miss = Rect { x: 220.0, y: 0.0, w: 10.0, h: 10.0 };
        assert!(s.collide_rect(&miss).is_empty());
        assert!(!s.collides(&miss));
    }

    #[test]
    fn test_touching_edges_do_not_collide() {
        let s = stage();
        // Resting exactly on top of platform 0
        let standing = Rect { x: 50.0, y: 80.0, w: 20.0, h: 20.0 };
        assert!(!s.collides(&standing));
    }
}

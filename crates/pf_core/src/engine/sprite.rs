//! Rendering boundary.
//!
//! The core never draws. Each fighter owns one `Sprite` trait object; the
//! update loop pushes transforms into it and scripts forward image
//! changes through it. The sprite's bounding rect doubles as the
//! fighter's hurtbox, so animation frames can grow or shrink the target
//! area.

use crate::engine::geometry::Rect;

pub trait Sprite {
    /// Current bounds in world space; used as the hurtbox.
    fn bounding_rect(&self) -> Rect;

    fn set_position(&mut self, topleft: (f32, f32));

    /// Mirror horizontally when facing left.
    fn flip_x(&mut self, facing: i8);

    fn change_image(&mut self, name: &str);

    fn change_subimage(&mut self, index: u32);

    fn rotate(&mut self, degrees: f32);

    /// Render at `offset` with `scale`. The core only ever calls this on
    /// behalf of the embedder; `NullSprite` just counts the calls.
    fn draw(&mut self, offset: (f32, f32), scale: f32);
}

/// A sprite that records what was asked of it and renders nothing.
#[derive(Debug, Clone)]
pub struct NullSprite {
    rect: Rect,
    pub image: String,
    pub subimage: u32,
    pub rotation: f32,
    pub facing: i8,
    pub draw_calls: u32,
}

impl NullSprite {
    pub fn new(size: (f32, f32)) -> Self {
        Self {
            rect: Rect { x: 0.0, y: 0.0, w: size.0, h: size.1 },
            image: String::new(),
            subimage: 0,
            rotation: 0.0,
            facing: 1,
            draw_calls: 0,
        }
    }
}

impl Sprite for NullSprite {
    fn bounding_rect(&self) -> Rect {
        self.rect
    }

    fn set_position(&mut self, topleft: (f32, f32)) {
        self.rect.x = topleft.0;
        self.rect.y = topleft.1;
    }

    fn flip_x(&mut self, facing: i8) {
        self.facing = facing;
    }

    fn change_image(&mut self, name: &str) {
        self.image = name.to_string();
        self.subimage = 0;
    }

    fn change_subimage(&mut self, index: u32) {
        self.subimage = index;
    }

    fn rotate(&mut self, degrees: f32) {
        self.rotation = degrees;
    }

    fn draw(&mut self, _offset: (f32, f32), _scale: f32) {
        self.draw_calls += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_sprite_records_requests() {
        let mut sprite = NullSprite::new((20.0, 40.0));
        sprite.set_position((10.0, 5.0));
        assert_eq!(sprite.bounding_rect(), Rect { x: 10.0, y: 5.0, w: 20.0, h: 40.0 });

        sprite.change_image("run");
        sprite.change_subimage(3);
        assert_eq!(sprite.image, "run");
        assert_eq!(sprite.subimage, 3);

        // A new image resets the subimage
        sprite.change_image("jump");
        assert_eq!(sprite.subimage, 0);

        sprite.flip_x(-1);
        sprite.rotate(90.0);
        sprite.draw((0.0, 0.0), 1.0);
        assert_eq!(sprite.facing, -1);
        assert_eq!(sprite.rotation, 90.0);
        assert_eq!(sprite.draw_calls, 1);
    }
}

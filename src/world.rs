use macroquad::prelude::{vec2, Vec2};

use crate::config::WorldConfig;

/// The tank: wraps horizontally for swimmers, clamps vertically.
#[derive(Clone, Copy, Debug)]
pub struct World {
    pub width: f32,
    pub height: f32,
    pub surface_band: f32,
}

impl World {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            surface_band: 60.0,
        }
    }

    pub fn from_config(config: &WorldConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            surface_band: config.surface_band,
        }
    }

    pub fn center(&self) -> Vec2 {
        vec2(self.width * 0.5, self.height * 0.5)
    }

    /// Re-enter on the far side once a body of half-width `margin` has fully left.
    pub fn wrap_x(&self, x: f32, margin: f32) -> f32 {
        if x > self.width + margin {
            -margin
        } else if x < -margin {
            self.width + margin
        } else {
            x
        }
    }

    /// Keep a body of half-height `margin` inside the water column.
    pub fn clamp_y(&self, y: f32, margin: f32) -> f32 {
        let margin = margin.min(self.height * 0.5);
        y.clamp(margin, self.height - margin)
    }

    /// Apply both boundary rules to a swimmer position.
    pub fn confine(&self, pos: Vec2, margin: f32) -> Vec2 {
        vec2(self.wrap_x(pos.x, margin), self.clamp_y(pos.y, margin))
    }

    pub fn contains(&self, pos: Vec2) -> bool {
        pos.x >= 0.0 && pos.x <= self.width && pos.y >= 0.0 && pos.y <= self.height
    }

    /// Fraction of the water column above `y` (0 at the surface, 1 at the bottom).
    pub fn depth_fraction(&self, y: f32) -> f32 {
        (y / self.height).clamp(0.0, 1.0)
    }

    pub fn near_surface(&self, y: f32) -> bool {
        y < self.surface_band
    }

    pub fn near_bottom(&self, y: f32) -> bool {
        y > self.height - self.surface_band
    }
}

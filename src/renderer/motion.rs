//! Where the textured quad sits on screen.
//!
//! `Centered` keeps a quad of `scale × viewport` in the middle of the window.
//! `Bounce` moves it at constant speed and reflects it off the window edges,
//! the way the DVD logo screensaver does.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Quad placement strategy.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum QuadMotion {
    /// Fixed in the centre of the viewport.
    #[default]
    Centered,
    /// Bouncing off the viewport edges.
    Bounce,
}

impl QuadMotion {
    /// The other motion.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Centered => Self::Bounce,
            Self::Bounce => Self::Centered,
        }
    }
}

/// Axis-aligned rectangle in window pixels, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadRect {
    /// Top-left corner.
    pub origin: Vec2,
    /// Width and height.
    pub size: Vec2,
}

impl QuadRect {
    /// `size` placed in the middle of `viewport`.
    #[must_use]
    pub fn centered(viewport: Vec2, size: Vec2) -> Self {
        Self {
            origin: (viewport - size) * 0.5,
            size,
        }
    }

    /// Corners in normalized device coordinates as
    /// `[left, top, right, bottom]`.
    #[must_use]
    pub fn to_ndc(&self, viewport: Vec2) -> [f32; 4] {
        let viewport = viewport.max(Vec2::ONE);
        let min = self.origin / viewport;
        let max = (self.origin + self.size) / viewport;
        [
            min.x * 2.0 - 1.0,
            1.0 - min.y * 2.0,
            max.x * 2.0 - 1.0,
            1.0 - max.y * 2.0,
        ]
    }
}

/// Quad size for a viewport: `scale` of each viewport edge.
pub fn quad_size(viewport: Vec2, scale: f32) -> Vec2 {
    viewport * scale.clamp(0.0, 1.0)
}

/// Constant-velocity quad that reflects off the viewport edges.
#[derive(Debug, Clone)]
pub struct Bounce {
    position: Vec2,
    velocity: Vec2,
}

impl Bounce {
    /// Start at `position` moving at `velocity` pixels per second.
    #[must_use]
    pub fn new(position: Vec2, velocity: Vec2) -> Self {
        Self { position, velocity }
    }

    /// Start at `position` moving at `speed` pixels per second in a random
    /// diagonal-ish direction.
    #[must_use]
    pub fn launch<R: Rng>(position: Vec2, speed: f32, rng: &mut R) -> Self {
        // Keep away from the axes so the quad visits every edge.
        let angle = rng.random_range(0.2..(std::f32::consts::FRAC_PI_2 - 0.2));
        let quadrant = rng.random_range(0..4u8);
        let mut dir = Vec2::from_angle(angle);
        if quadrant & 1 == 1 {
            dir.x = -dir.x;
        }
        if quadrant & 2 == 2 {
            dir.y = -dir.y;
        }
        Self::new(position, dir * speed)
    }

    /// Current velocity in pixels per second.
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Advance by `dt` seconds inside `viewport` and return the quad.
    pub fn step(&mut self, dt: f32, viewport: Vec2, size: Vec2) -> QuadRect {
        let bounds = (viewport - size).max(Vec2::ZERO);
        self.position += self.velocity * dt;

        if self.position.x <= 0.0 {
            self.position.x = 0.0;
            self.velocity.x = self.velocity.x.abs();
        } else if self.position.x >= bounds.x {
            self.position.x = bounds.x;
            self.velocity.x = -self.velocity.x.abs();
        }
        if self.position.y <= 0.0 {
            self.position.y = 0.0;
            self.velocity.y = self.velocity.y.abs();
        } else if self.position.y >= bounds.y {
            self.position.y = bounds.y;
            self.velocity.y = -self.velocity.y.abs();
        }

        QuadRect {
            origin: self.position,
            size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_quad_is_half_the_viewport() {
        let viewport = Vec2::new(640.0, 480.0);
        let rect = QuadRect::centered(viewport, quad_size(viewport, 0.5));
        assert_eq!(rect.origin, Vec2::new(160.0, 120.0));
        assert_eq!(rect.size, Vec2::new(320.0, 240.0));
        assert_eq!(rect.to_ndc(viewport), [-0.5, 0.5, 0.5, -0.5]);
    }

    #[test]
    fn full_viewport_maps_to_clip_corners() {
        let viewport = Vec2::new(100.0, 50.0);
        let rect = QuadRect {
            origin: Vec2::ZERO,
            size: viewport,
        };
        assert_eq!(rect.to_ndc(viewport), [-1.0, 1.0, 1.0, -1.0]);
    }

    #[test]
    fn bounce_reflects_at_right_edge() {
        let viewport = Vec2::new(100.0, 100.0);
        let size = Vec2::new(20.0, 20.0);
        let mut bounce = Bounce::new(Vec2::new(75.0, 10.0), Vec2::new(10.0, 0.0));

        let rect = bounce.step(1.0, viewport, size);
        assert_eq!(rect.origin.x, 80.0);
        assert!(bounce.velocity().x < 0.0);

        let rect = bounce.step(1.0, viewport, size);
        assert_eq!(rect.origin.x, 70.0);
    }

    #[test]
    fn bounce_reflects_at_top_edge() {
        let viewport = Vec2::new(100.0, 100.0);
        let size = Vec2::new(10.0, 10.0);
        let mut bounce = Bounce::new(Vec2::new(50.0, 3.0), Vec2::new(0.0, -5.0));

        let rect = bounce.step(1.0, viewport, size);
        assert_eq!(rect.origin.y, 0.0);
        assert_eq!(bounce.velocity().y, 5.0);
    }

    #[test]
    fn bounce_stays_inside_viewport() {
        let viewport = Vec2::new(320.0, 200.0);
        let size = quad_size(viewport, 0.5);
        let mut bounce = Bounce::launch(Vec2::ZERO, 500.0, &mut rand::rng());

        for _ in 0..1000 {
            let rect = bounce.step(1.0 / 60.0, viewport, size);
            assert!(rect.origin.x >= 0.0 && rect.origin.y >= 0.0);
            assert!(rect.origin.x + size.x <= viewport.x + 1e-3);
            assert!(rect.origin.y + size.y <= viewport.y + 1e-3);
        }
    }

    #[test]
    fn launch_speed_is_preserved() {
        let bounce = Bounce::launch(Vec2::ZERO, 240.0, &mut rand::rng());
        assert!((bounce.velocity().length() - 240.0).abs() < 1e-3);
    }
}
